//! Color names accepted in configuration files.

use crate::error::{KinError, Result};
use plotters::style::RGBColor;

const NAMED: &[(&str, RGBColor)] = &[
    ("black", RGBColor(0, 0, 0)),
    ("white", RGBColor(255, 255, 255)),
    ("gray", RGBColor(128, 128, 128)),
    ("grey", RGBColor(128, 128, 128)),
    ("lightgray", RGBColor(211, 211, 211)),
    ("red", RGBColor(255, 0, 0)),
    ("green", RGBColor(0, 128, 0)),
    ("blue", RGBColor(0, 0, 255)),
    ("lightblue", RGBColor(173, 216, 230)),
    ("cyan", RGBColor(0, 255, 255)),
    ("magenta", RGBColor(255, 0, 255)),
    ("yellow", RGBColor(255, 255, 0)),
    ("orange", RGBColor(255, 165, 0)),
    ("purple", RGBColor(128, 0, 128)),
    ("pink", RGBColor(255, 192, 203)),
    ("brown", RGBColor(165, 42, 42)),
    ("olive", RGBColor(128, 128, 0)),
    ("navy", RGBColor(0, 0, 128)),
    ("teal", RGBColor(0, 128, 128)),
];

/// Parses a CSS color name from the table above or a `#rrggbb` hex triplet.
pub fn parse_color(spec: &str) -> Result<RGBColor> {
    let spec = spec.trim();
    if let Some(hex) = spec.strip_prefix('#') {
        if hex.len() == 6 && hex.is_ascii() {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
            if let (Ok(r), Ok(g), Ok(b)) = (channel(0), channel(2), channel(4)) {
                return Ok(RGBColor(r, g, b));
            }
        }
        return Err(KinError::UnknownColor(spec.into()));
    }

    NAMED
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(spec))
        .map(|(_, color)| *color)
        .ok_or_else(|| KinError::UnknownColor(spec.into()))
}
