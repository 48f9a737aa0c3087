//! TOML configuration for a run.
//!
//! Every section has defaults, so a file only needs to list its inputs.
//! Relative input paths are resolved against the directory holding the
//! configuration file.

use crate::classify::{RuleTable, ThresholdRule};
use crate::color::parse_color;
use crate::error::{KinError, Result};
use crate::table::{MetadataColumns, PairColumns};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub inputs: Inputs,
    pub columns: Columns,
    pub classification: Classification,
    pub palette: PaletteConfig,
    pub size: SizeConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Inputs {
    /// Table of all pairwise kinship estimates.
    pub kinship: Option<PathBuf>,

    /// Pre-labeled degree tables, highest priority first. Used in legacy mode.
    pub degree_tables: Vec<DegreeTable>,

    /// Individual metadata tables. Earlier tables win on duplicate ids.
    pub metadata: Vec<PathBuf>,

    /// Table whose rows define harem and nest groups. Defaults to every
    /// metadata table carrying a nest column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<PathBuf>,

    /// Field delimiter for every table, overriding the extension rule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<char>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegreeTable {
    pub category: String,
    pub path: PathBuf,

    /// Defaults to the color of the rule with the same name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Columns {
    pub pairs: PairColumns,
    pub metadata: MetadataColumns,
}

/// How pairs get their category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Classify the kinship table against the rule table.
    #[default]
    Threshold,
    /// Merge pre-labeled degree tables by priority.
    Legacy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Classification {
    pub mode: Mode,

    /// Ordered by priority.
    pub rules: Vec<ThresholdRule>,
}

impl Default for Classification {
    fn default() -> Self {
        Self {
            mode: Mode::Threshold,
            rules: RuleTable::default().rules().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorEntry {
    pub key: String,
    pub color: String,
}

impl ColorEntry {
    fn new(key: &str, color: &str) -> Self {
        Self {
            key: key.into(),
            color: color.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    /// Node fill by sex code, in legend order.
    pub sex: Vec<ColorEntry>,

    /// Node border by social rank code, in legend order.
    pub rank: Vec<ColorEntry>,

    /// Used for anything not listed.
    pub default: String,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            sex: vec![
                ColorEntry::new("M", "lightblue"),
                ColorEntry::new("F", "pink"),
                ColorEntry::new("NA", "gray"),
            ],
            rank: vec![
                ColorEntry::new("BF", "black"),
                ColorEntry::new("BM", "purple"),
                ColorEntry::new("H", "cyan"),
                ColorEntry::new("J", "yellow"),
                ColorEntry::new("SM", "red"),
            ],
            default: "gray".into(),
        }
    }
}

/// What a missing size measurement becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impute {
    #[default]
    Minimum,
    Median,
}

/// Marker area bounds, in square points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeConfig {
    pub min: f64,
    pub max: f64,
    pub impute: Impute,
}

impl Default for SizeConfig {
    fn default() -> Self {
        Self {
            min: 100.0,
            max: 2000.0,
            impute: Impute::Minimum,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Width of the legend panel on the right.
    pub legend_width: u32,
    pub title: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("kinship_network.svg"),
            width: 1600,
            height: 1200,
            legend_width: 320,
            title: "Geographic network of kinship degree, SL, social rank and harem connections"
                .into(),
        }
    }
}

impl Config {
    /// Loads and validates a configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file and resolves its paths, leaving validation
    /// to the caller.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Parses TOML without validating or resolving paths.
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let Some(kinship) = self.inputs.kinship.as_mut() {
            resolve(kinship);
        }
        for table in &mut self.inputs.degree_tables {
            resolve(&mut table.path);
        }
        for path in &mut self.inputs.metadata {
            resolve(path);
        }
        if let Some(groups) = self.inputs.groups.as_mut() {
            resolve(groups);
        }
        resolve(&mut self.render.output);
    }

    pub fn rule_table(&self) -> Result<RuleTable> {
        RuleTable::new(self.classification.rules.clone())
    }

    /// Single-byte field delimiter, if one was configured.
    pub fn delimiter(&self) -> Result<Option<u8>> {
        match self.inputs.delimiter {
            None => Ok(None),
            Some(c) if c.is_ascii() => Ok(Some(c as u8)),
            Some(c) => Err(KinError::InvalidConfig(format!(
                "delimiter {c:?} is not a single byte"
            ))),
        }
    }

    /// Checks everything that can be checked before reading any table.
    pub fn validate(&self) -> Result<()> {
        self.rule_table()?;
        self.delimiter()?;

        match self.classification.mode {
            Mode::Threshold if self.inputs.kinship.is_none() => {
                return Err(KinError::InvalidConfig(
                    "threshold mode needs inputs.kinship".into(),
                ));
            }
            Mode::Legacy if self.inputs.degree_tables.is_empty() => {
                return Err(KinError::InvalidConfig(
                    "legacy mode needs at least one inputs.degree_tables entry".into(),
                ));
            }
            _ => {}
        }

        for rule in &self.classification.rules {
            parse_color(&rule.color)?;
        }
        for table in &self.inputs.degree_tables {
            if let Some(color) = &table.color {
                parse_color(color)?;
            }
        }
        for entry in self.palette.sex.iter().chain(&self.palette.rank) {
            parse_color(&entry.color)?;
        }
        parse_color(&self.palette.default)?;

        if !(self.size.min > 0.0 && self.size.min <= self.size.max) {
            return Err(KinError::InvalidConfig(format!(
                "size bounds must satisfy 0 < min <= max, got {} and {}",
                self.size.min, self.size.max
            )));
        }
        if self.render.legend_width >= self.render.width {
            return Err(KinError::InvalidConfig(
                "render.legend_width must be smaller than render.width".into(),
            ));
        }
        Ok(())
    }
}
