use crate::color::parse_color;
use crate::config::{ColorEntry, Impute, PaletteConfig, SizeConfig};
use crate::prelude::*;
use plotters::style::RGBColor;
use tracing::debug;

/// Position given to individuals with no known coordinates.
pub const ORIGIN: (f64, f64) = (0.0, 0.0);

pub type ColorTable = Vec<(String, RGBColor)>;

/// Resolved colors for categories, sexes and social ranks.
///
/// Tables keep their configured order, which is also the legend order.
#[derive(Debug, Clone)]
pub struct Palette {
    categories: ColorTable,
    sex: ColorTable,
    rank: ColorTable,
    default: RGBColor,
}

fn color_table(entries: &[ColorEntry]) -> Result<ColorTable> {
    entries
        .iter()
        .map(|entry| Ok((entry.key.clone(), parse_color(&entry.color)?)))
        .collect()
}

fn lookup(table: &ColorTable, key: &str) -> Option<RGBColor> {
    table.iter().find(|(k, _)| k == key).map(|(_, c)| *c)
}

impl Palette {
    /// `categories` pairs each relationship category with its color name.
    pub fn new(categories: &[(String, String)], config: &PaletteConfig) -> Result<Self> {
        Ok(Self {
            categories: categories
                .iter()
                .map(|(name, color)| Ok((name.clone(), parse_color(color)?)))
                .collect::<Result<_>>()?,
            sex: color_table(&config.sex)?,
            rank: color_table(&config.rank)?,
            default: parse_color(&config.default)?,
        })
    }

    pub fn default_color(&self) -> RGBColor {
        self.default
    }

    pub fn category_color(&self, category: &str) -> RGBColor {
        lookup(&self.categories, category).unwrap_or(self.default)
    }

    pub fn sex_color(&self, sex: Sex) -> RGBColor {
        lookup(&self.sex, sex.code()).unwrap_or(self.default)
    }

    pub fn rank_color(&self, rank: Option<&str>) -> RGBColor {
        rank.and_then(|r| lookup(&self.rank, r)).unwrap_or(self.default)
    }

    pub fn categories(&self) -> &ColorTable {
        &self.categories
    }

    pub fn sexes(&self) -> &ColorTable {
        &self.sex
    }

    pub fn ranks(&self) -> &ColorTable {
        &self.rank
    }
}

/// Everything the renderer needs to draw one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeAttributes {
    pub fill: RGBColor,
    pub border: RGBColor,
    /// Marker area in square points.
    pub size: f64,
    /// Longitude, latitude.
    pub position: (f64, f64),
}

/// Turns metadata into node attributes, substituting defaults for anything
/// missing.
pub struct AttributeResolver<'a> {
    palette: &'a Palette,
    size: SizeConfig,
    max_size: Option<f64>,
    median_size: Option<f64>,
}

impl<'a> AttributeResolver<'a> {
    pub fn new(palette: &'a Palette, size: SizeConfig, individuals: &Individuals) -> Self {
        let mut sizes: Vec<f64> = individuals.values().filter_map(|i| i.size).collect();
        sizes.sort_by(f64::total_cmp);

        let max_size = sizes.last().copied().filter(|m| *m > 0.0);
        let median_size = match sizes.len() {
            0 => None,
            n if n % 2 == 0 => Some((sizes[n / 2 - 1] + sizes[n / 2]) / 2.0),
            n => Some(sizes[n / 2]),
        };

        debug!(measured = sizes.len(), ?max_size, ?median_size, "size statistics");
        Self {
            palette,
            size,
            max_size,
            median_size,
        }
    }

    fn scaled(&self, measurement: f64) -> f64 {
        match self.max_size {
            Some(max) => (measurement / max * self.size.max).clamp(self.size.min, self.size.max),
            None => self.size.min,
        }
    }

    fn node_size(&self, measurement: Option<f64>) -> f64 {
        match (measurement, self.size.impute) {
            (Some(m), _) => self.scaled(m),
            (None, Impute::Median) => self.median_size.map_or(self.size.min, |m| self.scaled(m)),
            (None, Impute::Minimum) => self.size.min,
        }
    }

    pub fn resolve(&self, individual: Option<&Individual>) -> NodeAttributes {
        match individual {
            Some(individual) => NodeAttributes {
                fill: self.palette.sex_color(individual.sex),
                border: self.palette.rank_color(individual.social_rank.as_deref()),
                size: self.node_size(individual.size),
                position: individual.position.unwrap_or(ORIGIN),
            },
            None => NodeAttributes {
                fill: self.palette.default_color(),
                border: self.palette.default_color(),
                size: self.node_size(None),
                position: ORIGIN,
            },
        }
    }

    /// Attributes for every node, indexed like the graph's nodes.
    pub fn resolve_all(&self, graph: &KinshipGraph, individuals: &Individuals) -> Vec<NodeAttributes> {
        graph
            .node_ids()
            .map(|id| self.resolve(individuals.get(id)))
            .collect()
    }
}
