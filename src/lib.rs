#![crate_name = "kinmap"]
use std::collections::BTreeMap;
use std::fmt;

pub mod prelude;

pub mod attributes;
pub mod classify;
pub mod cli;
pub mod color;
pub mod config;
pub mod dedup;
pub mod error;
pub mod graph;
pub mod pipeline;
pub mod render;
pub mod table;

pub type Id = String;
pub type Individuals = BTreeMap<Id, Individual>;
pub type ClassifiedPairs = Vec<ClassifiedPair>;

/// Sex code as recorded in the metadata tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sex {
    Male,
    Female,
    Unknown,
}

impl Sex {
    /// Parses the `M`/`F` codes; anything else is `Unknown`.
    pub fn parse(code: &str) -> Self {
        match code.trim() {
            "M" => Sex::Male,
            "F" => Sex::Female,
            _ => Sex::Unknown,
        }
    }

    /// The code used to look the sex up in the palette.
    pub fn code(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
            Sex::Unknown => "NA",
        }
    }
}

impl Default for Sex {
    fn default() -> Self {
        Sex::Unknown
    }
}

/// A sampled individual and everything the metadata tables say about it.
///
/// Every attribute except the id may be missing; missing attributes are
/// replaced by defaults when the graph is drawn.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Individual {
    pub id: Id,
    pub sex: Sex,
    pub social_rank: Option<String>,
    pub harem: Option<String>,
    pub nest: Option<String>,
    /// Standard length.
    pub size: Option<f64>,
    /// Longitude, latitude.
    pub position: Option<(f64, f64)>,
}

impl Individual {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// Unordered pair of individuals.
///
/// `PairKey::new("b", "a") == PairKey::new("a", "b")`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey {
    lower: Id,
    higher: Id,
}

impl PairKey {
    pub fn new(id1: &str, id2: &str) -> Self {
        if id1 <= id2 {
            Self {
                lower: id1.into(),
                higher: id2.into(),
            }
        } else {
            Self {
                lower: id2.into(),
                higher: id1.into(),
            }
        }
    }

    pub fn values(&self) -> (&str, &str) {
        (&self.lower, &self.higher)
    }

    pub fn is_self_pair(&self) -> bool {
        self.lower == self.higher
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.lower, self.higher)
    }
}

/// One row of a pairwise kinship table.
#[derive(Debug, Clone, PartialEq)]
pub struct PairObservation {
    pub id1: Id,
    pub id2: Id,
    /// Proportion of sites where both individuals are heterozygous.
    pub hethet: f64,
    /// Proportion of sites sharing zero alleles identical by state.
    pub ibs0: f64,
    pub kinship: f64,
}

impl PairObservation {
    pub fn key(&self) -> PairKey {
        PairKey::new(&self.id1, &self.id2)
    }
}

/// A pair that has been assigned a relationship category.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedPair {
    pub pair: PairObservation,
    pub category: String,
}

impl ClassifiedPair {
    pub fn new(pair: PairObservation, category: &str) -> Self {
        Self {
            pair,
            category: category.into(),
        }
    }

    pub fn key(&self) -> PairKey {
        self.pair.key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_is_unordered() {
        assert_eq!(PairKey::new("K12", "K03"), PairKey::new("K03", "K12"));
        assert_eq!(PairKey::new("K12", "K03").values(), ("K03", "K12"));
    }

    #[test]
    fn test_self_pair() {
        assert!(PairKey::new("K01", "K01").is_self_pair());
        assert!(!PairKey::new("K01", "K02").is_self_pair());
    }

    #[test]
    fn test_sex_codes() {
        assert_eq!(Sex::parse("M"), Sex::Male);
        assert_eq!(Sex::parse(" F "), Sex::Female);
        assert_eq!(Sex::parse("juvenile"), Sex::Unknown);
        assert_eq!(Sex::parse("").code(), "NA");
    }
}
