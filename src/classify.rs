use crate::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// A named relationship category and the statistics a pair needs to fall in it.
///
/// All three bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub name: String,
    pub min_hethet: f64,
    pub max_ibs0: f64,
    pub min_kinship: f64,
    /// Edge and legend color for the category.
    #[serde(default = "default_rule_color")]
    pub color: String,
}

fn default_rule_color() -> String {
    "gray".into()
}

impl ThresholdRule {
    pub fn new(name: &str, min_hethet: f64, max_ibs0: f64, min_kinship: f64, color: &str) -> Self {
        Self {
            name: name.into(),
            min_hethet,
            max_ibs0,
            min_kinship,
            color: color.into(),
        }
    }

    /// NaN statistics never match.
    pub fn matches(&self, hethet: f64, ibs0: f64, kinship: f64) -> bool {
        hethet >= self.min_hethet && ibs0 <= self.max_ibs0 && kinship >= self.min_kinship
    }
}

/// Rules in priority order. The first matching rule decides the category.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTable {
    rules: Vec<ThresholdRule>,
}

impl RuleTable {
    pub fn new(rules: Vec<ThresholdRule>) -> Result<Self> {
        if rules.is_empty() {
            return Err(KinError::InvalidConfig(
                "the rule table needs at least one category".into(),
            ));
        }
        let mut names = HashSet::new();
        for rule in &rules {
            if !names.insert(rule.name.as_str()) {
                return Err(KinError::InvalidConfig(format!(
                    "category {:?} is defined twice",
                    rule.name
                )));
            }
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[ThresholdRule] {
        &self.rules
    }

    /// Returns the first rule `pair` satisfies, if any.
    pub fn classify(&self, pair: &PairObservation) -> Option<&ThresholdRule> {
        self.rules
            .iter()
            .find(|rule| rule.matches(pair.hethet, pair.ibs0, pair.kinship))
    }
}

impl Default for RuleTable {
    /// KING's conventional kinship cut-offs (0.354, 0.177, 0.0884, 0.0442)
    /// with no HetHet or IBS0 constraint.
    fn default() -> Self {
        Self {
            rules: vec![
                ThresholdRule::new("Clone", 0.0, 1.0, 0.354, "brown"),
                ThresholdRule::new("Degree1", 0.0, 1.0, 0.177, "blue"),
                ThresholdRule::new("Degree2", 0.0, 1.0, 0.0884, "green"),
                ThresholdRule::new("Degree3", 0.0, 1.0, 0.0442, "orange"),
            ],
        }
    }
}

pub trait Classify {
    /// Labels every pair that matches a rule; the rest are dropped.
    fn classify(&self, rules: &RuleTable) -> ClassifiedPairs;
}

impl Classify for PairTable {
    fn classify(&self, rules: &RuleTable) -> ClassifiedPairs {
        let mut classified = ClassifiedPairs::new();
        for pair in self.observations() {
            match rules.classify(&pair) {
                Some(rule) => {
                    let category = rule.name.clone();
                    classified.push(ClassifiedPair { pair, category });
                }
                None => debug!(pair = %pair.key(), "pair matches no category"),
            }
        }
        info!(
            table = self.name(),
            pairs = self.len(),
            classified = classified.len(),
            "classified pair table"
        );
        classified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn pair(hethet: f64, ibs0: f64, kinship: f64) -> PairObservation {
        PairObservation {
            id1: "K01".into(),
            id2: "K02".into(),
            hethet,
            ibs0,
            kinship,
        }
    }

    fn rules() -> RuleTable {
        RuleTable::new(vec![
            ThresholdRule::new("Degree1", 0.07, 0.002, 0.35, "blue"),
            ThresholdRule::new("Degree2", 0.03, 0.02, 0.17, "green"),
            ThresholdRule::new("Degree3", 0.01, 0.05, 0.08, "orange"),
        ])
        .unwrap()
    }

    #[test]
    fn test_degree1_example() {
        let rule = rules().classify(&pair(0.08, 0.001, 0.40)).map(|r| r.name.clone());
        assert_eq!(rule.as_deref(), Some("Degree1"));
    }

    #[test]
    fn test_first_match_wins() {
        // Satisfies every category; the highest priority is returned.
        let p = pair(0.5, 0.0, 0.5);
        let table = rules();
        assert!(table.rules().iter().all(|r| r.matches(p.hethet, p.ibs0, p.kinship)));
        assert_eq!(table.classify(&p).unwrap().name, "Degree1");

        let reordered = RuleTable::new(table.rules().iter().rev().cloned().collect()).unwrap();
        assert_eq!(reordered.classify(&p).unwrap().name, "Degree3");
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let table = rules();
        assert_eq!(table.classify(&pair(0.07, 0.002, 0.35)).unwrap().name, "Degree1");
        assert_eq!(table.classify(&pair(0.0699, 0.002, 0.35)).unwrap().name, "Degree2");
    }

    #[test]
    fn test_unmatched_and_nan_are_unclassified() {
        let table = rules();
        assert!(table.classify(&pair(0.0, 0.3, 0.0)).is_none());
        assert!(table.classify(&pair(0.08, 0.001, f64::NAN)).is_none());
    }

    #[test]
    fn test_classification_is_deterministic() -> std::result::Result<(), Box<dyn Error>> {
        let data = "ID1,ID2,HetHet,IBS0,Kinship\n\
                    K01,K02,0.08,0.001,0.40\n\
                    K01,K03,0.04,0.01,0.20\n\
                    K02,K03,0.00,0.20,0.00\n";
        let table = TableBuilder::new()
            .delimiter(b',')
            .pair_table_from_reader("pairs", Box::new(data.as_bytes()))?;
        let first = table.classify(&rules());
        let second = table.classify(&rules());
        assert_eq!(first, second);
        let categories: Vec<_> = first.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(categories, vec!["Degree1", "Degree2"]);
        Ok(())
    }

    #[test]
    fn test_rule_table_validation() {
        assert!(RuleTable::new(vec![]).is_err());
        let dup = vec![
            ThresholdRule::new("Degree1", 0.0, 1.0, 0.2, "blue"),
            ThresholdRule::new("Degree1", 0.0, 1.0, 0.1, "green"),
        ];
        assert!(matches!(RuleTable::new(dup), Err(KinError::InvalidConfig(_))));
    }

    #[test]
    fn test_default_table_order() {
        let names: Vec<_> = RuleTable::default().rules().iter().map(|r| r.name.clone()).collect();
        assert_eq!(names, vec!["Clone", "Degree1", "Degree2", "Degree3"]);
    }
}
