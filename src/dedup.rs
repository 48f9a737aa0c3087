//! Merging of pre-labeled degree tables.
//!
//! Each table carries a fixed category. Tables are given highest priority
//! first, and a pair keeps the category of the first table it appears in.

use crate::prelude::*;
use std::collections::HashSet;
use tracing::{debug, info};

/// Pairs that were all labeled with one category upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledTable {
    pub category: String,
    pub pairs: Vec<PairObservation>,
}

impl LabeledTable {
    pub fn new(category: &str, pairs: Vec<PairObservation>) -> Self {
        Self {
            category: category.into(),
            pairs,
        }
    }

    pub fn from_table(category: &str, table: &PairTable) -> Self {
        Self::new(category, table.observations().collect())
    }
}

/// Removes from each table the pairs, in either orientation, already claimed
/// by an earlier table or earlier in the same table. Self pairs are kept out.
pub fn deduplicate(tables: &[LabeledTable]) -> Vec<LabeledTable> {
    let mut claimed: HashSet<PairKey> = HashSet::new();
    tables
        .iter()
        .map(|table| {
            let before = table.pairs.len();
            let pairs: Vec<PairObservation> = table
                .pairs
                .iter()
                .filter(|pair| {
                    let key = pair.key();
                    if key.is_self_pair() {
                        return false;
                    }
                    let fresh = claimed.insert(key);
                    if !fresh {
                        debug!(pair = %pair.key(), category = %table.category, "pair already claimed");
                    }
                    fresh
                })
                .cloned()
                .collect();
            info!(
                category = %table.category,
                before,
                after = pairs.len(),
                "deduplicated degree table"
            );
            LabeledTable {
                category: table.category.clone(),
                pairs,
            }
        })
        .collect()
}

/// Flattens deduplicated tables into labeled pairs, keeping table order.
pub fn merge(tables: &[LabeledTable]) -> ClassifiedPairs {
    tables
        .iter()
        .flat_map(|table| {
            table
                .pairs
                .iter()
                .map(move |pair| ClassifiedPair::new(pair.clone(), &table.category))
        })
        .collect()
}
