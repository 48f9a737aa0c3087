pub use crate::attributes::{AttributeResolver, NodeAttributes, Palette};
pub use crate::classify::{Classify, RuleTable, ThresholdRule};
pub use crate::config::{Config, Mode};
pub use crate::dedup::{deduplicate, merge, LabeledTable};
pub use crate::error::{KinError, Result};
pub use crate::graph::KinshipGraph;
pub use crate::pipeline::{Network, Pipeline, Summary};
pub use crate::render::Renderer;
pub use crate::table::{MetadataColumns, MetadataTable, PairColumns, PairTable, TableBuilder};
pub use crate::{
    ClassifiedPair, ClassifiedPairs, Id, Individual, Individuals, PairKey, PairObservation, Sex,
};
