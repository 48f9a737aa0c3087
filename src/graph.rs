use crate::prelude::*;
use petgraph::graph::{EdgeReference, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use plotters::style::RGBColor;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info};

/// A kinship edge and the category it was classified into.
#[derive(Debug, Clone, PartialEq)]
pub struct KinshipEdge {
    pub category: String,
    pub color: RGBColor,
}

/// The individuals and everything connecting them.
///
/// Kinship edges live in the petgraph graph. Shared nest and shared harem
/// memberships are kept as two separate edge lists, so one pair may be
/// connected in several ways at once. Group edges are added afterwards with
/// [`KinshipGraph::with_groups`] from whichever rows record the groups.
#[derive(Debug, Clone)]
pub struct KinshipGraph {
    graph: UnGraph<Id, KinshipEdge>,
    index: HashMap<Id, NodeIndex>,
    nest_edges: Vec<(NodeIndex, NodeIndex)>,
    harem_edges: Vec<(NodeIndex, NodeIndex)>,
}

/// Every unordered pair of `members`: k members give k(k-1)/2 pairs.
pub fn complete_pairs<T: Copy>(members: &[T]) -> Vec<(T, T)> {
    let mut pairs = Vec::with_capacity(members.len() * members.len().saturating_sub(1) / 2);
    for i in 0..members.len() {
        for j in (i + 1)..members.len() {
            pairs.push((members[i], members[j]));
        }
    }
    pairs
}

impl KinshipGraph {
    /// Builds the nodes and kinship edges.
    ///
    /// Nodes are every id in `pair_tables` and `individuals`. Each classified
    /// pair becomes one kinship edge; a pair seen again keeps its first
    /// category, and self pairs are skipped.
    pub fn build(
        pair_tables: &[&PairTable],
        individuals: &Individuals,
        classified: &[ClassifiedPair],
        palette: &Palette,
    ) -> Self {
        let ids: BTreeSet<&Id> = pair_tables
            .iter()
            .flat_map(|table| table.ids())
            .chain(individuals.keys())
            .chain(classified.iter().flat_map(|c| [&c.pair.id1, &c.pair.id2]))
            .collect();

        let mut graph = UnGraph::with_capacity(ids.len(), classified.len());
        let mut index = HashMap::with_capacity(ids.len());
        for id in ids {
            index.insert(id.clone(), graph.add_node(id.clone()));
        }

        for classified_pair in classified {
            let key = classified_pair.key();
            if key.is_self_pair() {
                debug!(pair = %key, "self pair skipped");
                continue;
            }
            let a = index[&classified_pair.pair.id1];
            let b = index[&classified_pair.pair.id2];
            if graph.find_edge(a, b).is_some() {
                debug!(pair = %key, category = %classified_pair.category, "pair already has a kinship edge");
                continue;
            }
            graph.add_edge(
                a,
                b,
                KinshipEdge {
                    category: classified_pair.category.clone(),
                    color: palette.category_color(&classified_pair.category),
                },
            );
        }

        info!(
            nodes = graph.node_count(),
            kinship_edges = graph.edge_count(),
            "built kinship graph"
        );

        Self {
            graph,
            index,
            nest_edges: vec![],
            harem_edges: vec![],
        }
    }

    /// Replaces the nest and harem edges with those implied by `rows`.
    ///
    /// Only the given rows count: an individual's harem or nest in any other
    /// table does not place it in a group. Rows whose id has no node are
    /// ignored.
    pub fn with_groups<'a, I>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = &'a Individual>,
    {
        let rows: Vec<&Individual> = rows.into_iter().collect();
        self.nest_edges = group_edges(&rows, &self.index, |i| i.nest.as_deref());
        self.harem_edges = group_edges(&rows, &self.index, |i| i.harem.as_deref());
        info!(
            rows = rows.len(),
            nest_edges = self.nest_edges.len(),
            harem_edges = self.harem_edges.len(),
            "connected groups"
        );
        self
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Node ids in index order.
    pub fn node_ids(&self) -> impl Iterator<Item = &Id> {
        self.graph.node_indices().map(move |n| &self.graph[n])
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn kinship_edges(&self) -> impl Iterator<Item = EdgeReference<'_, KinshipEdge>> {
        self.graph.edge_references()
    }

    pub fn kinship_edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Category of the kinship edge between two individuals, if any.
    pub fn category(&self, id1: &str, id2: &str) -> Option<&str> {
        let edge = self.graph.find_edge(self.node_index(id1)?, self.node_index(id2)?)?;
        Some(self.graph[edge].category.as_str())
    }

    /// Number of kinship edges per category.
    pub fn category_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for edge in self.kinship_edges() {
            *counts.entry(edge.weight().category.as_str()).or_insert(0) += 1;
        }
        counts
    }

    pub fn kinship_endpoints(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, &KinshipEdge)> {
        self.kinship_edges().map(|e| (e.source(), e.target(), e.weight()))
    }

    pub fn nest_edges(&self) -> &[(NodeIndex, NodeIndex)] {
        &self.nest_edges
    }

    pub fn harem_edges(&self) -> &[(NodeIndex, NodeIndex)] {
        &self.harem_edges
    }
}

/// Connects every pair of individuals sharing the same group key.
/// Individuals without a key join no group, and an id listed twice in one
/// group counts once.
fn group_edges<F>(
    rows: &[&Individual],
    index: &HashMap<Id, NodeIndex>,
    key: F,
) -> Vec<(NodeIndex, NodeIndex)>
where
    F: Fn(&Individual) -> Option<&str>,
{
    let mut groups: BTreeMap<&str, Vec<NodeIndex>> = BTreeMap::new();
    for &individual in rows {
        if let (Some(group), Some(node)) = (key(individual), index.get(&individual.id)) {
            let members = groups.entry(group).or_default();
            if !members.contains(node) {
                members.push(*node);
            }
        }
    }
    groups
        .values()
        .flat_map(|members| complete_pairs(members))
        .collect()
}
