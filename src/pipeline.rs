//! Load, classify, build and draw, in that order.

use crate::config::{Config, Mode, SizeConfig};
use crate::dedup::{deduplicate, merge, LabeledTable};
use crate::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Every table a run reads.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub kinship: Option<PairTable>,
    /// Category and table, highest priority first.
    pub degree_tables: Vec<(String, PairTable)>,
    pub individuals: Individuals,
    /// Rows recording harem and nest membership, in file order.
    pub group_rows: Vec<Individual>,
}

impl Dataset {
    pub fn pair_tables(&self) -> Vec<&PairTable> {
        self.kinship
            .iter()
            .chain(self.degree_tables.iter().map(|(_, table)| table))
            .collect()
    }
}

/// A graph with every node's drawing attributes resolved.
#[derive(Debug, Clone)]
pub struct Network {
    pub graph: KinshipGraph,
    /// Indexed like the graph's nodes.
    pub attributes: Vec<NodeAttributes>,
    pub palette: Palette,
}

impl Network {
    pub fn new(graph: KinshipGraph, individuals: &Individuals, palette: Palette, size: SizeConfig) -> Self {
        let attributes = AttributeResolver::new(&palette, size, individuals).resolve_all(&graph, individuals);
        Self {
            graph,
            attributes,
            palette,
        }
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub mode: Mode,
    pub nodes: usize,
    pub kinship_edges: usize,
    pub nest_edges: usize,
    pub harem_edges: usize,
    /// Edge count per category, in legend order.
    pub categories: Vec<(String, usize)>,
    pub output: Option<PathBuf>,
}

impl Summary {
    fn new(mode: Mode, network: &Network, output: Option<PathBuf>) -> Self {
        let counts = network.graph.category_counts();
        Self {
            mode,
            nodes: network.graph.node_count(),
            kinship_edges: network.graph.kinship_edge_count(),
            nest_edges: network.graph.nest_edges().len(),
            harem_edges: network.graph.harem_edges().len(),
            categories: network
                .palette
                .categories()
                .iter()
                .map(|(name, _)| (name.clone(), counts.get(name.as_str()).copied().unwrap_or(0)))
                .collect(),
            output,
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "individuals:   {}", self.nodes)?;
        writeln!(f, "kinship edges: {}", self.kinship_edges)?;
        for (category, count) in &self.categories {
            writeln!(f, "  {category:<11} {count}")?;
        }
        writeln!(f, "nest edges:    {}", self.nest_edges)?;
        write!(f, "harem edges:   {}", self.harem_edges)?;
        if let Some(output) = &self.output {
            write!(f, "\nplot:          {}", output.display())?;
        }
        Ok(())
    }
}

pub struct Pipeline {
    config: Config,
    builder: TableBuilder,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let mut builder = TableBuilder::new();
        builder
            .pair_columns(config.columns.pairs.clone())
            .metadata_columns(config.columns.metadata.clone());
        if let Some(delimiter) = config.delimiter()? {
            builder.delimiter(delimiter);
        }
        Ok(Self { config, builder })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Reads every table. Pair tables come first, so a missing statistics
    /// column stops the run before anything else happens.
    pub fn load(&self) -> Result<Dataset> {
        let inputs = &self.config.inputs;
        let read_pairs = |path: &Path| {
            let table = self.builder.pair_table_from_path(path)?;
            if table.is_empty() {
                warn!(table = table.name(), "pair table has no rows");
            }
            Ok::<_, KinError>(table)
        };
        let kinship = inputs.kinship.as_deref().map(|path| read_pairs(path)).transpose()?;

        let degree_tables = match self.config.classification.mode {
            Mode::Legacy => inputs
                .degree_tables
                .iter()
                .map(|t| Ok((t.category.clone(), read_pairs(t.path.as_path())?)))
                .collect::<Result<Vec<_>>>()?,
            Mode::Threshold => vec![],
        };

        let metadata = inputs
            .metadata
            .iter()
            .map(|path| self.builder.metadata_from_path(path))
            .collect::<Result<Vec<_>>>()?;
        let individuals = MetadataTable::merge(&metadata);

        let group_rows: Vec<Individual> = match &inputs.groups {
            Some(path) => self.builder.metadata_from_path(path)?.individuals().to_vec(),
            None => metadata
                .iter()
                .filter(|table| table.has_nest_column())
                .flat_map(|table| table.individuals().iter().cloned())
                .collect(),
        };

        info!(
            pair_tables = degree_tables.len() + kinship.iter().count(),
            metadata_tables = metadata.len(),
            individuals = individuals.len(),
            group_rows = group_rows.len(),
            "loaded inputs"
        );
        Ok(Dataset {
            kinship,
            degree_tables,
            individuals,
            group_rows,
        })
    }

    pub fn classify(&self, dataset: &Dataset) -> Result<ClassifiedPairs> {
        match self.config.classification.mode {
            Mode::Threshold => {
                let rules = self.config.rule_table()?;
                Ok(dataset
                    .kinship
                    .as_ref()
                    .map(|table| table.classify(&rules))
                    .unwrap_or_default())
            }
            Mode::Legacy => {
                let labeled: Vec<LabeledTable> = dataset
                    .degree_tables
                    .iter()
                    .map(|(category, table)| LabeledTable::from_table(category, table))
                    .collect();
                Ok(merge(&deduplicate(&labeled)))
            }
        }
    }

    /// Category names and color names, in priority order.
    fn categories(&self) -> Vec<(String, String)> {
        let classification = &self.config.classification;
        match classification.mode {
            Mode::Threshold => classification
                .rules
                .iter()
                .map(|rule| (rule.name.clone(), rule.color.clone()))
                .collect(),
            Mode::Legacy => self
                .config
                .inputs
                .degree_tables
                .iter()
                .map(|table| {
                    let color = table
                        .color
                        .clone()
                        .or_else(|| {
                            classification
                                .rules
                                .iter()
                                .find(|rule| rule.name == table.category)
                                .map(|rule| rule.color.clone())
                        })
                        .unwrap_or_else(|| self.config.palette.default.clone());
                    (table.category.clone(), color)
                })
                .collect(),
        }
    }

    pub fn network(&self, dataset: &Dataset, classified: &[ClassifiedPair]) -> Result<Network> {
        let palette = Palette::new(&self.categories(), &self.config.palette)?;
        let graph = KinshipGraph::build(&dataset.pair_tables(), &dataset.individuals, classified, &palette)
            .with_groups(&dataset.group_rows);
        Ok(Network::new(graph, &dataset.individuals, palette, self.config.size))
    }

    /// Runs every stage and writes the plot to `output`.
    pub fn run_to(&self, output: &Path) -> Result<Summary> {
        let dataset = self.load()?;
        let classified = self.classify(&dataset)?;
        let network = self.network(&dataset, &classified)?;
        Renderer::new(&self.config.render).render_to_file(&network, output)?;
        Ok(Summary::new(
            self.config.classification.mode,
            &network,
            Some(output.to_path_buf()),
        ))
    }

    pub fn run(&self) -> Result<Summary> {
        self.run_to(&self.config.render.output)
    }
}
