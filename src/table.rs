use crate::prelude::*;
use csv;
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Column of the statistics matrix holding each statistic.
const HETHET: usize = 0;
const IBS0: usize = 1;
const KINSHIP: usize = 2;

/// Header names of a pairwise kinship table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairColumns {
    pub id1: String,
    pub id2: String,
    pub hethet: String,
    pub ibs0: String,
    pub kinship: String,
}

impl Default for PairColumns {
    fn default() -> Self {
        Self {
            id1: "ID1".into(),
            id2: "ID2".into(),
            hethet: "HetHet".into(),
            ibs0: "IBS0".into(),
            kinship: "Kinship".into(),
        }
    }
}

impl PairColumns {
    fn required(&self) -> [&str; 5] {
        [&self.id1, &self.id2, &self.hethet, &self.ibs0, &self.kinship]
    }
}

/// Header names of an individual metadata table. Only `id` must be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataColumns {
    pub id: String,
    pub sex: String,
    pub size: String,
    pub social_rank: String,
    pub harem: String,
    pub nest: String,
    pub longitude: String,
    pub latitude: String,
}

impl Default for MetadataColumns {
    fn default() -> Self {
        Self {
            id: "ID".into(),
            sex: "sex".into(),
            size: "SL".into(),
            social_rank: "social_rank".into(),
            harem: "Harem_ID".into(),
            nest: "Harem_ID_Nest_ID".into(),
            longitude: "Longitude".into(),
            latitude: "Latitude".into(),
        }
    }
}

/// Pairwise statistics, one row per pair.
///
/// The three statistics are held in an `n x 3` matrix in
/// `HetHet, IBS0, Kinship` order.
#[derive(Debug, Clone)]
pub struct PairTable {
    name: String,
    ids: Vec<(Id, Id)>,
    stats: Array2<f64>,
}

impl PairTable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Every individual id mentioned by the table, in row order.
    pub fn ids(&self) -> impl Iterator<Item = &Id> {
        self.ids.iter().flat_map(|(a, b)| [a, b])
    }

    pub fn observations(&self) -> impl Iterator<Item = PairObservation> + '_ {
        self.ids
            .iter()
            .zip(self.stats.rows())
            .map(|((id1, id2), row)| observation(id1, id2, row))
    }
}

fn observation(id1: &str, id2: &str, row: ArrayView1<f64>) -> PairObservation {
    PairObservation {
        id1: id1.into(),
        id2: id2.into(),
        hethet: row[HETHET],
        ibs0: row[IBS0],
        kinship: row[KINSHIP],
    }
}

/// Individuals read from one metadata table, in file order.
#[derive(Debug, Clone, Default)]
pub struct MetadataTable {
    name: String,
    individuals: Vec<Individual>,
    has_nest: bool,
}

impl MetadataTable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    /// True if the table has a nest column, which marks it as the record of
    /// harem and nest membership.
    pub fn has_nest_column(&self) -> bool {
        self.has_nest
    }

    /// Merges tables in order.
    ///
    /// Each attribute comes from the first row for the id that has a value
    /// for it, so a later table only fills in what earlier ones lack.
    pub fn merge<'a, I>(tables: I) -> Individuals
    where
        I: IntoIterator<Item = &'a MetadataTable>,
    {
        let mut merged = Individuals::new();
        for table in tables {
            for individual in &table.individuals {
                match merged.get_mut(&individual.id) {
                    Some(existing) => {
                        debug!(table = %table.name, id = %individual.id, "filling in repeated individual");
                        fill_missing(existing, individual);
                    }
                    None => {
                        merged.insert(individual.id.clone(), individual.clone());
                    }
                }
            }
        }
        merged
    }
}

fn fill_missing(into: &mut Individual, from: &Individual) {
    if into.sex == Sex::Unknown {
        into.sex = from.sex;
    }
    if into.social_rank.is_none() {
        into.social_rank = from.social_rank.clone();
    }
    if into.harem.is_none() {
        into.harem = from.harem.clone();
    }
    if into.nest.is_none() {
        into.nest = from.nest.clone();
    }
    into.size = into.size.or(from.size);
    into.position = into.position.or(from.position);
}

/// Returns `None` for empty cells and the usual missing-value markers.
fn present(value: Option<&str>) -> Option<&str> {
    match value.map(str::trim) {
        None | Some("") | Some("NA") | Some("NaN") | Some("nan") => None,
        Some(v) => Some(v),
    }
}

/// Reads pair and metadata tables from delimited text.
///
/// Files ending in `.csv` are read comma separated and everything else tab
/// separated, unless a delimiter is set explicitly.
pub struct TableBuilder {
    delimiter: Option<u8>,
    pair_columns: PairColumns,
    metadata_columns: MetadataColumns,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self {
            delimiter: None,
            pair_columns: PairColumns::default(),
            metadata_columns: MetadataColumns::default(),
        }
    }

    pub fn delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn pair_columns(&mut self, columns: PairColumns) -> &mut Self {
        self.pair_columns = columns;
        self
    }

    pub fn metadata_columns(&mut self, columns: MetadataColumns) -> &mut Self {
        self.metadata_columns = columns;
        self
    }

    fn delimiter_for(&self, path: Option<&Path>) -> u8 {
        if let Some(delimiter) = self.delimiter {
            return delimiter;
        }
        match path.and_then(|p| p.extension()).and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => b',',
            _ => b'\t',
        }
    }

    fn reader(&self, reader: Box<dyn Read>, delimiter: u8) -> csv::Reader<Box<dyn Read>> {
        csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .trim(csv::Trim::All)
            .from_reader(reader)
    }

    pub fn pair_table_from_path(&self, path: &Path) -> Result<PairTable> {
        let file = File::open(path)?;
        self.read_pairs(
            &path.display().to_string(),
            Box::new(file),
            self.delimiter_for(Some(path)),
        )
    }

    pub fn pair_table_from_reader(&self, name: &str, reader: Box<dyn Read>) -> Result<PairTable> {
        self.read_pairs(name, reader, self.delimiter_for(None))
    }

    fn read_pairs(&self, name: &str, reader: Box<dyn Read>, delimiter: u8) -> Result<PairTable> {
        let mut rdr = self.reader(reader, delimiter);
        let headers = rdr.headers()?.clone();

        let missing: Vec<String> = self
            .pair_columns
            .required()
            .iter()
            .filter(|column| !headers.iter().any(|h| h == **column))
            .map(|column| column.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(KinError::MissingColumns {
                table: name.into(),
                missing,
            });
        }

        let position = |column: &str| headers.iter().position(|h| h == column);
        // Presence was checked above.
        let idx: Vec<usize> = self
            .pair_columns
            .required()
            .iter()
            .filter_map(|column| position(*column))
            .collect();
        let columns = self.pair_columns.required();

        let mut ids = vec![];
        let mut stats = vec![];
        for (row, record) in rdr.into_records().enumerate() {
            let record = record?;
            let (id1, id2) = match (present(record.get(idx[0])), present(record.get(idx[1]))) {
                (Some(id1), Some(id2)) => (id1.to_string(), id2.to_string()),
                _ => {
                    warn!(table = name, row = row + 1, "pair row without both ids skipped");
                    continue;
                }
            };
            for k in 2..5 {
                let raw = record.get(idx[k]).unwrap_or_default();
                let value = match present(Some(raw)) {
                    None => f64::NAN,
                    Some(v) => v.parse::<f64>().map_err(|_| KinError::InvalidValue {
                        table: name.into(),
                        row: row + 1,
                        column: columns[k].into(),
                        value: raw.into(),
                    })?,
                };
                stats.push(value);
            }
            ids.push((id1, id2));
        }

        let stats = Array2::from_shape_vec((ids.len(), 3), stats)?;
        debug!(table = name, rows = ids.len(), "loaded pair table");
        Ok(PairTable {
            name: name.into(),
            ids,
            stats,
        })
    }

    pub fn metadata_from_path(&self, path: &Path) -> Result<MetadataTable> {
        let file = File::open(path)?;
        self.read_metadata(
            &path.display().to_string(),
            Box::new(file),
            self.delimiter_for(Some(path)),
        )
    }

    pub fn metadata_from_reader(&self, name: &str, reader: Box<dyn Read>) -> Result<MetadataTable> {
        self.read_metadata(name, reader, self.delimiter_for(None))
    }

    fn read_metadata(&self, name: &str, reader: Box<dyn Read>, delimiter: u8) -> Result<MetadataTable> {
        let mut rdr = self.reader(reader, delimiter);
        let headers = rdr.headers()?.clone();
        let columns = &self.metadata_columns;
        let position = |column: &str| headers.iter().position(|h| h == column);

        let id_idx = position(&columns.id).ok_or_else(|| KinError::MissingColumns {
            table: name.into(),
            missing: vec![columns.id.clone()],
        })?;
        let sex_idx = position(&columns.sex);
        let size_idx = position(&columns.size);
        let rank_idx = position(&columns.social_rank);
        let harem_idx = position(&columns.harem);
        let nest_idx = position(&columns.nest);
        let lon_idx = position(&columns.longitude);
        let lat_idx = position(&columns.latitude);

        let mut individuals = vec![];
        for (row, record) in rdr.into_records().enumerate() {
            let record = record?;
            let cell = |idx: Option<usize>| present(idx.and_then(|i| record.get(i)));
            let number = |idx: Option<usize>, column: &str| {
                cell(idx).and_then(|v| match v.parse::<f64>() {
                    Ok(x) if x.is_finite() => Some(x),
                    _ => {
                        warn!(table = name, row = row + 1, column, value = v, "unreadable number treated as missing");
                        None
                    }
                })
            };

            let id = match cell(Some(id_idx)) {
                Some(id) => id,
                None => {
                    warn!(table = name, row = row + 1, "row without an id skipped");
                    continue;
                }
            };

            let location = match (
                number(lon_idx, &columns.longitude),
                number(lat_idx, &columns.latitude),
            ) {
                (Some(lon), Some(lat)) => Some((lon, lat)),
                _ => None,
            };

            individuals.push(Individual {
                id: id.into(),
                sex: cell(sex_idx).map(Sex::parse).unwrap_or_default(),
                social_rank: cell(rank_idx).map(String::from),
                harem: cell(harem_idx).map(String::from),
                nest: cell(nest_idx).map(String::from),
                size: number(size_idx, &columns.size),
                position: location,
            });
        }

        debug!(table = name, rows = individuals.len(), "loaded metadata table");
        Ok(MetadataTable {
            name: name.into(),
            individuals,
            has_nest: nest_idx.is_some(),
        })
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}
