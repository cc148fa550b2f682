//! @acp:module "Trial Tables"
//! @acp:summary "CSV row source and sink for trial lists"
//! @acp:domain io
//! @acp:layer data
//!
//! Reads a trial list into [`Row`]s and writes generated orders back out.
//! Empty cells can be filled per column before absence is decided, which
//! keeps e.g. `HasQuestion` trackable while `Answer` stays absent for
//! trials without a comprehension question.

use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::row::{PropertyValue, Row};
use crate::warmup::LabeledOrder;

fn default_id_column() -> String {
    "ItemNum".to_string()
}

fn default_absent_values() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([("Answer".to_string(), vec!["NoQ".to_string()])])
}

fn default_fill_missing() -> BTreeMap<String, String> {
    BTreeMap::from([("HasQuestion".to_string(), "No".to_string())])
}

/// How raw CSV cells become row properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableOptions {
    /// Column holding the unique item identifier
    #[serde(default = "default_id_column")]
    pub id_column: String,

    /// Per-column literal values that mean "not applicable"
    #[serde(default = "default_absent_values")]
    pub absent_values: BTreeMap<String, Vec<String>>,

    /// Per-column replacement for empty cells
    #[serde(default = "default_fill_missing")]
    pub fill_missing: BTreeMap<String, String>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            id_column: default_id_column(),
            absent_values: default_absent_values(),
            fill_missing: default_fill_missing(),
        }
    }
}

impl TableOptions {
    fn is_absent(&self, column: &str, cell: &str) -> bool {
        cell.trim().is_empty()
            || self
                .absent_values
                .get(column)
                .is_some_and(|values| values.iter().any(|v| v == cell))
    }
}

/// A loaded trial list: header plus rows in file order.
#[derive(Debug, Clone)]
pub struct RowTable {
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl RowTable {
    pub fn from_reader<R: io::Read>(reader: R, options: &TableOptions) -> Result<Self> {
        Self::read(reader, options, true)
    }

    pub fn from_path<P: AsRef<Path>>(path: P, options: &TableOptions) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::read(file, options, true)
    }

    /// Read a file of generated orders, where each item repeats once per order.
    pub fn from_orders_path<P: AsRef<Path>>(path: P, options: &TableOptions) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::read(file, options, false)
    }

    fn read<R: io::Read>(reader: R, options: &TableOptions, unique_ids: bool) -> Result<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();

        let id_index = headers
            .iter()
            .position(|h| h == &options.id_column)
            .ok_or_else(|| ConfigError::MissingColumn(options.id_column.clone()))?;

        let mut seen = HashSet::new();
        let mut rows = Vec::new();

        for record in csv_reader.records() {
            let record = record?;
            let cells: Vec<String> = headers
                .iter()
                .zip(record.iter())
                .map(|(column, cell)| match options.fill_missing.get(column) {
                    Some(fill) if cell.trim().is_empty() => fill.clone(),
                    _ => cell.to_string(),
                })
                .collect();

            let id = cells[id_index].trim().to_string();
            if unique_ids && !seen.insert(id.clone()) {
                return Err(ConfigError::DuplicateItem(id).into());
            }

            let mut row = Row::new(id);
            for (idx, (column, cell)) in headers.iter().zip(&cells).enumerate() {
                if idx == id_index {
                    continue;
                }
                row = if options.is_absent(column, cell) {
                    row.with_absent(column.as_str())
                } else {
                    row.with(column.as_str(), cell.as_str())
                };
            }
            rows.push(row.with_record(cells));
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows grouped by the value of `column`, in order of first appearance.
    ///
    /// Rows where the column is absent are collected under the empty label.
    pub fn groups(&self, column: &str) -> Vec<(String, Vec<Row>)> {
        let mut groups: Vec<(String, Vec<Row>)> = Vec::new();
        for row in &self.rows {
            let label = row.get(column).unwrap_or_default();
            match groups.iter_mut().find(|(l, _)| l == label) {
                Some((_, members)) => members.push(row.clone()),
                None => groups.push((label.to_string(), vec![row.clone()])),
            }
        }
        groups
    }
}

/// Cells for `row` in `headers` order.
fn cells_for(row: &Row, headers: &[String], id_column: &str) -> Vec<String> {
    if row.record().len() == headers.len() {
        return row.record().to_vec();
    }
    headers
        .iter()
        .map(|h| {
            if h == id_column {
                row.id().to_string()
            } else {
                row.value(h)
                    .and_then(PropertyValue::as_present)
                    .unwrap_or_default()
                    .to_string()
            }
        })
        .collect()
}

/// Write all orders of one list, labeling each row with its order index.
///
/// `group_column` replaces an existing column of that name or is appended.
pub fn write_orders<W: io::Write>(
    writer: W,
    headers: &[String],
    id_column: &str,
    group_column: &str,
    orders: &[LabeledOrder],
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let group_index = headers.iter().position(|h| h == group_column);

    let mut out_headers = headers.to_vec();
    if group_index.is_none() {
        out_headers.push(group_column.to_string());
    }
    csv_writer.write_record(&out_headers)?;

    for order in orders {
        let label = order.index.to_string();
        for row in &order.rows {
            let mut cells = cells_for(row, headers, id_column);
            match group_index {
                Some(idx) => cells[idx] = label.clone(),
                None => cells.push(label.clone()),
            }
            csv_writer.write_record(&cells)?;
        }
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write orders to `path`, replacing any existing file.
pub fn write_orders_to_path<P: AsRef<Path>>(
    path: P,
    headers: &[String],
    id_column: &str,
    group_column: &str,
    orders: &[LabeledOrder],
) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_orders(io::BufWriter::new(file), headers, id_column, group_column, orders)
}

/// `lists/l1.csv` -> `lists/l1<suffix>.csv`
pub fn output_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}{suffix}.csv"))
}

/// Expand directories to their `*.csv` files (sorted), skipping earlier outputs.
///
/// The extension is matched in any letter case.
pub fn discover_inputs(inputs: &[PathBuf], suffix: &str) -> Result<Vec<PathBuf>> {
    let options = glob::MatchOptions {
        case_sensitive: false,
        ..glob::MatchOptions::new()
    };
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let pattern = input.join("*.csv");
            let mut found: Vec<PathBuf> = glob::glob_with(&pattern.to_string_lossy(), options)?
                .filter_map(|entry| entry.ok())
                .filter(|path| {
                    !path
                        .file_name()
                        .is_some_and(|name| name.to_string_lossy().contains(suffix))
                })
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }

    Ok(files)
}
