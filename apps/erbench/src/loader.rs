//! # Loader Module
//!
//! File formats around the evaluator.
//!
//! - Partitions: `[[1, 2, 3], [4, 5]]` or `{"clusters": [[1, 2, 3], [4, 5]]}`
//! - Universes: a JSON array of IDs, or a CSV file whose header has an `id`
//!   column (the dataset the records came from)
//! - Matched pairs: `[[1, 2], [2, 3]]`

use crate::error::{AppError, Result};
use erbench_core::{Partition, RecordId, Universe};
use serde::Deserialize;
use std::path::Path;

/// Accepted partition file shapes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PartitionFile {
    Bare(Partition),
    Wrapped { clusters: Partition },
}

impl From<PartitionFile> for Partition {
    fn from(file: PartitionFile) -> Self {
        match file {
            PartitionFile::Bare(partition) | PartitionFile::Wrapped { clusters: partition } => {
                partition
            }
        }
    }
}

/// Parse a partition from JSON text in either accepted shape.
pub fn parse_partition(text: &str) -> serde_json::Result<Partition> {
    serde_json::from_str::<PartitionFile>(text).map(Partition::from)
}

/// Read a whole file as text.
pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| AppError::io(path, e))
}

/// Load a partition file.
pub fn load_partition(path: &Path) -> Result<Partition> {
    let text = read_text(path)?;
    parse_partition(&text).map_err(|e| AppError::json(path, e))
}

/// Write a partition as a bare JSON array of clusters.
pub fn save_partition(partition: &Partition, path: &Path) -> Result<()> {
    let json = serde_json::to_string(partition).map_err(|e| AppError::json(path, e))?;
    std::fs::write(path, json).map_err(|e| AppError::io(path, e))
}

/// Load matched record pairs.
pub fn load_pairs(path: &Path) -> Result<Vec<(RecordId, RecordId)>> {
    let text = read_text(path)?;
    serde_json::from_str(&text).map_err(|e| AppError::json(path, e))
}

/// Load a universe from a JSON array or a CSV file with an `id` column.
pub fn load_universe(path: &Path) -> Result<Universe> {
    let text = read_text(path)?;
    let is_json = path.extension().is_some_and(|ext| ext == "json")
        || text.trim_start().starts_with('[');

    if is_json {
        let ids: Vec<RecordId> =
            serde_json::from_str(&text).map_err(|e| AppError::json(path, e))?;
        Ok(ids.into_iter().collect())
    } else {
        universe_from_csv(&text).map_err(|reason| AppError::Universe {
            path: path.to_path_buf(),
            reason,
        })
    }
}

/// Collect the `id` column of a CSV document.
///
/// Quoted fields may span lines; a leading byte-order mark is ignored.
fn universe_from_csv(text: &str) -> std::result::Result<Universe, String> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers().map_err(|e| e.to_string())?;
    if headers.is_empty() {
        return Err("file is empty".to_string());
    }
    let column = headers
        .iter()
        .position(|name| name.eq_ignore_ascii_case("id"))
        .ok_or_else(|| "header has no `id` column".to_string())?;

    let mut ids = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| format!("row {}: {}", row + 1, e))?;
        let raw = record
            .get(column)
            .ok_or_else(|| format!("row {} has no `id` field", row + 1))?;
        let id = raw
            .parse::<u64>()
            .map_err(|e| format!("row {}: invalid id {:?}: {}", row + 1, raw, e))?;
        ids.push(RecordId(id));
    }

    Ok(ids.into_iter().collect())
}

// =============================================================================
// TESTS
// =============================================================================
