//! CSV Loader - reads a delimited ticket export and mirrors it into SQLite.
//!
//! Every field is kept as text. Nothing is coerced, so `"00123"` and `""`
//! survive the round trip unchanged.

use crate::error::{FlowError, Result};
use csv::ReaderBuilder;
use rusqlite::{params_from_iter, Connection};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// An in-memory copy of the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub records: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub table_name: String,
    pub columns: Vec<String>,
    pub rows: usize,
}

pub fn read_dataset(path: impl AsRef<Path>) -> Result<Dataset> {
    let path = path.as_ref();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_path(path)
        .map_err(|e| FlowError::Dataset(format!("Failed to open {}: {}", path.display(), e)))?;

    let headers = rdr
        .headers()
        .map_err(|e| FlowError::Dataset(format!("Failed to read CSV headers: {}", e)))?
        .clone();

    if headers.is_empty() {
        return Err(FlowError::Dataset(format!(
            "{} has no header row",
            path.display()
        )));
    }

    let columns = normalize_headers(headers.iter());

    let mut records = Vec::new();
    for result in rdr.records() {
        let record =
            result.map_err(|e| FlowError::Dataset(format!("Failed to read CSV record: {}", e)))?;
        records.push(record.iter().map(str::to_string).collect());
    }

    debug!(
        "Read {} records with {} columns from {}",
        records.len(),
        columns.len(),
        path.display()
    );
    Ok(Dataset { columns, records })
}

/// Trims names, names blanks `Unnamed: N` (0-based position) and suffixes
/// repeats `.1`, `.2`, ... skipping any suffix already taken by another
/// column, so the result is always a set of distinct names.
fn normalize_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    raw.enumerate()
        .map(|(idx, name)| {
            let name = name.trim();
            let base = if name.is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                name.to_string()
            };
            let mut unique = base.clone();
            let mut suffix = 1;
            while seen.contains(&unique) {
                unique = format!("{}.{}", base, suffix);
                suffix += 1;
            }
            seen.insert(unique.clone());
            unique
        })
        .collect()
}

pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Drops and recreates `table_name`, then inserts every record in one
/// transaction.
pub fn write_table(
    conn: &mut Connection,
    table_name: &str,
    dataset: &Dataset,
) -> Result<LoadSummary> {
    let table = quote_identifier(table_name);
    let column_defs = dataset
        .columns
        .iter()
        .map(|c| format!("{} TEXT", quote_identifier(c)))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=dataset.columns.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");

    let tx = conn.transaction()?;
    tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", table))?;
    tx.execute_batch(&format!("CREATE TABLE {} ({})", table, column_defs))?;
    {
        let mut stmt = tx.prepare(&format!("INSERT INTO {} VALUES ({})", table, placeholders))?;
        for record in &dataset.records {
            stmt.execute(params_from_iter(record.iter()))?;
        }
    }
    tx.commit()?;

    Ok(LoadSummary {
        table_name: table_name.to_string(),
        columns: dataset.columns.clone(),
        rows: dataset.records.len(),
    })
}

/// Reads `csv_path` and mirrors it into `table_name` of the store at
/// `db_path`, returning the open connection. The store file is only created
/// once the source has been read in full.
pub fn load_csv(
    db_path: impl AsRef<Path>,
    csv_path: impl AsRef<Path>,
    table_name: &str,
) -> Result<(Connection, LoadSummary)> {
    let db_path = db_path.as_ref();
    let dataset = read_dataset(csv_path)?;

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut conn = Connection::open(db_path)?;
    let summary = write_table(&mut conn, table_name, &dataset)?;
    info!(
        "Loaded {} rows into '{}' at {}",
        summary.rows,
        summary.table_name,
        db_path.display()
    );
    Ok((conn, summary))
}
