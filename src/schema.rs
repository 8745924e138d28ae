//! Schema Inspector - reads a table's DDL from `sqlite_master`.

use crate::error::{FlowError, Result};
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The `CREATE TABLE` statement SQLite recorded for a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub table_name: String,
    pub ddl: String,
}

impl SchemaDescriptor {
    pub fn as_str(&self) -> &str {
        &self.ddl
    }
}

impl fmt::Display for SchemaDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ddl)
    }
}

pub fn inspect(conn: &Connection, table_name: &str) -> Result<SchemaDescriptor> {
    let ddl: Option<String> = conn
        .query_row(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table_name],
            |row| row.get(0),
        )
        .optional()?;

    ddl.map(|ddl| SchemaDescriptor {
        table_name: table_name.to_string(),
        ddl,
    })
    .ok_or_else(|| FlowError::TableNotFound(table_name.to_string()))
}

/// Opens the store read-only for a single lookup.
pub fn inspect_path(
    store_location: impl AsRef<Path>,
    table_name: &str,
) -> Result<SchemaDescriptor> {
    let path = store_location.as_ref();
    if !path.exists() {
        return Err(FlowError::Database(format!(
            "Database file not found at {}",
            path.display()
        )));
    }
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    inspect(&conn, table_name)
}
