//! Query Gateway
//!
//! Executes validated SELECT statements against the ticket store and turns the
//! result into a bounded [`QueryReport`]. Every call opens its own read-only
//! connection and releases it before returning.

pub mod report;
pub mod validator;

pub use report::{truncate_value, QueryReport, MAX_SAMPLE_ROWS, MAX_VALUE_CHARS};
pub use validator::{validate_query, ValidationError, FORBIDDEN_KEYWORDS};

use crate::config::DEFAULT_DATABASE_PATH;
use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection, OpenFlags, Row};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info};

/// Tool-call arguments for a gateway query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(alias = "sql")]
    pub query: String,
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

fn default_database_path() -> String {
    DEFAULT_DATABASE_PATH.to_string()
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            database_path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    Validation,
    StoreNotFound,
    Backend,
    Unexpected,
}

/// Display output is the text callers of [`QueryGateway::run`] see.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Error: Query rejected: {0}")]
    Validation(#[from] ValidationError),

    #[error("Error: Database file not found at {}", .path.display())]
    StoreNotFound { path: PathBuf },

    #[error("SQLite error: {message}")]
    Backend { message: String },

    #[error("Unexpected error executing query: {message}")]
    Unexpected { message: String },
}

impl GatewayError {
    pub fn kind(&self) -> GatewayErrorKind {
        match self {
            GatewayError::Validation(_) => GatewayErrorKind::Validation,
            GatewayError::StoreNotFound { .. } => GatewayErrorKind::StoreNotFound,
            GatewayError::Backend { .. } => GatewayErrorKind::Backend,
            GatewayError::Unexpected { .. } => GatewayErrorKind::Unexpected,
        }
    }

    fn unexpected(message: impl Into<String>) -> Self {
        GatewayError::Unexpected {
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for GatewayError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::Utf8Error(_)
            | rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::IntegralValueOutOfRange(..) => {
                GatewayError::unexpected(err.to_string())
            }
            other => GatewayError::Backend {
                message: other.to_string(),
            },
        }
    }
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Stateless apart from the project root; cheap to clone and share.
#[derive(Debug, Clone)]
pub struct QueryGateway {
    project_root: PathBuf,
}

impl QueryGateway {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }

    /// Validate, execute and summarize `query` against the store at
    /// `store_location` (relative to the project root unless absolute).
    pub fn execute(
        &self,
        query: &str,
        store_location: impl AsRef<Path>,
    ) -> GatewayResult<QueryReport> {
        let query = validate_query(query)?;
        let path = self.resolve(store_location.as_ref())?;

        if !path.exists() {
            return Err(GatewayError::StoreNotFound { path });
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let report = run_select(&conn, query)?;
        debug!("Query returned {} row(s)", report.row_count);
        Ok(report)
    }

    pub fn execute_request(&self, request: &QueryRequest) -> GatewayResult<QueryReport> {
        self.execute(&request.query, &request.database_path)
    }

    /// Text contract: the rendered report, or the rendered error. Never fails.
    pub fn run(&self, query: &str, store_location: impl AsRef<Path>) -> String {
        match self.execute(query, store_location) {
            Ok(report) => report.to_string(),
            Err(err) => {
                match err.kind() {
                    GatewayErrorKind::Backend | GatewayErrorKind::Unexpected => error!("{}", err),
                    _ => info!("{}", err),
                }
                err.to_string()
            }
        }
    }

    fn resolve(&self, store_location: &Path) -> GatewayResult<PathBuf> {
        let joined = self.project_root.join(store_location);
        if joined.is_absolute() {
            return Ok(joined);
        }
        let cwd = std::env::current_dir().map_err(|e| {
            GatewayError::unexpected(format!("cannot resolve working directory: {}", e))
        })?;
        Ok(cwd.join(joined))
    }
}

/// Number of non-empty statements SQLite finds in `query`.
fn count_statements(conn: &Connection, query: &str) -> GatewayResult<usize> {
    let mut batch = Batch::new(conn, query);
    let mut count = 0;
    while batch.next()?.is_some() {
        count += 1;
    }
    Ok(count)
}

fn run_select(conn: &Connection, query: &str) -> GatewayResult<QueryReport> {
    // `prepare` compiles only the first statement and ignores the rest.
    let statements = count_statements(conn, query)?;
    if statements > 1 {
        return Err(ValidationError::MultipleStatements(statements).into());
    }

    let mut stmt = conn.prepare(query)?;

    if !stmt.readonly() {
        return Err(ValidationError::NotReadOnly.into());
    }

    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query([])?;

    let mut report = QueryReport::empty(columns);
    while let Some(row) = rows.next()? {
        report.row_count += 1;
        if report.rows.len() < MAX_SAMPLE_ROWS {
            report.rows.push(render_row(row, report.columns.len())?);
        }
    }

    Ok(report)
}

fn render_row(row: &Row<'_>, width: usize) -> GatewayResult<Vec<String>> {
    (0..width)
        .map(|idx| -> GatewayResult<String> {
            let value = render_value(row.get_ref(idx)?)?;
            Ok(truncate_value(&value))
        })
        .collect()
}

/// NULL is written as `NULL` rather than a host-language null name, and reals
/// use Rust's shortest round-trip form (`4.0`, `1e16`).
fn render_value(value: ValueRef<'_>) -> GatewayResult<String> {
    let rendered = match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => format!("{:?}", f),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map_err(|e| GatewayError::unexpected(format!("invalid UTF-8 in text column: {}", e)))?
            .to_string(),
        ValueRef::Blob(bytes) => format!("<blob {} bytes>", bytes.len()),
    };
    Ok(rendered)
}
