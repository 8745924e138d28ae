//! Read-only query validation
//!
//! Two layers: a substring screen on the upper-cased text, then a structural
//! check with `sqlparser`. The screen ignores SQL quoting and word
//! boundaries, so `WHERE note = 'DROP'` and `created_at` are both rejected.

use sqlparser::ast::{SetExpr, Statement};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;
use thiserror::Error;
use tracing::debug;

/// Mutating keywords, in the order they are checked.
pub const FORBIDDEN_KEYWORDS: [&str; 7] = [
    "DROP", "DELETE", "INSERT", "UPDATE", "ALTER", "CREATE", "TRUNCATE",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Query cannot be empty")]
    Empty,

    #[error("Only SELECT queries are allowed for security reasons")]
    NotReadOnly,

    #[error("Query contains forbidden keyword: {0}")]
    ForbiddenKeyword(String),

    #[error("Only a single statement is allowed, found {0}")]
    MultipleStatements(usize),
}

/// Returns `query` unchanged when it is a single read-only SELECT.
pub fn validate_query(query: &str) -> Result<&str, ValidationError> {
    let normalized = query.trim().to_uppercase();

    if normalized.is_empty() {
        return Err(ValidationError::Empty);
    }

    if !normalized.starts_with("SELECT") {
        return Err(ValidationError::NotReadOnly);
    }

    if let Some(keyword) = find_forbidden_keyword(&normalized) {
        return Err(ValidationError::ForbiddenKeyword(keyword.to_string()));
    }

    check_structure(query)?;

    Ok(query)
}

fn find_forbidden_keyword(normalized: &str) -> Option<&'static str> {
    FORBIDDEN_KEYWORDS
        .iter()
        .copied()
        .find(|kw| normalized.contains(kw))
}

/// Text the parser cannot handle is left for SQLite to reject; the gateway
/// runs it on a read-only connection and counts its statements there.
fn check_structure(query: &str) -> Result<(), ValidationError> {
    let statements = match Parser::parse_sql(&SQLiteDialect {}, query) {
        Ok(statements) => statements,
        Err(e) => {
            debug!("SQL parsing failed, deferring to store: {}", e);
            return Ok(());
        }
    };

    if statements.len() != 1 {
        return Err(ValidationError::MultipleStatements(statements.len()));
    }

    match &statements[0] {
        Statement::Query(q) if is_read_only_body(&q.body) => Ok(()),
        _ => Err(ValidationError::NotReadOnly),
    }
}

fn is_read_only_body(body: &SetExpr) -> bool {
    match body {
        SetExpr::Select(_) | SetExpr::Values(_) => true,
        SetExpr::Query(inner) => is_read_only_body(&inner.body),
        SetExpr::SetOperation { left, right, .. } => {
            is_read_only_body(left) && is_read_only_body(right)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_select() {
        let sql = "SELECT \"Ticket Type\", COUNT(*) FROM customer_support_tickets GROUP BY 1";
        assert_eq!(validate_query(sql), Ok(sql));
    }

    #[test]
    fn test_returns_original_casing_and_whitespace() {
        let sql = "  select ticket_id from t  ";
        assert_eq!(validate_query(sql), Ok(sql));
    }

    #[test]
    fn test_rejects_non_select_leading_keyword() {
        for sql in [
            "DELETE FROM t",
            "update t set a = 1",
            "WITH x AS (SELECT 1) SELECT * FROM x",
            "PRAGMA table_info(t)",
            "  explain select 1",
        ] {
            assert_eq!(validate_query(sql), Err(ValidationError::NotReadOnly), "{}", sql);
        }
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(validate_query("   \n"), Err(ValidationError::Empty));
    }

    #[test]
    fn test_keyword_inside_literal_is_rejected() {
        assert_eq!(
            validate_query("SELECT * FROM t WHERE x = 'DROP'"),
            Err(ValidationError::ForbiddenKeyword("DROP".to_string()))
        );
    }

    #[test]
    fn test_first_keyword_in_check_order_is_reported() {
        assert_eq!(
            validate_query("SELECT 'create', 'delete' FROM t"),
            Err(ValidationError::ForbiddenKeyword("DELETE".to_string()))
        );
    }

    #[test]
    fn test_keyword_inside_identifier_is_rejected() {
        assert_eq!(
            validate_query("SELECT created_at FROM t"),
            Err(ValidationError::ForbiddenKeyword("CREATE".to_string()))
        );
        assert_eq!(
            validate_query("SELECT * FROM t WHERE x = 'xDROPx'"),
            Err(ValidationError::ForbiddenKeyword("DROP".to_string()))
        );
        assert_eq!(
            validate_query("SELECT last_updated FROM t"),
            Err(ValidationError::ForbiddenKeyword("UPDATE".to_string()))
        );
    }

    #[test]
    fn test_ordinary_columns_pass_the_screen() {
        let sql = "SELECT \"Ticket Priority\", \"Date of Purchase\" FROM t";
        assert_eq!(validate_query(sql), Ok(sql));
    }

    #[test]
    fn test_multi_statement_injection_is_blocked() {
        assert_eq!(
            validate_query("SELECT 1; DROP TABLE x"),
            Err(ValidationError::ForbiddenKeyword("DROP".to_string()))
        );
        assert_eq!(
            validate_query("SELECT 1; SELECT 2"),
            Err(ValidationError::MultipleStatements(2))
        );
    }

    #[test]
    fn test_union_of_selects_is_allowed() {
        let sql = "SELECT a FROM t UNION ALL SELECT b FROM u";
        assert_eq!(validate_query(sql), Ok(sql));
    }

    #[test]
    fn test_unparseable_select_is_deferred() {
        let sql = "SELECT * FROM t WHERE (";
        assert_eq!(validate_query(sql), Ok(sql));
    }
}
