//! Bounded text report for query results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rows rendered into a report; the rest are only counted.
pub const MAX_SAMPLE_ROWS: usize = 20;
/// Values longer than this many characters are truncated.
pub const MAX_VALUE_CHARS: usize = 100;
const TRUNCATED_CHARS: usize = MAX_VALUE_CHARS - ELLIPSIS.len();
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryReport {
    pub row_count: usize,
    pub columns: Vec<String>,
    /// Sampled rows, values aligned with `columns` and already truncated.
    pub rows: Vec<Vec<String>>,
}

impl QueryReport {
    pub fn empty(columns: Vec<String>) -> Self {
        Self {
            row_count: 0,
            columns,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Rows counted but not sampled.
    pub fn remaining(&self) -> usize {
        self.row_count.saturating_sub(self.rows.len())
    }
}

/// Cuts `value` to 97 characters plus `...` when it exceeds 100 characters.
pub fn truncate_value(value: &str) -> String {
    if value.chars().count() <= MAX_VALUE_CHARS {
        return value.to_string();
    }
    let mut out: String = value.chars().take(TRUNCATED_CHARS).collect();
    out.push_str(ELLIPSIS);
    out
}

impl fmt::Display for QueryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "Query executed successfully but returned no results.");
        }

        write!(
            f,
            "Query executed successfully. Retrieved {} row(s).\n\n",
            self.row_count
        )?;
        write!(f, "Columns: {}\n\n", self.columns.join(", "))?;
        writeln!(f, "Sample results (showing first {} rows):", self.rows.len())?;

        for (idx, row) in self.rows.iter().enumerate() {
            write!(f, "\nRow {}:\n", idx + 1)?;
            for (column, value) in self.columns.iter().zip(row) {
                writeln!(f, "  {}: {}", column, value)?;
            }
        }

        if self.remaining() > 0 {
            write!(f, "\n... and {} more rows.", self.remaining())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(row_count: usize, sampled: usize) -> QueryReport {
        QueryReport {
            row_count,
            columns: vec!["ticket_id".to_string(), "status".to_string()],
            rows: (0..sampled)
                .map(|i| vec![i.to_string(), "Open".to_string()])
                .collect(),
        }
    }

    #[test]
    fn test_empty_report_text() {
        let text = QueryReport::empty(vec!["a".to_string()]).to_string();
        assert_eq!(text, "Query executed successfully but returned no results.");
    }

    #[test]
    fn test_single_row_layout() {
        let text = report(1, 1).to_string();
        assert_eq!(
            text,
            "Query executed successfully. Retrieved 1 row(s).\n\n\
             Columns: ticket_id, status\n\n\
             Sample results (showing first 1 rows):\n\
             \nRow 1:\n  ticket_id: 0\n  status: Open\n"
        );
    }

    #[test]
    fn test_remainder_line() {
        let report = report(25, 20);
        assert_eq!(report.remaining(), 5);
        assert!(report.to_string().ends_with("\n... and 5 more rows."));
        assert!(!report.to_string().contains("Row 21:"));
    }

    #[test]
    fn test_truncate_value() {
        let long = "x".repeat(150);
        let cut = truncate_value(&long);
        assert_eq!(cut.chars().count(), 100);
        assert!(cut.starts_with(&"x".repeat(97)));
        assert!(cut.ends_with("..."));

        let exact = "y".repeat(100);
        assert_eq!(truncate_value(&exact), exact);
    }

    #[test]
    fn test_truncate_counts_characters() {
        let long = "é".repeat(120);
        let cut = truncate_value(&long);
        assert_eq!(cut.chars().count(), 100);
        assert_eq!(cut.chars().filter(|c| *c == 'é').count(), 97);
    }
}
