//! Summary Sink - persists the final answer as a Markdown file.

use crate::error::Result;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct SummarySink {
    path: PathBuf,
}

impl SummarySink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Overwrites any previous summary.
    pub fn write(&self, answer: &str) -> Result<PathBuf> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, answer)?;
        info!("Wrote summary to {}", self.path.display());
        Ok(self.path.clone())
    }
}
