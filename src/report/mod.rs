//! Reporting: console tables and the analysis results file.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::analysis::QueryOutcome;
use crate::error::AppError;

pub mod format;

pub use format::{fmt_cell, format_report, format_sample, format_table};

/// Write the four analysis sections to `path`, replacing any existing file.
pub fn write_report(path: &Path, outcomes: &[QueryOutcome]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create report '{}': {e}", path.display())))?;
    file.write_all(format_report(outcomes).as_bytes())
        .map_err(|e| AppError::io(format!("Failed to write report '{}': {e}", path.display())))?;
    info!(path = %path.display(), sections = outcomes.len(), "wrote analysis report");
    Ok(())
}
