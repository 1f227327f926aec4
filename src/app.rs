//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - sets up logging
//! - runs the pipeline with the fixed configuration
//! - prints the transformed sample and each query result to the console

use tracing_subscriber::EnvFilter;

use crate::domain::PipelineConfig;
use crate::error::AppError;
use crate::report::{format_sample, format_table};

pub mod pipeline;

use pipeline::Progress;

const DEFAULT_LOG_FILTER: &str = "borrower_etl=info";

/// Entry point for the `borrower-etl` binary.
pub fn run() -> Result<(), AppError> {
    init_tracing();

    let config = PipelineConfig::default();
    let sample_rows = config.sample_rows;
    pipeline::run_pipeline(&config, |progress| print_progress(progress, sample_rows))?;

    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    // Logs go to stderr so stdout carries only the results.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_progress(progress: Progress<'_>, sample_rows: usize) {
    match progress {
        Progress::Transformed(output) => {
            println!("Transformed Data Sample:\n{}", format_sample(output, sample_rows));
        }
        Progress::Loaded { table, .. } => {
            println!("Data loaded successfully into the '{table}' table.");
        }
        Progress::QueryDone(outcome) => {
            println!("\n{}. Query results:", outcome.query.key);
            println!("{}", format_table(&outcome.result));
        }
    }
}
