//! Shared pipeline logic used by the binary and the integration tests.
//!
//! fetch -> parse CSV -> transform -> replace `borrowers` -> queries a..d -> report file
//!
//! Presentation stays with the caller: each milestone is handed to an
//! `on_progress` callback, which the binary uses for console output.

use chrono::{Local, NaiveDate};
use tracing::info;

use crate::analysis::{QUERIES, QueryOutcome};
use crate::data::SourceClient;
use crate::domain::{BORROWERS_TABLE, PipelineConfig};
use crate::error::AppError;
use crate::io::ingest::parse_raw_table;
use crate::report::write_report;
use crate::store::BorrowerStore;
use crate::transform::{TransformOutput, transform};

/// Milestones reported while a run is in progress.
#[derive(Debug, Clone, Copy)]
pub enum Progress<'a> {
    /// Transformation finished; nothing has been persisted yet.
    Transformed(&'a TransformOutput),
    /// The table was replaced with `rows` records.
    Loaded { table: &'static str, rows: usize },
    /// One analysis query finished.
    QueryDone(&'a QueryOutcome),
}

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub transform: TransformOutput,
    pub outcomes: Vec<QueryOutcome>,
}

/// Execute the full pipeline, fetching from `config.source_url`.
///
/// A failed fetch returns before the store or report file is touched.
pub fn run_pipeline(
    config: &PipelineConfig,
    on_progress: impl FnMut(Progress<'_>),
) -> Result<RunOutput, AppError> {
    let client = SourceClient::new();
    let csv_text = client.fetch_csv(&config.source_url)?;
    run_with_csv(config, &csv_text, Local::now().date_naive(), on_progress)
}

/// Execute every step after the fetch against already-downloaded CSV text.
pub fn run_with_csv(
    config: &PipelineConfig,
    csv_text: &str,
    today: NaiveDate,
    mut on_progress: impl FnMut(Progress<'_>),
) -> Result<RunOutput, AppError> {
    // 1) Parse and clean.
    let raw = parse_raw_table(csv_text)?;
    let transformed = transform(raw, today)?;
    on_progress(Progress::Transformed(&transformed));

    // 2) Replace the table wholesale.
    let mut store = BorrowerStore::open(&config.store_path)?;
    let rows = store.replace_table(BORROWERS_TABLE, &transformed)?;
    on_progress(Progress::Loaded {
        table: BORROWERS_TABLE,
        rows,
    });

    // 3) Ask the fixed questions, in report order.
    let mut outcomes = Vec::with_capacity(QUERIES.len());
    for query in QUERIES {
        let outcome = query.execute(&store)?;
        info!(query = %query.key, rows = outcome.result.rows.len(), "query complete");
        on_progress(Progress::QueryDone(&outcome));
        outcomes.push(outcome);
    }

    // 4) Persist the report.
    write_report(&config.report_path, &outcomes)?;

    Ok(RunOutput {
        transform: transformed,
        outcomes,
    })
}
