//! Raw borrower rows -> normalized borrower records.
//!
//! The transformation is a fixed, ordered list of stages (`Stage::ALL`)
//! applied to one working frame. Later stages read what earlier stages left
//! behind, so the order is part of the contract:
//!
//! 1. normalize column names
//! 2. rename `delayed_payment` to `days_past_due`
//! 3. coerce the numeric loan columns
//! 4. derive `days_past_due` from the renamed column's original text
//! 5. classify `repayment_history` into `good_repayment_history`
//! 6. drop rows missing a required value
//! 7. derive `outstanding_balance` on the surviving rows

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::{Cell, NormalizedRecord, RawTable};
use crate::error::AppError;

pub mod classifier;

pub use classifier::{PaymentEvent, PaymentMode, classify, parse_history};

/// Columns coerced to numbers.
pub const NUMERIC_COLUMNS: [&str; 4] = ["loan_amount", "emi", "loan_term", "interest_rate"];

/// Columns that must be present for a row to survive.
pub const REQUIRED_COLUMNS: [&str; 5] =
    ["loan_amount", "days_past_due", "emi", "loan_term", "interest_rate"];

const DELAYED_PAYMENT: &str = "delayed_payment";
const DAYS_PAST_DUE: &str = "days_past_due";
const REPAYMENT_HISTORY: &str = "repayment_history";
const GOOD_REPAYMENT_HISTORY: &str = "good_repayment_history";
const OUTSTANDING_BALANCE: &str = "outstanding_balance";

/// `days_past_due` assigned to rows flagged as delayed.
pub const DELAYED_DAYS_PAST_DUE: i64 = 6;

/// One step of the transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    NormalizeColumns,
    RenameDelayedPayment,
    CoerceNumeric,
    DeriveDaysPastDue,
    ClassifyRepayment,
    DropIncomplete,
    DeriveOutstandingBalance,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::NormalizeColumns,
        Stage::RenameDelayedPayment,
        Stage::CoerceNumeric,
        Stage::DeriveDaysPastDue,
        Stage::ClassifyRepayment,
        Stage::DropIncomplete,
        Stage::DeriveOutstandingBalance,
    ];

    fn apply(self, frame: &mut Frame) -> Result<(), AppError> {
        match self {
            Stage::NormalizeColumns => {
                normalize_columns(frame);
                Ok(())
            }
            Stage::RenameDelayedPayment => {
                rename_delayed_payment(frame);
                Ok(())
            }
            Stage::CoerceNumeric => coerce_numeric(frame),
            Stage::DeriveDaysPastDue => derive_days_past_due(frame),
            Stage::ClassifyRepayment => classify_repayment(frame),
            Stage::DropIncomplete => {
                drop_incomplete(frame);
                Ok(())
            }
            Stage::DeriveOutstandingBalance => {
                derive_outstanding_balance(frame);
                Ok(())
            }
        }
    }
}

/// Why a row was excluded from the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropReason {
    /// 1-based CSV line of the row (the header is line 1).
    pub line: usize,
    /// Required columns that were missing after coercion.
    pub missing: Vec<&'static str>,
}

/// Per-row result of the completeness check.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Kept(KeptRow),
    Dropped(DropReason),
}

/// A row that passed the completeness check, with its required values read out.
#[derive(Debug, Clone, PartialEq)]
pub struct KeptRow {
    pub line: usize,
    pub cells: Vec<Cell>,
    pub loan_amount: f64,
    pub emi: f64,
    pub loan_term: f64,
    pub interest_rate: f64,
    pub days_past_due: i64,
}

impl KeptRow {
    pub fn outstanding_balance(&self) -> f64 {
        outstanding_balance(self.loan_amount, self.interest_rate, self.emi)
    }
}

/// `loan_amount * (1 + interest_rate / 100) - emi`
pub fn outstanding_balance(loan_amount: f64, interest_rate: f64, emi: f64) -> f64 {
    loan_amount * (1.0 + interest_rate / 100.0) - emi
}

/// Transformer output: records in input order plus what was dropped.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    /// Output column layout (input order, then derived columns).
    pub columns: Vec<String>,
    pub records: Vec<NormalizedRecord>,
    pub dropped: Vec<DropReason>,
    pub rows_read: usize,
    pub rows_used: usize,
}

struct WorkingRow {
    line: usize,
    cells: Vec<Cell>,
}

struct Frame {
    today: NaiveDate,
    columns: Vec<String>,
    rows: Vec<WorkingRow>,
    kept: Vec<KeptRow>,
    dropped: Vec<DropReason>,
    records: Vec<NormalizedRecord>,
}

impl Frame {
    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn require_column(&self, name: &str) -> Result<usize, AppError> {
        self.column_index(name)
            .ok_or_else(|| AppError::schema(format!("Missing required column: `{name}`")))
    }

    fn push_column(&mut self, name: &str, value: impl Fn(&WorkingRow) -> Cell) {
        for row in &mut self.rows {
            let cell = value(row);
            row.cells.push(cell);
        }
        self.columns.push(name.to_string());
    }
}

/// Run every stage over `raw`, classifying histories as of `today`.
pub fn transform(raw: RawTable, today: NaiveDate) -> Result<TransformOutput, AppError> {
    let rows_read = raw.rows.len();
    let mut frame = Frame {
        today,
        columns: raw.headers,
        rows: raw
            .lines
            .into_iter()
            .zip(raw.rows)
            .map(|(line, cells)| WorkingRow { line, cells })
            .collect(),
        kept: Vec::new(),
        dropped: Vec::new(),
        records: Vec::new(),
    };

    for stage in Stage::ALL {
        stage.apply(&mut frame)?;
    }

    for reason in &frame.dropped {
        debug!(line = reason.line, missing = ?reason.missing, "dropped incomplete row");
    }

    let rows_used = frame.records.len();
    info!(rows_read, rows_used, rows_dropped = frame.dropped.len(), "transformed borrower rows");

    Ok(TransformOutput {
        columns: frame.columns,
        records: frame.records,
        dropped: frame.dropped,
        rows_read,
        rows_used,
    })
}

/// Trim, lowercase, and replace spaces with underscores.
pub fn normalize_column_name(name: &str) -> String {
    name.trim_start_matches('\u{feff}')
        .trim()
        .to_lowercase()
        .replace(' ', "_")
}

fn normalize_columns(frame: &mut Frame) {
    for column in &mut frame.columns {
        *column = normalize_column_name(column);
    }
}

fn rename_delayed_payment(frame: &mut Frame) {
    for column in &mut frame.columns {
        if column.as_str() == DELAYED_PAYMENT {
            *column = DAYS_PAST_DUE.to_string();
        }
    }
}

fn coerce_numeric(frame: &mut Frame) -> Result<(), AppError> {
    for name in NUMERIC_COLUMNS {
        let idx = frame.require_column(name)?;
        for row in &mut frame.rows {
            row.cells[idx] = row.cells[idx].coerce_numeric();
        }
    }
    Ok(())
}

fn derive_days_past_due(frame: &mut Frame) -> Result<(), AppError> {
    let idx = frame.require_column(DAYS_PAST_DUE)?;
    for row in &mut frame.rows {
        let delayed = row.cells[idx].as_text() == Some("Yes");
        row.cells[idx] = Cell::Int(if delayed { DELAYED_DAYS_PAST_DUE } else { 0 });
    }
    Ok(())
}

fn classify_repayment(frame: &mut Frame) -> Result<(), AppError> {
    let idx = frame.require_column(REPAYMENT_HISTORY)?;
    let today = frame.today;
    frame.push_column(GOOD_REPAYMENT_HISTORY, |row| {
        Cell::Bool(classify(&row.cells[idx], today))
    });
    Ok(())
}

fn drop_incomplete(frame: &mut Frame) {
    let indices: Vec<(&'static str, Option<usize>)> = REQUIRED_COLUMNS
        .iter()
        .map(|&name| (name, frame.column_index(name)))
        .collect();

    for row in std::mem::take(&mut frame.rows) {
        match check_row(row, &indices) {
            RowOutcome::Kept(kept) => frame.kept.push(kept),
            RowOutcome::Dropped(reason) => frame.dropped.push(reason),
        }
    }
}

fn check_row(row: WorkingRow, indices: &[(&'static str, Option<usize>)]) -> RowOutcome {
    let value = |name: &str| -> Cell {
        let idx = indices.iter().find(|(n, _)| *n == name).and_then(|(_, idx)| *idx);
        idx.and_then(|i| row.cells.get(i)).cloned().unwrap_or(Cell::Missing)
    };

    let missing: Vec<&'static str> = indices
        .iter()
        .filter(|(name, _)| value(name).is_missing())
        .map(|(name, _)| *name)
        .collect();

    let loan_amount = value("loan_amount").as_f64();
    let emi = value("emi").as_f64();
    let loan_term = value("loan_term").as_f64();
    let interest_rate = value("interest_rate").as_f64();
    let days_past_due = value(DAYS_PAST_DUE).as_i64();

    match (loan_amount, emi, loan_term, interest_rate, days_past_due) {
        (Some(loan_amount), Some(emi), Some(loan_term), Some(interest_rate), Some(days_past_due))
            if missing.is_empty() =>
        {
            RowOutcome::Kept(KeptRow {
                line: row.line,
                cells: row.cells,
                loan_amount,
                emi,
                loan_term,
                interest_rate,
                days_past_due,
            })
        }
        _ => RowOutcome::Dropped(DropReason {
            line: row.line,
            missing,
        }),
    }
}

fn derive_outstanding_balance(frame: &mut Frame) {
    frame.columns.push(OUTSTANDING_BALANCE.to_string());

    let good_idx = frame.column_index(GOOD_REPAYMENT_HISTORY);
    let columns = &frame.columns;
    frame.records = std::mem::take(&mut frame.kept)
        .into_iter()
        .map(|row| {
            let good_repayment_history =
                good_idx.is_some_and(|i| matches!(row.cells.get(i), Some(Cell::Bool(true))));
            let outstanding_balance = row.outstanding_balance();
            let passthrough = columns
                .iter()
                .zip(row.cells)
                .filter(|(name, _)| !is_typed_column(name))
                .map(|(name, cell)| (name.clone(), cell))
                .collect();
            NormalizedRecord {
                loan_amount: row.loan_amount,
                emi: row.emi,
                loan_term: row.loan_term,
                interest_rate: row.interest_rate,
                days_past_due: row.days_past_due,
                good_repayment_history,
                outstanding_balance,
                passthrough,
            }
        })
        .collect();
}

fn is_typed_column(name: &str) -> bool {
    NUMERIC_COLUMNS.contains(&name)
        || matches!(name, DAYS_PAST_DUE | GOOD_REPAYMENT_HISTORY | OUTSTANDING_BALANCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn raw(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::from_fields(
            headers.iter().map(|h| h.to_string()).collect(),
            (2..rows.len() + 2).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    const HEADERS: [&str; 8] = [
        "Name",
        " Loan Amount ",
        "EMI",
        "Loan Term",
        "Interest Rate",
        "Delayed Payment",
        "Repayment History",
        "Loan Type",
    ];

    #[test]
    fn column_names_are_normalized() {
        assert_eq!(normalize_column_name(" Loan Amount "), "loan_amount");
        assert_eq!(normalize_column_name("Delayed Payment"), "delayed_payment");
        assert_eq!(normalize_column_name("\u{feff}Name"), "name");
    }

    #[test]
    fn delayed_payment_becomes_days_past_due_in_place() {
        let out = transform(
            raw(&HEADERS, &[&["Ann", "1000", "50", "12", "10", "Yes", "[]", "Home"]]),
            today(),
        )
        .unwrap();
        assert_eq!(
            out.columns,
            vec![
                "name",
                "loan_amount",
                "emi",
                "loan_term",
                "interest_rate",
                "days_past_due",
                "repayment_history",
                "loan_type",
                "good_repayment_history",
                "outstanding_balance",
            ]
        );
    }

    #[test]
    fn three_row_scenario_keeps_valid_rows_in_order() {
        let out = transform(
            raw(
                &HEADERS,
                &[
                    &["Ann", "1000", "50", "12", "10", "Yes", "[]", "Home"],
                    &["Bob", "lots", "50", "12", "10", "Yes", "[]", "Auto"],
                    &["Cy", "2000", "80", "24", "5", "No", "[]", "Home"],
                ],
            ),
            today(),
        )
        .unwrap();

        assert_eq!(out.rows_read, 3);
        assert_eq!(out.rows_used, 2);
        assert_eq!(out.records[0].get("name"), Cell::Text("Ann".to_string()));
        assert_eq!(out.records[0].days_past_due, 6);
        assert_eq!(out.records[1].get("name"), Cell::Text("Cy".to_string()));
        assert_eq!(out.records[1].days_past_due, 0);
        assert_eq!(
            out.dropped,
            vec![DropReason {
                line: 3,
                missing: vec!["loan_amount"]
            }]
        );
    }

    #[test]
    fn yes_match_is_exact_and_case_sensitive() {
        let out = transform(
            raw(
                &HEADERS,
                &[
                    &["A", "1", "1", "1", "1", "yes", "[]", "x"],
                    &["B", "1", "1", "1", "1", "YES", "[]", "x"],
                    &["C", "1", "1", "1", "1", "", "[]", "x"],
                ],
            ),
            today(),
        )
        .unwrap();
        assert!(out.records.iter().all(|r| r.days_past_due == 0));
        assert_eq!(out.rows_used, 3);
    }

    #[test]
    fn outstanding_balance_uses_formula() {
        let out = transform(
            raw(&HEADERS, &[&["Ann", "1000", "50", "12", "10", "No", "[]", "Home"]]),
            today(),
        )
        .unwrap();
        let r = &out.records[0];
        assert!((r.outstanding_balance - 1050.0).abs() < 1e-9);
    }

    #[test]
    fn unparseable_history_keeps_row_and_classifies_false() {
        let out = transform(
            raw(
                &HEADERS,
                &[
                    &["Ann", "1000", "50", "12", "10", "No", "not json", "Home"],
                    &["Bob", "1000", "50", "12", "10", "No", "", "Home"],
                ],
            ),
            today(),
        )
        .unwrap();
        assert_eq!(out.rows_used, 2);
        assert!(out.records.iter().all(|r| !r.good_repayment_history));
    }

    #[test]
    fn missing_passthrough_values_do_not_drop_rows() {
        let out = transform(
            raw(&HEADERS, &[&["", "1000", "50", "12", "10", "No", "[]", ""]]),
            today(),
        )
        .unwrap();
        assert_eq!(out.rows_used, 1);
        assert_eq!(out.records[0].get("loan_type"), Cell::Missing);
    }

    #[test]
    fn missing_required_column_is_schema_error() {
        let err = transform(
            raw(&["Name", "Loan Amount"], &[&["Ann", "1000"]]),
            today(),
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), AppError::SCHEMA);
        assert!(err.message().contains("emi"));
    }

    #[test]
    fn stages_run_in_documented_order() {
        assert_eq!(Stage::ALL[0], Stage::NormalizeColumns);
        assert_eq!(Stage::ALL[1], Stage::RenameDelayedPayment);
        assert_eq!(Stage::ALL[6], Stage::DeriveOutstandingBalance);
    }
}
