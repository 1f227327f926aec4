//! Shared domain types.
//!
//! These types flow through every stage of the run:
//!
//! - `Cell`: one scalar value, typed per CSV column or produced by a stage
//! - `RawTable`: the fetched dataset before any cleaning
//! - `NormalizedRecord`: one cleaned borrower row
//! - `QueryResult`: a tabular result read back from the store
//! - `PipelineConfig`: the fixed locations the run reads from and writes to

use std::path::PathBuf;

/// Remote CSV export of the borrower dataset.
pub const SOURCE_URL: &str =
    "https://drive.google.com/uc?export=download&id=1asq7yzvFpkmDUMZQtK7AJ16_XZbQCZmc";
/// SQLite file the cleaned dataset is written to.
pub const STORE_PATH: &str = "borrowers.db";
/// Plain-text file holding the four analysis sections.
pub const REPORT_PATH: &str = "analysis_results.txt";
/// Table replaced on every run.
pub const BORROWERS_TABLE: &str = "borrowers";
/// Number of transformed rows echoed to the console before persistence.
pub const SAMPLE_ROWS: usize = 5;

/// Locations and limits for a single run.
///
/// The binary always uses `PipelineConfig::default()`; tests point the store
/// and report at temporary paths.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source_url: String,
    pub store_path: PathBuf,
    pub report_path: PathBuf,
    pub sample_rows: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_url: SOURCE_URL.to_string(),
            store_path: PathBuf::from(STORE_PATH),
            report_path: PathBuf::from(REPORT_PATH),
            sample_rows: SAMPLE_ROWS,
        }
    }
}

/// Cell texts read as missing values.
const NA_MARKERS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_na(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || NA_MARKERS.contains(&trimmed)
}

/// Storage type shared by every cell of one CSV column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Int,
    Real,
    Text,
}

impl ColumnKind {
    /// Pick the narrowest type that every non-missing value parses as.
    ///
    /// A column is numeric only when all of its present values are; one
    /// non-numeric value makes the whole column text.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut kind = ColumnKind::Int;
        for raw in values.into_iter().filter(|v| !is_na(v)) {
            let trimmed = raw.trim();
            if kind == ColumnKind::Int && trimmed.parse::<i64>().is_ok() {
                continue;
            }
            if parse_finite_f64(trimmed).is_none() {
                return ColumnKind::Text;
            }
            kind = ColumnKind::Real;
        }
        kind
    }

    /// Read one raw value as a cell of this column type.
    pub fn cell(self, raw: &str) -> Cell {
        if is_na(raw) {
            return Cell::Missing;
        }
        let trimmed = raw.trim();
        match self {
            ColumnKind::Int => trimmed.parse::<i64>().map_or(Cell::Missing, Cell::Int),
            ColumnKind::Real => parse_finite_f64(trimmed).map_or(Cell::Missing, Cell::Real),
            ColumnKind::Text => Cell::Text(raw.to_string()),
        }
    }
}

/// A single scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Int(i64),
    Real(f64),
    Bool(bool),
    Text(String),
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(v) => Some(*v as f64),
            Cell::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Best-effort numeric conversion: a number or `Missing`, never an error.
    pub fn coerce_numeric(&self) -> Cell {
        let value = match self {
            Cell::Int(v) => Some(*v as f64),
            Cell::Real(v) => Some(*v),
            Cell::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Cell::Text(s) => parse_finite_f64(s.trim()),
            Cell::Missing => None,
        };
        value.map_or(Cell::Missing, Cell::Real)
    }
}

fn parse_finite_f64(s: &str) -> Option<f64> {
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// The dataset as fetched: headers as written in the file plus one cell per
/// header for every data row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    /// 1-based CSV line each row starts on (the header is line 1).
    pub lines: Vec<usize>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    /// Build a table from text fields, typing each column as a whole.
    ///
    /// Rows shorter than the header are padded with missing values and
    /// longer rows are cut to the header width.
    pub fn from_fields(headers: Vec<String>, lines: Vec<usize>, fields: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let kinds: Vec<ColumnKind> = (0..width)
            .map(|idx| {
                ColumnKind::infer(fields.iter().filter_map(|row| row.get(idx).map(String::as_str)))
            })
            .collect();

        let rows = fields
            .iter()
            .map(|row| {
                kinds
                    .iter()
                    .enumerate()
                    .map(|(idx, kind)| row.get(idx).map_or(Cell::Missing, |raw| kind.cell(raw)))
                    .collect()
            })
            .collect();

        Self { headers, lines, rows }
    }
}

/// One cleaned borrower row.
///
/// The typed fields are guaranteed present; every other input column is
/// carried in `passthrough`, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub loan_amount: f64,
    pub emi: f64,
    pub loan_term: f64,
    pub interest_rate: f64,
    pub days_past_due: i64,
    pub good_repayment_history: bool,
    pub outstanding_balance: f64,
    pub passthrough: Vec<(String, Cell)>,
}

impl NormalizedRecord {
    /// Look up a column by its normalized name.
    pub fn get(&self, column: &str) -> Cell {
        match column {
            "loan_amount" => Cell::Real(self.loan_amount),
            "emi" => Cell::Real(self.emi),
            "loan_term" => Cell::Real(self.loan_term),
            "interest_rate" => Cell::Real(self.interest_rate),
            "days_past_due" => Cell::Int(self.days_past_due),
            "good_repayment_history" => Cell::Bool(self.good_repayment_history),
            "outstanding_balance" => Cell::Real(self.outstanding_balance),
            other => self
                .passthrough
                .iter()
                .find(|(name, _)| name == other)
                .map(|(_, cell)| cell.clone())
                .unwrap_or(Cell::Missing),
        }
    }
}

/// Rows read back from the store, with column labels as SQLite reports them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn column_kind_is_the_narrowest_fit() {
        assert_eq!(ColumnKind::infer(["1", "", "42"]), ColumnKind::Int);
        assert_eq!(ColumnKind::infer(["1", "4.5", "N/A"]), ColumnKind::Real);
        assert_eq!(ColumnKind::infer(["1", "Yes"]), ColumnKind::Text);
        assert_eq!(ColumnKind::infer(["inf"]), ColumnKind::Text);
        assert_eq!(ColumnKind::infer(["", "   "]), ColumnKind::Int);
    }

    #[test]
    fn cells_follow_their_column_kind() {
        assert_eq!(ColumnKind::Int.cell(" 42 "), Cell::Int(42));
        assert_eq!(ColumnKind::Real.cell("3"), Cell::Real(3.0));
        assert_eq!(ColumnKind::Text.cell("007"), Cell::Text("007".to_string()));
        assert_eq!(ColumnKind::Text.cell("N/A"), Cell::Missing);
        assert_eq!(ColumnKind::Text.cell("NAN"), Cell::Text("NAN".to_string()));
    }

    #[test]
    fn mixed_columns_keep_every_value_verbatim() {
        let table = RawTable::from_fields(
            vec!["name".to_string(), "loan_type".to_string(), "loan_amount".to_string()],
            vec![2, 3],
            fields(&[&["007", "Home", "1000"], &["Ann", "1.50", "2000.5"]]),
        );
        assert_eq!(table.rows[0][0], Cell::Text("007".to_string()));
        assert_eq!(table.rows[1][1], Cell::Text("1.50".to_string()));
        assert_eq!(table.rows[0][2], Cell::Real(1000.0));
        assert_eq!(table.rows[1][2], Cell::Real(2000.5));
    }

    #[test]
    fn short_and_long_rows_fit_the_header() {
        let table = RawTable::from_fields(
            vec!["a".to_string(), "b".to_string()],
            vec![2, 3],
            fields(&[&["1"], &["2", "3", "extra"]]),
        );
        assert_eq!(table.rows[0], vec![Cell::Int(1), Cell::Missing]);
        assert_eq!(table.rows[1], vec![Cell::Int(2), Cell::Int(3)]);
    }

    #[test]
    fn coerce_numeric_never_fails() {
        assert_eq!(Cell::Int(3).coerce_numeric(), Cell::Real(3.0));
        assert_eq!(Cell::Text("abc".into()).coerce_numeric(), Cell::Missing);
        assert_eq!(Cell::Text(" 7.25 ".into()).coerce_numeric(), Cell::Real(7.25));
        assert_eq!(Cell::Missing.coerce_numeric(), Cell::Missing);
    }

    #[test]
    fn record_get_resolves_typed_and_passthrough_columns() {
        let record = NormalizedRecord {
            loan_amount: 1000.0,
            emi: 50.0,
            loan_term: 12.0,
            interest_rate: 10.0,
            days_past_due: 6,
            good_repayment_history: true,
            outstanding_balance: 1050.0,
            passthrough: vec![("name".to_string(), Cell::Text("Ann".to_string()))],
        };
        assert_eq!(record.get("days_past_due"), Cell::Int(6));
        assert_eq!(record.get("good_repayment_history"), Cell::Bool(true));
        assert_eq!(record.get("name"), Cell::Text("Ann".to_string()));
        assert_eq!(record.get("absent"), Cell::Missing);
    }
}
