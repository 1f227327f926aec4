//! CSV ingest.
//!
//! Turns the fetched CSV body into a `RawTable`. No cleaning happens here:
//! headers keep the spelling found in the file and each column is typed as a
//! whole (see `ColumnKind::infer`).

use crate::domain::RawTable;
use crate::error::AppError;

/// Parse comma-separated text with a header row into a `RawTable`.
///
/// Short rows are padded with `Missing`; extra trailing fields are ignored.
pub fn parse_raw_table(text: &str) -> Result<RawTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::schema(format!("Failed to read CSV headers: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(AppError::schema("CSV source has no header row."));
    }

    let mut lines = Vec::new();
    let mut fields = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| {
            let at = e
                .position()
                .map(|p| format!(" on line {}", p.line()))
                .unwrap_or_default();
            AppError::schema(format!("CSV parse error{at}: {e}"))
        })?;
        // Quoted fields may span lines, so take the line the record starts on.
        let line = record.position().map_or(0, |p| p.line() as usize);
        lines.push(line);
        fields.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable::from_fields(headers, lines, fields))
}
