//! Plain-text tables and the analysis report.
//!
//! Tables are rendered without an index column: a header row of column
//! labels followed by one line per row, every column right-aligned.

use crate::analysis::QueryOutcome;
use crate::domain::{Cell, QueryResult};
use crate::transform::TransformOutput;

/// Console cell width limit for the transformed-data sample.
const SAMPLE_MAX_WIDTH: usize = 50;

/// Format a result table with no cell truncation.
pub fn format_table(result: &QueryResult) -> String {
    render_table(result, None)
}

/// Format the first `limit` transformed records, truncating long cells.
pub fn format_sample(output: &TransformOutput, limit: usize) -> String {
    let sample = QueryResult {
        columns: output.columns.clone(),
        rows: output
            .records
            .iter()
            .take(limit)
            .map(|record| output.columns.iter().map(|c| record.get(c)).collect())
            .collect(),
    };
    render_table(&sample, Some(SAMPLE_MAX_WIDTH))
}

/// Format all query outcomes as the report file body.
pub fn format_report(outcomes: &[QueryOutcome]) -> String {
    let mut out = String::from("### Analysis Results\n");
    for (i, outcome) in outcomes.iter().enumerate() {
        out.push_str(if i == 0 { "\n" } else { "\n\n" });
        out.push_str(&format!(
            "#### {}. {}:\n",
            outcome.query.key, outcome.query.heading
        ));
        out.push_str(&format_table(&outcome.result));
    }
    out
}

fn render_table(result: &QueryResult, max_width: Option<usize>) -> String {
    if result.is_empty() {
        return format!("Empty result\nColumns: [{}]", result.columns.join(", "));
    }

    let rendered: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| {
                    let text = fmt_cell(cell);
                    match max_width {
                        Some(max) => truncate(&text, max),
                        None => text,
                    }
                })
                .collect()
        })
        .collect();

    let widths: Vec<usize> = result
        .columns
        .iter()
        .enumerate()
        .map(|(idx, label)| {
            rendered
                .iter()
                .filter_map(|row| row.get(idx))
                .map(|s| s.chars().count())
                .chain(std::iter::once(label.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(rendered.len() + 1);
    lines.push(render_line(result.columns.iter().map(String::as_str), &widths));
    for row in &rendered {
        lines.push(render_line(row.iter().map(String::as_str), &widths));
    }
    lines.join("\n")
}

fn render_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let parts: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:>width$}"))
        .collect();
    parts.join("  ")
}

/// Display text for one cell.
pub fn fmt_cell(cell: &Cell) -> String {
    match cell {
        Cell::Missing => "None".to_string(),
        Cell::Int(v) => v.to_string(),
        Cell::Real(v) => fmt_real(*v),
        Cell::Bool(true) => "True".to_string(),
        Cell::Bool(false) => "False".to_string(),
        Cell::Text(s) => s.clone(),
    }
}

fn fmt_real(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    if v.fract() == 0.0 && v.abs() < 1e16 {
        return format!("{v:.1}");
    }
    let s = format!("{v:.6}");
    let s = s.trim_end_matches('0');
    if s.ends_with('.') {
        format!("{s}0")
    } else {
        s.to_string()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AVERAGE_LOAN_PAST_DUE, QUERIES};

    fn result(columns: &[&str], rows: Vec<Vec<Cell>>) -> QueryResult {
        QueryResult {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn table_right_aligns_under_headers() {
        let table = format_table(&result(
            &["name", "outstanding_balance"],
            vec![
                vec![Cell::Text("Ann".into()), Cell::Real(1050.0)],
                vec![Cell::Text("Robert".into()), Cell::Real(99.125)],
            ],
        ));
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "  name  outstanding_balance");
        assert_eq!(lines[1], "   Ann               1050.0");
        assert_eq!(lines[2], "Robert               99.125");
    }

    #[test]
    fn null_renders_as_none() {
        let table = format_table(&result(&["average_loan_amount"], vec![vec![Cell::Missing]]));
        assert_eq!(table, "average_loan_amount\n               None");
    }

    #[test]
    fn empty_result_lists_columns() {
        let table = format_table(&result(&["name", "emi"], Vec::new()));
        assert_eq!(table, "Empty result\nColumns: [name, emi]");
    }

    #[test]
    fn reals_trim_trailing_zeros() {
        assert_eq!(fmt_real(1500.0), "1500.0");
        assert_eq!(fmt_real(0.1 + 0.2), "0.3");
        assert_eq!(fmt_real(12.3456789), "12.345679");
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("abcdefgh", 6), "abc...");
        assert_eq!(truncate("abc", 6), "abc");
    }

    #[test]
    fn report_has_sections_in_fixed_order() {
        let outcomes: Vec<QueryOutcome> = QUERIES
            .iter()
            .map(|q| QueryOutcome {
                query: *q,
                result: result(&["x"], vec![vec![Cell::Int(1)]]),
            })
            .collect();
        let report = format_report(&outcomes);

        assert!(report.starts_with("### Analysis Results\n\n#### a. Average loan amount"));
        let a = report.find("#### a.").unwrap();
        let b = report.find("#### b.").unwrap();
        let c = report.find("#### c.").unwrap();
        let d = report.find("#### d.").unwrap();
        assert!(a < b && b < c && c < d);
        assert!(report.contains("x\n1\n\n#### b. Top 10 borrowers"));
        assert!(!report.ends_with('\n'));
        assert_eq!(outcomes[0].query, AVERAGE_LOAN_PAST_DUE);
    }
}
