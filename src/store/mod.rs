//! SQLite persistence for normalized borrower records.
//!
//! Only this module talks to the database. Writes always replace the whole
//! table; reads return generic `QueryResult`s for reporting.

use std::path::Path;

use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{Connection, ToSql, params_from_iter};
use tracing::info;

use crate::domain::{Cell, NormalizedRecord, QueryResult};
use crate::error::AppError;
use crate::transform::TransformOutput;

pub struct BorrowerStore {
    conn: Connection,
}

impl BorrowerStore {
    pub fn open(path: &Path) -> Result<Self, AppError> {
        let conn = Connection::open(path).map_err(|e| {
            AppError::store(format!("Failed to open store '{}': {e}", path.display()))
        })?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::store(format!("Failed to open in-memory store: {e}")))?;
        Ok(Self { conn })
    }

    /// Drop `table` if present and recreate it from `output`, in one transaction.
    ///
    /// Column types are inferred from the records. Returns the number of rows written.
    pub fn replace_table(&mut self, table: &str, output: &TransformOutput) -> Result<usize, AppError> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| AppError::store(format!("Failed to begin transaction: {e}")))?;

        tx.execute_batch(&format!("DROP TABLE IF EXISTS {};", quote_ident(table)))
            .map_err(|e| AppError::store(format!("Failed to drop table `{table}`: {e}")))?;

        let column_defs: Vec<String> = output
            .columns
            .iter()
            .map(|name| format!("{} {}", quote_ident(name), infer_sql_type(name, &output.records)))
            .collect();
        tx.execute_batch(&format!(
            "CREATE TABLE {} ({});",
            quote_ident(table),
            column_defs.join(", ")
        ))
        .map_err(|e| AppError::store(format!("Failed to create table `{table}`: {e}")))?;

        {
            let placeholders: Vec<String> = (1..=output.columns.len()).map(|i| format!("?{i}")).collect();
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO {} VALUES ({})",
                    quote_ident(table),
                    placeholders.join(", ")
                ))
                .map_err(|e| AppError::store(format!("Failed to prepare insert: {e}")))?;

            for record in &output.records {
                let cells = output.columns.iter().map(|name| record.get(name));
                stmt.execute(params_from_iter(cells))
                    .map_err(|e| AppError::store(format!("Failed to insert row: {e}")))?;
            }
        }

        tx.commit()
            .map_err(|e| AppError::store(format!("Failed to commit table `{table}`: {e}")))?;

        let written = output.records.len();
        info!(table, rows = written, "replaced table");
        Ok(written)
    }

    /// Run a read-only statement and collect every row.
    pub fn query(&self, sql: &str) -> Result<QueryResult, AppError> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| AppError::store(format!("Failed to prepare query: {e}")))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
        let width = columns.len();

        let mut rows = stmt
            .query([])
            .map_err(|e| AppError::store(format!("Failed to run query: {e}")))?;

        let mut out = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| AppError::store(format!("Failed to read query row: {e}")))?
        {
            let mut cells = Vec::with_capacity(width);
            for idx in 0..width {
                let value = row
                    .get_ref(idx)
                    .map_err(|e| AppError::store(format!("Failed to read column {idx}: {e}")))?;
                cells.push(cell_from_sql(value));
            }
            out.push(cells);
        }

        Ok(QueryResult { columns, rows: out })
    }
}

impl ToSql for Cell {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            Cell::Missing => Value::Null,
            Cell::Int(v) => Value::Integer(*v),
            Cell::Real(v) => Value::Real(*v),
            Cell::Bool(b) => Value::Integer(i64::from(*b)),
            Cell::Text(s) => return Ok(ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes()))),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

fn cell_from_sql(value: ValueRef<'_>) -> Cell {
    match value {
        ValueRef::Null => Cell::Missing,
        ValueRef::Integer(v) => Cell::Int(v),
        ValueRef::Real(v) => Cell::Real(v),
        ValueRef::Text(bytes) => Cell::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Cell::Text(format!("<{} bytes>", bytes.len())),
    }
}

/// SQLite declared type for a column, from the values it holds.
///
/// Integers and booleans give `INTEGER`, any float makes it `REAL`, any text
/// makes it `TEXT`. An all-missing column is `REAL`.
fn infer_sql_type(column: &str, records: &[NormalizedRecord]) -> &'static str {
    let mut saw_int = false;
    let mut saw_real = false;
    for record in records {
        match record.get(column) {
            Cell::Text(_) => return "TEXT",
            Cell::Real(_) => saw_real = true,
            Cell::Int(_) | Cell::Bool(_) => saw_int = true,
            Cell::Missing => {}
        }
    }
    if saw_int && !saw_real { "INTEGER" } else { "REAL" }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
