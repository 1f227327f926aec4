//! Repayment-history classification.
//!
//! A history is a loosely quoted list of payment events, e.g.
//! `[{'Payment Date': '2023-04-01', 'Payment Mode': 'Delayed'}]`.
//! It is "good" unless some event dated before today was paid late.
//!
//! Classification fails closed: anything that cannot be read as a list of
//! dated events is classified as not good.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::Cell;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Payment mode tag. Only `Delayed` matters for classification; other tags
/// are kept as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentMode {
    Delayed,
    Other(String),
}

impl From<String> for PaymentMode {
    fn from(tag: String) -> Self {
        if tag == "Delayed" {
            PaymentMode::Delayed
        } else {
            PaymentMode::Other(tag)
        }
    }
}

/// One entry of a repayment history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    pub date: NaiveDate,
    pub mode: PaymentMode,
}

#[derive(Debug, Deserialize)]
struct EventRecord {
    #[serde(rename = "Payment Date")]
    date: String,
    #[serde(rename = "Payment Mode")]
    mode: String,
}

/// Parse history text into payment events.
pub fn parse_history(text: &str) -> Result<Vec<PaymentEvent>, String> {
    let normalized = text.replace('\'', "\"");
    let records: Vec<EventRecord> = serde_json::from_str(&normalized)
        .map_err(|e| format!("Invalid repayment history: {e}"))?;

    records
        .into_iter()
        .map(|record| {
            let date = NaiveDate::parse_from_str(&record.date, DATE_FORMAT)
                .map_err(|e| format!("Invalid payment date '{}': {e}", record.date))?;
            Ok(PaymentEvent {
                date,
                mode: PaymentMode::from(record.mode),
            })
        })
        .collect()
}

/// Classify a repayment-history cell as of `today`.
///
/// Returns `false` for non-text cells and for text that does not parse.
pub fn classify(history: &Cell, today: NaiveDate) -> bool {
    let Some(text) = history.as_text() else {
        return false;
    };
    match parse_history(text) {
        Ok(events) => !events
            .iter()
            .any(|event| event.date < today && event.mode == PaymentMode::Delayed),
        Err(_) => false,
    }
}
