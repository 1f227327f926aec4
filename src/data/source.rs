//! HTTP source for the borrower CSV export.

use reqwest::StatusCode;
use reqwest::blocking::Client;
use tracing::info;

use crate::error::AppError;

pub struct SourceClient {
    client: Client,
}

impl SourceClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// GET `url` and return the body as text.
    ///
    /// Only `200 OK` counts as success; any other status is a fetch failure.
    pub fn fetch_csv(&self, url: &str) -> Result<String, AppError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| AppError::fetch(format!("Error: Unable to download the CSV file ({e}).")))?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(AppError::fetch(format!(
                "Error: Unable to download the CSV file (status {status})."
            )));
        }

        let body = resp
            .text()
            .map_err(|e| AppError::fetch(format!("Failed to read CSV response body: {e}")))?;
        info!(bytes = body.len(), "downloaded borrower CSV");
        Ok(body)
    }
}

impl Default for SourceClient {
    fn default() -> Self {
        Self::new()
    }
}
