//! Where snapshot tables come from: local files or HTTP(S) URLs.

use std::path::Path;

use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::error::AppError;

/// Locations of every table of one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources {
    pub main: String,
    pub tests: String,
    pub mortality: String,
    pub vaccination: Option<String>,
    /// CFR/CHR by vaccination status, passed through untouched.
    pub risk_tables: Vec<String>,
}

/// Reads table text from a path or a URL.
pub struct SourceReader {
    client: Option<Client>,
}

impl SourceReader {
    pub fn new() -> Self {
        Self { client: None }
    }

    pub fn read_text(&mut self, location: &str) -> Result<String, AppError> {
        if is_remote(location) {
            self.fetch(location)
        } else {
            debug!(path = location, "reading local table");
            std::fs::read_to_string(Path::new(location))
                .map_err(|e| AppError::input(format!("Failed to read '{location}': {e}")))
        }
    }

    fn fetch(&mut self, url: &str) -> Result<String, AppError> {
        let client = self.client.get_or_insert_with(Client::new);
        info!(url, "fetching table");

        let resp = client
            .get(url)
            .send()
            .map_err(|e| AppError::input(format!("Request for '{url}' failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(AppError::input(format!(
                "Request for '{url}' failed with status {}.",
                resp.status()
            )));
        }
        resp.text()
            .map_err(|e| AppError::input(format!("Failed to read response from '{url}': {e}")))
    }
}

impl Default for SourceReader {
    fn default() -> Self {
        Self::new()
    }
}

pub fn is_remote(location: &str) -> bool {
    let lower = location.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// File-name part of a location, used to name risk tables.
pub fn table_name(location: &str) -> String {
    let trimmed = location.trim_end_matches('/');
    let last = trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed);
    last.split('?')
        .next()
        .unwrap_or(last)
        .trim_end_matches(".csv")
        .to_string()
}
