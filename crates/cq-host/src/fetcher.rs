//! Stylesheet fetching for the reference host.

use cq_common::net::{FetchError, fetch_text};
use cq_core::Fetcher;

/// Fetches `http(s)` and `data:` URLs through [`fetch_text`], and `file:`
/// URLs from the local file system so fixtures can link sheets next to
/// them.
#[derive(Debug, Clone, Copy, Default)]
pub struct SheetFetcher;

impl Fetcher for SheetFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if let Some(path) = url.strip_prefix("file://") {
            return std::fs::read_to_string(path)
                .map_err(|e| FetchError::Request(format!("{path}: {e}")));
        }
        fetch_text(url)
    }
}
