//! Blocking fetch of stylesheet text.
//!
//! Linked stylesheets are fetched over HTTP(S) with a shared client
//! configuration, or decoded in place when they are `data:` URLs.

use std::time::Duration;

use base64::Engine;
use thiserror::Error;

/// User-Agent header sent with all requests.
const USER_AGENT: &str = concat!("cq/", env!("CARGO_PKG_VERSION"));

/// Default request timeout.
pub const TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised while fetching a resource.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    Client(String),
    /// The request could not be sent or timed out.
    #[error("request failed: {0}")]
    Request(String),
    /// The server answered with a non-success status.
    #[error("HTTP error: {0}")]
    Status(String),
    /// The response body could not be read or decoded.
    #[error("failed to read response body: {0}")]
    Body(String),
    /// The `data:` URL is malformed.
    #[error("invalid data URL: {0}")]
    DataUrl(String),
    /// The URL scheme is not supported by this fetcher.
    #[error("unsupported URL scheme in '{0}'")]
    UnsupportedScheme(String),
}

/// A parsed `data:` URL that can be decoded into text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl<'a> {
    /// Everything between `data:` and the first comma.
    pub metadata: &'a str,
    /// Everything after the first comma.
    pub payload: &'a str,
}

impl<'a> DataUrl<'a> {
    /// Split a raw `data:` URL into metadata and payload.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::DataUrl`] if the URL has no `data:` prefix or no comma.
    pub fn parse(raw: &'a str) -> Result<Self, FetchError> {
        let rest = raw
            .strip_prefix("data:")
            .ok_or_else(|| FetchError::DataUrl(format!("missing 'data:' prefix in '{raw}'")))?;
        let (metadata, payload) = rest
            .split_once(',')
            .ok_or_else(|| FetchError::DataUrl("missing comma".to_string()))?;
        Ok(Self { metadata, payload })
    }

    /// Decode the payload into UTF-8 text.
    ///
    /// Base64 payloads are decoded as such; anything else is percent-decoded.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::DataUrl`] if decoding fails or the bytes are not UTF-8.
    pub fn decode_text(&self) -> Result<String, FetchError> {
        let bytes = if self.metadata.ends_with(";base64") {
            base64::engine::general_purpose::STANDARD
                .decode(self.payload.trim())
                .map_err(|e| FetchError::DataUrl(format!("base64 decode error: {e}")))?
        } else {
            percent_decode(self.payload)
        };
        String::from_utf8(bytes).map_err(|e| FetchError::DataUrl(e.to_string()))
    }
}

/// Decode `%XX` sequences; malformed sequences are kept verbatim.
fn percent_decode(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let decoded = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(b) = decoded {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

/// Fetch a URL and return its body as text.
///
/// `data:` URLs are decoded locally; `http:` and `https:` URLs go through a
/// blocking client with [`TIMEOUT`].
///
/// # Errors
///
/// Returns a [`FetchError`] if the client cannot be created, the request
/// fails, the response has a non-success status, or the body cannot be decoded.
pub fn fetch_text(url: &str) -> Result<String, FetchError> {
    if url.starts_with("data:") {
        return DataUrl::parse(url)?.decode_text();
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(FetchError::UnsupportedScheme(url.to_string()));
    }

    let client = reqwest::blocking::Client::builder()
        .timeout(TIMEOUT)
        .build()
        .map_err(|e| FetchError::Client(e.to_string()))?;

    let response = client
        .get(url)
        .header("User-Agent", USER_AGENT)
        .send()
        .map_err(|e| FetchError::Request(e.to_string()))?;

    if !response.status().is_success() {
        return Err(FetchError::Status(response.status().to_string()));
    }

    response.text().map_err(|e| FetchError::Body(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_data_url() {
        // "a{b:c}"
        let text = fetch_text("data:text/css;base64,YXtiOmN9").unwrap();
        assert_eq!(text, "a{b:c}");
    }

    #[test]
    fn test_percent_encoded_data_url() {
        let text = fetch_text("data:text/css,.a%20%7B%20color%3A%20red%20%7D").unwrap();
        assert_eq!(text, ".a { color: red }");
    }

    #[test]
    fn test_data_url_without_comma() {
        assert!(matches!(
            fetch_text("data:text/css;base64"),
            Err(FetchError::DataUrl(_))
        ));
    }

    #[test]
    fn test_unsupported_scheme() {
        assert!(matches!(
            fetch_text("ftp://example.com/a.css"),
            Err(FetchError::UnsupportedScheme(_))
        ));
    }
}
