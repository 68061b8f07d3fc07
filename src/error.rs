use reqwest::StatusCode;
use thiserror::Error;

/// Why a provider read produced no payload.
///
/// Callers treat every variant the same way: the data could not be retrieved.
/// The variant only feeds the logs.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("request failed with status: {0}")]
    Status(StatusCode),
    #[error("response body is not a JSON object: {0}")]
    Decode(#[source] reqwest::Error),
}

/// A provider reply that decoded but lacks a structure the formatter needs.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("malformed {what} in provider response: {source}")]
    Malformed {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed {what} in provider response: expected {expected}")]
    UnexpectedShape {
        what: &'static str,
        expected: &'static str,
    },
}

impl PayloadError {
    pub fn malformed(what: &'static str) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| PayloadError::Malformed { what, source }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error: config: {0}")]
    Invalid(String),
}
