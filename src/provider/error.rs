use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single provider call.
///
/// These never propagate out of the aggregator; each one ends as a log line
/// and an empty region result.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("No WAQI API token configured")]
    MissingToken,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned HTTP {0}: {1}")]
    Status(StatusCode, String),

    #[error("Provider reported status '{0}'")]
    NotOk(String),

    #[error("Failed to decode provider response: {0}")]
    Decode(#[from] serde_json::Error),
}
