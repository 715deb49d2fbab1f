use crate::identifier::error::IdentifierError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse METAR JSON from {0}")]
    JsonParse(String, #[source] serde_json::Error),

    // A wire record whose station/time cannot be packed into an identifier
    #[error("Failed to derive identifier for station '{station}'")]
    Identifier {
        station: String,
        #[source]
        source: IdentifierError,
    },

    #[error("Invalid METAR record for station '{station}': {message}")]
    InvalidRecord { station: String, message: String },

    #[error("Record source failed: {0}")]
    Upstream(String),
}
