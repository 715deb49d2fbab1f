//! Provider configuration, built in code through [`ProviderConfig::builder`] or
//! loaded from JSON with [`ProviderConfig::from_json`].

use crate::error::ProviderError;
use crate::evaluate::error::UnsupportedOperatorPolicy;
use crate::source::http_source::DEFAULT_BASE_URL;
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// US state (plus DC) codes queried as `@xx` regions when a query has no station filter.
pub const US_REGION_CODES: [&str; 51] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN",
    "IA", "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH",
    "NJ", "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT",
    "VT", "VA", "WA", "WV", "WI", "WY",
];

pub const DEFAULT_REGION_BATCH_SIZE: usize = 10;
pub const DEFAULT_MAX_CONCURRENT_BATCHES: usize = 4;

fn default_region_codes() -> Vec<String> {
    US_REGION_CODES.iter().map(|code| code.to_string()).collect()
}

/// Settings of a [`crate::MetarProvider`].
///
/// # Examples
///
/// ```
/// use metar_provider::{ProviderConfig, UnsupportedOperatorPolicy};
///
/// let config = ProviderConfig::builder()
///     .region_codes(vec!["GA".to_string(), "FL".to_string()])
///     .unsupported_operator_policy(UnsupportedOperatorPolicy::FailClosed)
///     .build();
/// assert_eq!(config.region_batch_size, 10);
///
/// let from_json = ProviderConfig::from_json(r#"{"max_concurrent_batches": 1}"#).unwrap();
/// assert_eq!(from_json.region_codes.len(), 51);
/// ```
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// METAR endpoint of the aviationweather.gov data API.
    #[builder(default = DEFAULT_BASE_URL.to_string(), into)]
    pub base_url: String,
    #[builder(default = default_region_codes())]
    pub region_codes: Vec<String>,
    /// Regions per batched request.
    #[builder(default = DEFAULT_REGION_BATCH_SIZE)]
    pub region_batch_size: usize,
    #[builder(default = DEFAULT_MAX_CONCURRENT_BATCHES)]
    pub max_concurrent_batches: usize,
    #[builder(default)]
    pub unsupported_operator_policy: UnsupportedOperatorPolicy,
    /// HTTP request timeout. No timeout when unset.
    pub request_timeout_secs: Option<u64>,
}

impl ProviderConfig {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ProviderError> {
        serde_json::from_str(json).map_err(ProviderError::Config)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::default();
        assert_eq!(config.base_url, "https://aviationweather.gov/api/data/metar");
        assert_eq!(config.region_codes.len(), 51);
        assert!(config.region_codes.contains(&"DC".to_string()));
        assert_eq!(config.region_batch_size, 10);
        assert_eq!(config.max_concurrent_batches, 4);
        assert_eq!(
            config.unsupported_operator_policy,
            UnsupportedOperatorPolicy::FailOpen
        );
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn test_from_json_overrides() {
        let config = ProviderConfig::from_json(
            r#"{
                "base_url": "http://localhost:8080/metar",
                "region_batch_size": 5,
                "unsupported_operator_policy": "FailClosed",
                "request_timeout_secs": 30
            }"#,
        )
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:8080/metar");
        assert_eq!(config.region_batch_size, 5);
        assert_eq!(config.max_concurrent_batches, 4);
        assert_eq!(
            config.unsupported_operator_policy,
            UnsupportedOperatorPolicy::FailClosed
        );
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            ProviderConfig::from_json("[1, 2]"),
            Err(ProviderError::Config(_))
        ));
    }
}
