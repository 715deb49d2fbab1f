use crate::source::error::SourceError;
use crate::source::metar_model::parse_reports;
use crate::source::record_source::RecordSource;
use crate::translate::request::RequestParams;
use crate::types::record::ObservationRecord;
use log::{info, warn};
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://aviationweather.gov/api/data/metar";

/// Fetches METARs from the aviationweather.gov data API.
///
/// Every request asks for JSON with the latest TAF attached (`format=json&taf=true`);
/// the filter parameters come from [`RequestParams`].
#[derive(Debug, Clone)]
pub struct HttpRecordSource {
    base_url: String,
    client: Client,
}

impl HttpRecordSource {
    /// Creates a source for `base_url` with an optional per request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::ClientBuild`] if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, SourceError> {
        let mut builder = Client::builder().gzip(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: builder.build().map_err(SourceError::ClientBuild)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn download(&self, params: &RequestParams) -> Result<(String, String), SourceError> {
        let mut query = params.to_query_pairs();
        query.push(("format", "json".to_string()));
        query.push(("taf", "true".to_string()));

        let request = self
            .client
            .get(&self.base_url)
            .query(&query)
            .build()
            .map_err(|e| SourceError::NetworkRequest(self.base_url.clone(), e))?;
        let url = request.url().to_string();
        info!("Downloading METARs from {}", url);

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| SourceError::NetworkRequest(url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    SourceError::HttpStatus {
                        url,
                        status,
                        source: e,
                    }
                } else {
                    SourceError::NetworkRequest(url, e)
                });
            }
        };

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::NetworkRequest(url.clone(), e))?;
        Ok((url, body))
    }
}

impl RecordSource for HttpRecordSource {
    async fn fetch(&self, params: &RequestParams) -> Result<Vec<ObservationRecord>, SourceError> {
        let (url, body) = self.download(params).await?;
        // The API answers a query without matches with an empty body.
        if body.trim().is_empty() {
            info!("No METARs returned from {}", url);
            return Ok(Vec::new());
        }

        let records = parse_reports(&body, &url)?
            .into_iter()
            .map(|report| report.into_record())
            .collect::<Result<Vec<_>, _>>()?;
        info!("Received {} METAR(s) from {}", records.len(), url);
        Ok(records)
    }
}
