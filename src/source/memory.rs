//! A [`RecordSource`] over a fixed set of records.
//!
//! It applies the same filters the upstream API does (station ids, `@xx` region
//! tokens, time range), records every request it receives and can be told to fail
//! for chosen station lists. Tests and benchmarks use it in place of
//! [`crate::HttpRecordSource`].

use crate::source::error::SourceError;
use crate::source::record_source::RecordSource;
use crate::translate::request::RequestParams;
use crate::types::attributes::{OBSERVATION_TIME, STATION};
use crate::types::record::ObservationRecord;
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct InMemorySource {
    records: Vec<ObservationRecord>,
    /// Region code (without `@`) -> upper case station codes.
    regions: HashMap<String, HashSet<String>>,
    /// Requests whose station list contains one of these tokens fail.
    failing_tokens: HashSet<String>,
    fail_everything: bool,
    requests: Mutex<Vec<RequestParams>>,
}

impl InMemorySource {
    pub fn new(records: Vec<ObservationRecord>) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }

    /// Makes `@{region}` resolve to `stations`.
    pub fn with_region(mut self, region: &str, stations: &[&str]) -> Self {
        self.regions.insert(
            region.to_uppercase(),
            stations.iter().map(|s| s.to_uppercase()).collect(),
        );
        self
    }

    /// Fails every request whose station list contains `token` (a station code or `@xx`).
    pub fn failing_for(mut self, token: &str) -> Self {
        self.failing_tokens.insert(token.to_uppercase());
        self
    }

    pub fn failing_always(mut self) -> Self {
        self.fail_everything = true;
        self
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<RequestParams> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn wanted_stations(&self, station_list: &str) -> HashSet<String> {
        station_list
            .split(',')
            .map(|token| token.trim().to_uppercase())
            .flat_map(|token| match token.strip_prefix('@') {
                Some(region) => self.regions.get(region).cloned().unwrap_or_default(),
                None => HashSet::from([token]),
            })
            .collect()
    }

    fn matches_time(record: &ObservationRecord, params: &RequestParams) -> bool {
        let Some(time) = record
            .get(OBSERVATION_TIME)
            .and_then(|value| value.as_timestamp())
        else {
            return params.start_time.is_none()
                && params.end_time.is_none()
                && params.date.is_none();
        };
        let after = |bound: Option<DateTime<Utc>>| bound.map_or(true, |b| time >= b);
        let before = |bound: Option<DateTime<Utc>>| bound.map_or(true, |b| time <= b);
        after(params.start_time) && before(params.end_time) && before(params.date)
    }
}

impl RecordSource for InMemorySource {
    async fn fetch(&self, params: &RequestParams) -> Result<Vec<ObservationRecord>, SourceError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(params.clone());
        }

        let station_list = params.station_list.as_deref().unwrap_or_default();
        let failing = self.fail_everything
            || station_list
                .split(',')
                .any(|token| self.failing_tokens.contains(&token.trim().to_uppercase()));
        if failing {
            return Err(SourceError::Upstream(format!(
                "injected failure for station list '{}'",
                station_list
            )));
        }

        let wanted = params
            .station_list
            .as_deref()
            .map(|list| self.wanted_stations(list));
        let records: Vec<_> = self
            .records
            .iter()
            .filter(|record| {
                wanted.as_ref().map_or(true, |wanted| {
                    record
                        .get(STATION)
                        .and_then(|value| value.as_text())
                        .is_some_and(|station| wanted.contains(&station.trim().to_uppercase()))
                })
            })
            .filter(|record| Self::matches_time(record, params))
            .cloned()
            .collect();
        debug!(
            "In-memory source served {} of {} record(s) for {:?}",
            records.len(),
            self.records.len(),
            params
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::codec::MetarId;
    use chrono::TimeZone;

    fn record(station: &str, hour: u32) -> ObservationRecord {
        let time = Utc.with_ymd_and_hms(2024, 5, 1, hour, 53, 0).unwrap();
        ObservationRecord::new(MetarId::encode(station, time).unwrap())
            .with(STATION, station)
            .with(OBSERVATION_TIME, time)
    }

    fn source() -> InMemorySource {
        InMemorySource::new(vec![record("KATL", 1), record("KJFK", 2), record("KATL", 3)])
            .with_region("ga", &["KATL"])
            .failing_for("@ny")
    }

    #[tokio::test]
    async fn test_filters_by_station_and_region() {
        let source = source();
        let by_id = RequestParams {
            station_list: Some("kjfk".to_string()),
            ..Default::default()
        };
        assert_eq!(source.fetch(&by_id).await.unwrap().len(), 1);

        let by_region = by_id.with_station_list("@GA,@CA".to_string());
        assert_eq!(source.fetch(&by_region).await.unwrap().len(), 2);

        assert_eq!(source.fetch(&RequestParams::default()).await.unwrap().len(), 3);
        assert_eq!(source.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_filters_by_time() {
        let params = RequestParams {
            start_time: Some(Utc.with_ymd_and_hms(2024, 5, 1, 2, 0, 0).unwrap()),
            end_time: Some(Utc.with_ymd_and_hms(2024, 5, 1, 3, 0, 0).unwrap()),
            ..Default::default()
        };
        let records = source().fetch(&params).await.unwrap();
        assert_eq!(records, vec![record("KJFK", 2)]);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let params = RequestParams {
            station_list: Some("@NJ,@NY".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            source().fetch(&params).await,
            Err(SourceError::Upstream(_))
        ));

        let always = InMemorySource::new(Vec::new()).failing_always();
        assert!(always.fetch(&RequestParams::default()).await.is_err());
        assert_eq!(always.requests().len(), 1);
    }
}
