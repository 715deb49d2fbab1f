//! Upstream request parameters and the planning step that derives them from a query.

use crate::translate::extract::extract_conditions;
use crate::translate::observation_time::{translate_observation_time, TimeWindow};
use crate::translate::station::translate_station;
use crate::types::attributes::{OBSERVATION_TIME, STATION};
use crate::types::query::{Condition, Query};
use chrono::{DateTime, Utc};
use log::debug;

pub(crate) const TIME_PARAM_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
pub(crate) const DATE_PARAM_FORMAT: &str = "%Y%m%d_%H%M%SZ";

/// The result of translating the conditions of one attribute.
///
/// `fragment` is the request parameter value, if any condition could be pushed
/// upstream. `unhandled` holds the conditions that have to be evaluated locally.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation<T> {
    pub fragment: Option<T>,
    pub unhandled: Vec<Condition>,
}

impl<T> Default for Translation<T> {
    fn default() -> Self {
        Self {
            fragment: None,
            unhandled: Vec::new(),
        }
    }
}

/// Filter parameters understood by the METAR endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    /// Comma separated station ids, or `@xx` region tokens.
    pub station_list: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Point in time lookup, used when retrieving a single observation.
    pub date: Option<DateTime<Utc>>,
}

impl RequestParams {
    pub fn with_station_list(&self, station_list: String) -> Self {
        Self {
            station_list: Some(station_list),
            ..self.clone()
        }
    }

    /// Renders the parameters as `(name, value)` pairs, leaving out unset ones.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(ids) = &self.station_list {
            pairs.push(("ids", ids.clone()));
        }
        if let Some(start) = self.start_time {
            pairs.push(("startTime", start.format(TIME_PARAM_FORMAT).to_string()));
        }
        if let Some(end) = self.end_time {
            pairs.push(("endTime", end.format(TIME_PARAM_FORMAT).to_string()));
        }
        if let Some(date) = self.date {
            pairs.push(("date", date.format(DATE_PARAM_FORMAT).to_string()));
        }
        pairs
    }
}

/// What to ask the upstream for, and which pushdown conditions it could not take.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestPlan {
    pub params: RequestParams,
    pub residuals: Vec<Condition>,
}

/// Runs the station and observation time translators over `query`.
pub fn plan_request(query: &Query) -> RequestPlan {
    let station = translate_station(&extract_conditions(query, STATION));
    let time = translate_observation_time(&extract_conditions(query, OBSERVATION_TIME));

    let TimeWindow { start, end } = time.fragment.unwrap_or_default();
    let params = RequestParams {
        station_list: station.fragment,
        start_time: start,
        end_time: end,
        date: None,
    };

    let mut residuals = station.unhandled;
    residuals.extend(time.unhandled);
    debug!(
        "Planned request {:?} with {} residual condition(s)",
        params.to_query_pairs(),
        residuals.len()
    );
    RequestPlan { params, residuals }
}
