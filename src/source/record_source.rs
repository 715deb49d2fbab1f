use crate::source::error::SourceError;
use crate::translate::request::RequestParams;
use crate::types::record::ObservationRecord;
use std::future::Future;

/// Something that can fetch METAR observations for a set of request parameters.
///
/// [`crate::HttpRecordSource`] talks to aviationweather.gov,
/// [`crate::InMemorySource`] serves a fixed set of records.
pub trait RecordSource: Send + Sync {
    fn fetch(
        &self,
        params: &RequestParams,
    ) -> impl Future<Output = Result<Vec<ObservationRecord>, SourceError>> + Send;
}
