//! Region batched fetching for queries without a station filter.
//!
//! The METAR API does not answer unfiltered requests, so such queries are split into
//! requests for groups of `@xx` region tokens that run concurrently.

use crate::identifier::codec::MetarId;
use crate::source::error::SourceError;
use crate::source::record_source::RecordSource;
use crate::translate::request::RequestParams;
use crate::types::record::ObservationRecord;
use futures_util::stream::{self, StreamExt};
use log::{info, warn};
use std::collections::HashSet;

/// A region batch that could not be fetched.
#[derive(Debug)]
pub struct BatchFailure {
    /// The `@xx,@yy,...` station list of the batch.
    pub station_list: String,
    pub error: SourceError,
}

#[derive(Debug, Default)]
pub struct BatchedFetch {
    /// Records of all successful batches in batch order, without duplicates.
    pub records: Vec<ObservationRecord>,
    pub failures: Vec<BatchFailure>,
    pub batches: usize,
}

impl BatchedFetch {
    pub fn all_failed(&self) -> bool {
        self.batches > 0 && self.failures.len() == self.batches
    }
}

/// Splits region codes into comma separated `@xx` station lists of at most
/// `batch_size` regions each.
pub fn region_batches(region_codes: &[String], batch_size: usize) -> Vec<String> {
    region_codes
        .chunks(batch_size.max(1))
        .map(|chunk| {
            chunk
                .iter()
                .map(|code| format!("@{}", code.trim().to_lowercase()))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect()
}

/// Fetches every region batch with the remaining `params` applied, running at most
/// `max_concurrent` requests at once. A failing batch is recorded and does not stop
/// the others.
pub async fn fetch_region_batches<S: RecordSource>(
    source: &S,
    params: &RequestParams,
    region_codes: &[String],
    batch_size: usize,
    max_concurrent: usize,
) -> BatchedFetch {
    let batches = region_batches(region_codes, batch_size);
    info!(
        "Fetching {} region batch(es), {} at a time",
        batches.len(),
        max_concurrent.max(1)
    );

    let results: Vec<_> = stream::iter(batches.into_iter().map(|station_list| {
        let batch_params = params.with_station_list(station_list.clone());
        async move {
            let result = source.fetch(&batch_params).await;
            (station_list, result)
        }
    }))
    .buffered(max_concurrent.max(1))
    .collect()
    .await;

    let mut fetched = BatchedFetch {
        batches: results.len(),
        ..Default::default()
    };
    let mut seen: HashSet<MetarId> = HashSet::new();
    for (station_list, result) in results {
        match result {
            Ok(records) => fetched
                .records
                .extend(records.into_iter().filter(|r| seen.insert(r.id))),
            Err(error) => {
                warn!("Region batch '{}' failed: {}", station_list, error);
                fetched.failures.push(BatchFailure {
                    station_list,
                    error,
                });
            }
        }
    }
    fetched
}
