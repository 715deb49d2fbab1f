mod config;
mod error;
mod evaluate;
mod identifier;
mod provider;
mod source;
mod translate;
mod types;

pub use config::*;
pub use error::ProviderError;
pub use provider::*;

pub use identifier::codec::MetarId;
pub use identifier::error::IdentifierError;

pub use types::attributes;
pub use types::attributes::{AttributeKind, AttributeSchema};
pub use types::query::*;
pub use types::record::ObservationRecord;
pub use types::value::Value;

pub use translate::extract::extract_conditions;
pub use translate::observation_time::{translate_observation_time, TimeWindow};
pub use translate::request::{plan_request, RequestParams, RequestPlan, Translation};
pub use translate::station::translate_station;

pub use evaluate::combiner::{combine, normalize, NormalizedGroup, NormalizedQuery};
pub use evaluate::error::{Diagnostic, EvaluationError, UnsupportedOperatorPolicy};
pub use evaluate::evaluator::{EvaluationContext, LocalEvaluator};
pub use evaluate::predicate::{like_to_regex, Predicate, PredicateTable};

pub use source::batch::{fetch_region_batches, region_batches, BatchFailure, BatchedFetch};
pub use source::error::SourceError;
pub use source::http_source::{HttpRecordSource, DEFAULT_BASE_URL};
pub use source::memory::InMemorySource;
pub use source::metar_model::{parse_reports, CloudLayer, MetarReport, NumberOrString};
pub use source::record_source::RecordSource;
