//! This module provides the main entry point of the crate, [`MetarProvider`].
//! It answers declarative queries over live METAR observations by pushing what it
//! can upstream and evaluating everything else locally.

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::evaluate::combiner::{combine, normalize};
use crate::evaluate::error::{Diagnostic, UnsupportedOperatorPolicy};
use crate::evaluate::evaluator::{EvaluationContext, LocalEvaluator};
use crate::identifier::codec::MetarId;
use crate::source::batch::{fetch_region_batches, BatchFailure};
use crate::source::http_source::HttpRecordSource;
use crate::source::record_source::RecordSource;
use crate::translate::request::{plan_request, RequestParams};
use crate::types::query::Query;
use crate::types::record::ObservationRecord;
use bon::bon;
use log::{debug, info};

/// The result of [`MetarProvider::retrieve_multiple`].
#[derive(Debug, Default)]
pub struct QueryOutcome {
    /// Matching observations in fetch order, each identifier at most once.
    pub records: Vec<ObservationRecord>,
    /// Conditions skipped under [`UnsupportedOperatorPolicy::FailOpen`].
    pub diagnostics: Vec<Diagnostic>,
    /// Region batches that failed while others succeeded.
    pub failed_batches: Vec<BatchFailure>,
}

/// Queries METAR observations as if they were a stored table.
///
/// Create an instance with [`MetarProvider::new()`] to query aviationweather.gov with
/// the default [`ProviderConfig`], [`MetarProvider::with_config()`] to change it, or
/// [`MetarProvider::with_source()`] to query any other [`RecordSource`].
///
/// # Examples
///
/// ```rust
/// # use metar_provider::{Condition, InMemorySource, MetarProvider, ProviderConfig, ProviderError, Query};
/// # async fn run() -> Result<(), ProviderError> {
/// let provider = MetarProvider::with_source(InMemorySource::new(Vec::new()), ProviderConfig::default());
/// let query = Query::and().with_condition(Condition::equal("station", "KATL"));
/// let outcome = provider.retrieve_multiple(&query).call().await?;
/// assert!(outcome.records.is_empty());
/// # Ok(())
/// # }
/// ```
pub struct MetarProvider<S = HttpRecordSource> {
    source: S,
    config: ProviderConfig,
    evaluator: LocalEvaluator,
}

impl MetarProvider<HttpRecordSource> {
    /// Creates a provider for aviationweather.gov with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::HttpClient`] if the HTTP client cannot be built.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use metar_provider::{Condition, MetarProvider, ProviderError, Query};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), ProviderError> {
    /// let provider = MetarProvider::new()?;
    /// let query = Query::and().with_condition(Condition::in_list("station", ["KATL", "KJFK"]));
    /// let outcome = provider.retrieve_multiple(&query).call().await?;
    /// for record in &outcome.records {
    ///     println!("{} {:?}", record.id, record.get("raw_text"));
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_config(ProviderConfig::default())
    }

    /// Creates a provider that fetches over HTTP using `config`.
    pub fn with_config(config: ProviderConfig) -> Result<Self, ProviderError> {
        let source = HttpRecordSource::new(&config.base_url, config.request_timeout())
            .map_err(ProviderError::HttpClient)?;
        Ok(Self::with_source(source, config))
    }
}

#[bon]
impl<S: RecordSource> MetarProvider<S> {
    pub fn with_source(source: S, config: ProviderConfig) -> Self {
        Self {
            source,
            config,
            evaluator: LocalEvaluator::metar(),
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Runs a declarative query.
    ///
    /// Station and observation time conditions are translated into upstream request
    /// parameters where possible. When no station filter applies, the configured
    /// regions are fetched in concurrent batches. All conditions are then evaluated
    /// locally on the fetched records and groups are combined with AND/OR semantics.
    ///
    /// # Arguments (Initial Builder Method)
    ///
    /// * `query` - The [`Query`] to run. It is never modified.
    ///
    /// # Optional Builder Methods
    ///
    /// * `.policy(UnsupportedOperatorPolicy)`: Overrides the configured
    ///   [`UnsupportedOperatorPolicy`] for this call.
    ///
    /// # Returns
    ///
    /// After `.call().await`, a [`QueryOutcome`] with the matching records, the
    /// diagnostics of skipped conditions and any failed region batches.
    ///
    /// # Errors
    ///
    /// * [`ProviderError::Evaluation`] for nested groups, or for unsupported
    ///   operators and invalid operands under the fail-closed policy.
    /// * [`ProviderError::UpstreamFetch`] if a single (non batched) request fails.
    /// * [`ProviderError::AllBatchesFailed`] if every region batch fails.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use metar_provider::*;
    /// # async fn run(provider: MetarProvider<InMemorySource>) -> Result<(), ProviderError> {
    /// let query = Query::and()
    ///     .with_condition(Condition::equal("station", "KATL"))
    ///     .with_group(
    ///         FilterGroup::and()
    ///             .with_condition(Condition::single("visibility_statute_mi", ConditionOperator::GreaterEqual, 3))
    ///             .with_condition(Condition::single("wx_string", ConditionOperator::Contains, "RA")),
    ///     );
    /// let outcome = provider
    ///     .retrieve_multiple(&query)
    ///     .policy(UnsupportedOperatorPolicy::FailClosed)
    ///     .call()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    #[builder(start_fn = retrieve_multiple)]
    #[doc(hidden)]
    pub async fn build_retrieve_multiple(
        &self,
        #[builder(start_fn)] query: &Query,
        policy: Option<UnsupportedOperatorPolicy>,
    ) -> Result<QueryOutcome, ProviderError> {
        let normalized = normalize(query)?;
        let plan = plan_request(query);
        let (records, failed_batches) = self.fetch(&plan.params).await?;
        let fetched = records.len();

        let mut context =
            EvaluationContext::new(policy.unwrap_or(self.config.unsupported_operator_policy));
        let records = combine(records, &normalized, &self.evaluator, &mut context)?;
        info!(
            "Query matched {} of {} fetched METAR(s), {} diagnostic(s), {} failed batch(es)",
            records.len(),
            fetched,
            context.diagnostics().len(),
            failed_batches.len()
        );
        Ok(QueryOutcome {
            records,
            diagnostics: context.into_diagnostics(),
            failed_batches,
        })
    }

    /// Looks up a single observation by its identifier.
    ///
    /// The identifier is decoded into station and observation time, which are sent
    /// upstream as a point in time request. Returns `None` when the upstream has no
    /// observation with exactly this identifier.
    ///
    /// # Errors
    ///
    /// * [`ProviderError::Identifier`] if `id` is not a METAR identifier.
    /// * [`ProviderError::UpstreamFetch`] if the request fails.
    pub async fn retrieve(&self, id: MetarId) -> Result<Option<ObservationRecord>, ProviderError> {
        let (station, time) = id.decode()?;
        let params = RequestParams {
            station_list: Some(station),
            date: Some(time),
            ..Default::default()
        };
        let records = self
            .source
            .fetch(&params)
            .await
            .map_err(|source| ProviderError::UpstreamFetch {
                stage: "single observation lookup",
                source,
            })?;
        debug!("Lookup of {} returned {} candidate(s)", id, records.len());
        Ok(records.into_iter().find(|record| record.id == id))
    }

    async fn fetch(
        &self,
        params: &RequestParams,
    ) -> Result<(Vec<ObservationRecord>, Vec<BatchFailure>), ProviderError> {
        if params.station_list.is_some() || self.config.region_codes.is_empty() {
            let records =
                self.source
                    .fetch(params)
                    .await
                    .map_err(|source| ProviderError::UpstreamFetch {
                        stage: "station request",
                        source,
                    })?;
            return Ok((records, Vec::new()));
        }

        let mut fetched = fetch_region_batches(
            &self.source,
            params,
            &self.config.region_codes,
            self.config.region_batch_size,
            self.config.max_concurrent_batches,
        )
        .await;

        if fetched.all_failed() {
            if let Some(last) = fetched.failures.pop() {
                return Err(ProviderError::AllBatchesFailed {
                    batches: fetched.batches,
                    last_error: Box::new(last.error),
                });
            }
        }
        Ok((fetched.records, fetched.failures))
    }
}
