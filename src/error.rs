use crate::evaluate::error::EvaluationError;
use crate::identifier::error::IdentifierError;
use crate::source::error::SourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error("Upstream fetch failed during {stage}")]
    UpstreamFetch {
        stage: &'static str,
        #[source]
        source: SourceError,
    },

    #[error("All {batches} region batch(es) failed")]
    AllBatchesFailed {
        batches: usize,
        #[source]
        last_error: Box<SourceError>,
    },

    #[error("Failed to set up the HTTP record source")]
    HttpClient(#[source] SourceError),

    #[error("Failed to parse provider configuration")]
    Config(#[source] serde_json::Error),
}
