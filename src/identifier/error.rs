use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// The station code or timestamp cannot be packed into an identifier.
    #[error("Invalid identifier input: {0}")]
    InvalidArgument(String),

    /// The identifier bytes do not spell a station code followed by a `YYYYMMDDHHmm` timestamp.
    #[error("Identifier '{id}' is not a station/time identifier: {reason}")]
    InvalidFormat { id: String, reason: String },
}
