use crate::types::query::ConditionOperator;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Operator {operator} is not supported for attribute '{attribute}'")]
    UnsupportedOperator {
        attribute: String,
        operator: ConditionOperator,
    },

    #[error("Invalid operand for {operator} on attribute '{attribute}': {reason}")]
    InvalidOperand {
        attribute: String,
        operator: ConditionOperator,
        reason: String,
    },

    #[error("Unknown attribute '{attribute}'")]
    UnknownAttribute { attribute: String },

    #[error("Unsupported query shape: {0}")]
    UnsupportedQueryShape(String),
}

/// What to do with a condition that cannot be evaluated locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnsupportedOperatorPolicy {
    /// Skip the condition, leaving the record set unchanged, and report a [`Diagnostic`].
    #[default]
    FailOpen,
    /// Abort the query with an [`EvaluationError`].
    FailClosed,
}

/// A condition that was skipped under [`UnsupportedOperatorPolicy::FailOpen`].
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub attribute: String,
    pub operator: ConditionOperator,
    pub error: EvaluationError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "condition {} on '{}' skipped: {}",
            self.operator, self.attribute, self.error
        )
    }
}
