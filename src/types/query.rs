//! The declarative query tree callers hand to [`crate::MetarProvider::retrieve_multiple`].
//!
//! A query is a top-level logical operator, a list of bare conditions and zero or
//! more filter groups. Groups carry their own operator and may in principle nest,
//! but only one level of groups is evaluated.

use crate::types::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

/// Comparison operator of a single [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterEqual,
    LessThan,
    LessEqual,
    Like,
    NotLike,
    In,
    NotIn,
    Between,
    NotBetween,
    Null,
    NotNull,
    Contains,
    DoesNotContain,
    BeginsWith,
    DoesNotBeginWith,
    EndsWith,
    DoesNotEndWith,
}

impl ConditionOperator {
    pub const ALL: [ConditionOperator; 20] = [
        ConditionOperator::Equal,
        ConditionOperator::NotEqual,
        ConditionOperator::GreaterThan,
        ConditionOperator::GreaterEqual,
        ConditionOperator::LessThan,
        ConditionOperator::LessEqual,
        ConditionOperator::Like,
        ConditionOperator::NotLike,
        ConditionOperator::In,
        ConditionOperator::NotIn,
        ConditionOperator::Between,
        ConditionOperator::NotBetween,
        ConditionOperator::Null,
        ConditionOperator::NotNull,
        ConditionOperator::Contains,
        ConditionOperator::DoesNotContain,
        ConditionOperator::BeginsWith,
        ConditionOperator::DoesNotBeginWith,
        ConditionOperator::EndsWith,
        ConditionOperator::DoesNotEndWith,
    ];

    /// Negated operators also match records where the attribute is null.
    pub fn is_negated(&self) -> bool {
        matches!(
            self,
            ConditionOperator::NotEqual
                | ConditionOperator::NotLike
                | ConditionOperator::NotIn
                | ConditionOperator::NotBetween
                | ConditionOperator::DoesNotContain
                | ConditionOperator::DoesNotBeginWith
                | ConditionOperator::DoesNotEndWith
        )
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A single `attribute <operator> values` test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub attribute: String,
    pub operator: ConditionOperator,
    #[serde(default)]
    pub values: Vec<Value>,
}

impl Condition {
    pub fn new(attribute: &str, operator: ConditionOperator, values: Vec<Value>) -> Self {
        Self {
            attribute: attribute.to_string(),
            operator,
            values,
        }
    }

    pub fn equal(attribute: &str, value: impl Into<Value>) -> Self {
        Self::new(attribute, ConditionOperator::Equal, vec![value.into()])
    }

    pub fn in_list<V: Into<Value>>(attribute: &str, values: impl IntoIterator<Item = V>) -> Self {
        Self::new(
            attribute,
            ConditionOperator::In,
            values.into_iter().map(Into::into).collect(),
        )
    }

    pub fn between(attribute: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::new(
            attribute,
            ConditionOperator::Between,
            vec![low.into(), high.into()],
        )
    }

    pub fn like(attribute: &str, pattern: &str) -> Self {
        Self::new(attribute, ConditionOperator::Like, vec![pattern.into()])
    }

    pub fn is_null(attribute: &str) -> Self {
        Self::new(attribute, ConditionOperator::Null, Vec::new())
    }

    /// Shorthand for any single operand operator.
    pub fn single(attribute: &str, operator: ConditionOperator, value: impl Into<Value>) -> Self {
        Self::new(attribute, operator, vec![value.into()])
    }
}

/// A group of conditions combined by one logical operator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterGroup {
    #[serde(default)]
    pub operator: LogicalOperator,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Nested groups are accepted on input but rejected during evaluation.
    #[serde(default)]
    pub groups: Vec<FilterGroup>,
}

impl FilterGroup {
    pub fn new(operator: LogicalOperator) -> Self {
        Self {
            operator,
            ..Default::default()
        }
    }

    pub fn and() -> Self {
        Self::new(LogicalOperator::And)
    }

    pub fn or() -> Self {
        Self::new(LogicalOperator::Or)
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_group(mut self, group: FilterGroup) -> Self {
        self.groups.push(group);
        self
    }
}

/// The full query tree.
///
/// # Examples
///
/// ```
/// use metar_provider::{Condition, ConditionOperator, FilterGroup, Query};
///
/// // METARs from Atlanta or JFK where it is raining.
/// let query = Query::and()
///     .with_condition(Condition::in_list("station", ["KATL", "KJFK"]))
///     .with_group(
///         FilterGroup::and()
///             .with_condition(Condition::single("wx_string", ConditionOperator::Contains, "RA")),
///     );
/// assert_eq!(query.groups.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Query {
    #[serde(default)]
    pub operator: LogicalOperator,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub groups: Vec<FilterGroup>,
}

impl Query {
    pub fn new(operator: LogicalOperator) -> Self {
        Self {
            operator,
            ..Default::default()
        }
    }

    pub fn and() -> Self {
        Self::new(LogicalOperator::And)
    }

    pub fn or() -> Self {
        Self::new(LogicalOperator::Or)
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_group(mut self, group: FilterGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.groups.is_empty()
    }
}
