//! Defines [`Value`], the dynamically typed cell used both for attributes of an
//! [`crate::ObservationRecord`] and for the operands of a [`crate::Condition`].

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of decimal places numeric comparisons are rounded to.
pub(crate) const NUMERIC_SCALE: u32 = 4;

/// A single attribute value of an observation, or an operand of a condition.
///
/// Observations coming from the upstream API mix strings, integers, floating point
/// measurements and timestamps, so records are kept as flat maps of `Value`s rather
/// than as a fixed struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Attribute present but without a value.
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the text content of `Text` values.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interprets the value as a fixed precision decimal.
    ///
    /// Floats are rounded to [`NUMERIC_SCALE`] decimal places so that values like
    /// `0.1 + 0.2` compare equal to `0.3`. Text is parsed leniently: a trailing `+`
    /// (as in the `"10+"` visibility reported by the upstream API) is ignored.
    pub fn as_decimal(&self) -> Option<Decimal> {
        let decimal = match self {
            Value::Integer(i) => Decimal::from(*i),
            Value::Float(f) => Decimal::from_f64(*f)?,
            Value::Text(s) => Decimal::from_str(s.trim().trim_end_matches('+')).ok()?,
            Value::Null | Value::Timestamp(_) => return None,
        };
        Some(decimal.round_dp(NUMERIC_SCALE))
    }

    /// Interprets the value as a UTC timestamp. Text is accepted in RFC 3339 form
    /// or as `YYYY-MM-DD HH:MM:SS` (assumed UTC).
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            Value::Text(s) => parse_utc(s),
            _ => None,
        }
    }

    /// Renders the value the way it is matched by textual operators such as `Like`.
    pub fn to_match_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Text(s) => Some(s.clone()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Float(_) => self.as_decimal().map(|d| d.normalize().to_string()),
            Value::Timestamp(ts) => Some(ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
        }
    }
}

pub(crate) fn parse_utc(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::<FixedOffset>::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_match_text() {
            Some(text) => write!(f, "{}", text),
            None => write!(f, "null"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}
