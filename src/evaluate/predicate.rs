//! Operator dispatch for local evaluation.
//!
//! Every supported `(AttributeKind, ConditionOperator)` pair maps to a rule in
//! [`PredicateTable`]. Building a rule against a condition's operands validates them
//! once and yields a [`Predicate`] that is then run against every record.

use crate::evaluate::error::EvaluationError;
use crate::types::attributes::AttributeKind;
use crate::types::query::{Condition, ConditionOperator};
use crate::types::value::Value;
use chrono::{DateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Tests an attribute value. `None` means the record does not carry the attribute.
pub type Predicate = Box<dyn Fn(Option<&Value>) -> bool + Send + Sync>;

type Matcher = Box<dyn Fn(&Value) -> bool + Send + Sync>;
type MatcherBuilder = fn(&[Value]) -> Result<Matcher, String>;

#[derive(Clone, Copy)]
enum Rule {
    /// `Null` / `NotNull`.
    Presence { present: bool },
    /// Runs `build`'s matcher on non-null values. Negated rules invert the matcher
    /// and accept null values.
    Match { build: MatcherBuilder, negate: bool },
}

pub struct PredicateTable {
    rules: HashMap<(AttributeKind, ConditionOperator), Rule>,
}

impl PredicateTable {
    /// The operator support used for the METAR schema.
    pub fn standard() -> Self {
        use AttributeKind::*;
        use ConditionOperator::*;

        let mut table = PredicateTable {
            rules: HashMap::new(),
        };
        for kind in [Categorical, Text, Numeric, Timestamp] {
            table.presence(kind);
        }

        table.pair(Categorical, Equal, NotEqual, equal_text::<true>);
        table.pair(Categorical, In, NotIn, in_text::<true>);
        table.pair(Categorical, Like, NotLike, like::<true>);
        table.pair(Categorical, Contains, DoesNotContain, contains::<true>);
        table.pair(Categorical, BeginsWith, DoesNotBeginWith, begins_with::<true>);
        table.pair(Categorical, EndsWith, DoesNotEndWith, ends_with::<true>);

        table.pair(Text, Equal, NotEqual, equal_text::<false>);
        table.pair(Text, In, NotIn, in_text::<false>);
        table.pair(Text, Like, NotLike, like::<false>);
        table.pair(Text, Contains, DoesNotContain, contains::<false>);
        table.pair(Text, BeginsWith, DoesNotBeginWith, begins_with::<false>);
        table.pair(Text, EndsWith, DoesNotEndWith, ends_with::<false>);

        table.ordered::<Decimal>(Numeric);
        table.pair(Numeric, Like, NotLike, like::<false>);

        table.ordered::<DateTime<Utc>>(Timestamp);
        table.pair(Timestamp, Like, NotLike, like::<false>);

        table
    }

    pub fn supports(&self, kind: AttributeKind, operator: ConditionOperator) -> bool {
        self.rules.contains_key(&(kind, operator))
    }

    /// Builds the predicate for `condition` on an attribute of the given kind.
    ///
    /// # Errors
    ///
    /// [`EvaluationError::UnsupportedOperator`] if the pair has no rule,
    /// [`EvaluationError::InvalidOperand`] if the operands do not fit the operator.
    pub fn build(
        &self,
        kind: AttributeKind,
        condition: &Condition,
    ) -> Result<Predicate, EvaluationError> {
        let rule = self
            .rules
            .get(&(kind, condition.operator))
            .copied()
            .ok_or_else(|| EvaluationError::UnsupportedOperator {
                attribute: condition.attribute.clone(),
                operator: condition.operator,
            })?;

        match rule {
            Rule::Presence { present } => Ok(Box::new(move |value: Option<&Value>| {
                value.is_some_and(|v| !v.is_null()) == present
            })),
            Rule::Match { build, negate } => {
                let matcher =
                    build(&condition.values).map_err(|reason| EvaluationError::InvalidOperand {
                        attribute: condition.attribute.clone(),
                        operator: condition.operator,
                        reason,
                    })?;
                Ok(Box::new(move |value: Option<&Value>| match value {
                    None | Some(Value::Null) => negate,
                    Some(v) => matcher(v) != negate,
                }))
            }
        }
    }

    fn presence(&mut self, kind: AttributeKind) {
        self.rules.insert(
            (kind, ConditionOperator::Null),
            Rule::Presence { present: false },
        );
        self.rules.insert(
            (kind, ConditionOperator::NotNull),
            Rule::Presence { present: true },
        );
    }

    fn pair(
        &mut self,
        kind: AttributeKind,
        positive: ConditionOperator,
        negative: ConditionOperator,
        build: MatcherBuilder,
    ) {
        self.rules.insert(
            (kind, positive),
            Rule::Match {
                build,
                negate: false,
            },
        );
        self.rules.insert(
            (kind, negative),
            Rule::Match {
                build,
                negate: true,
            },
        );
    }

    fn ordered<T: Scalar>(&mut self, kind: AttributeKind) {
        use ConditionOperator::*;
        self.pair(kind, Equal, NotEqual, equal::<T>);
        self.pair(kind, In, NotIn, in_list::<T>);
        self.pair(kind, Between, NotBetween, between::<T>);
        for (operator, build) in [
            (GreaterThan, greater_than::<T> as MatcherBuilder),
            (GreaterEqual, greater_equal::<T>),
            (LessThan, less_than::<T>),
            (LessEqual, less_equal::<T>),
        ] {
            self.rules.insert(
                (kind, operator),
                Rule::Match {
                    build,
                    negate: false,
                },
            );
        }
    }
}

impl Default for PredicateTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Converts a SQL `LIKE` pattern into an anchored regular expression.
/// `%` matches any run of characters (newlines included). Every other character,
/// `_` included, matches itself.
pub fn like_to_regex(pattern: &str, case_insensitive: bool) -> Result<Regex, regex::Error> {
    let mut regex = String::with_capacity(pattern.len() * 2 + 8);
    regex.push_str(if case_insensitive { "(?si)^" } else { "(?s)^" });
    for c in pattern.chars() {
        match c {
            '%' => regex.push_str(".*"),
            _ => regex.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4]))),
        }
    }
    regex.push('$');
    Regex::new(&regex)
}

fn fold<const CASE_INSENSITIVE: bool>(text: &str) -> String {
    if CASE_INSENSITIVE {
        text.trim().to_lowercase()
    } else {
        text.to_string()
    }
}

fn single(values: &[Value]) -> Result<&Value, String> {
    match values {
        [value] if !value.is_null() => Ok(value),
        [_] => Err("operand is null".to_string()),
        _ => Err(format!("expected 1 operand, got {}", values.len())),
    }
}

fn text_operand<const CI: bool>(value: &Value) -> Result<String, String> {
    value
        .to_match_text()
        .map(|text| fold::<CI>(&text))
        .ok_or_else(|| "operand is null".to_string())
}

fn value_text<const CI: bool>(value: &Value) -> Option<String> {
    value.to_match_text().map(|text| fold::<CI>(&text))
}

fn equal_text<const CI: bool>(values: &[Value]) -> Result<Matcher, String> {
    let expected = text_operand::<CI>(single(values)?)?;
    Ok(Box::new(move |v: &Value| {
        value_text::<CI>(v).is_some_and(|t| t == expected)
    }))
}

fn in_text<const CI: bool>(values: &[Value]) -> Result<Matcher, String> {
    if values.is_empty() {
        return Err("expected at least 1 operand".to_string());
    }
    let expected = values
        .iter()
        .map(text_operand::<CI>)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Box::new(move |v: &Value| {
        value_text::<CI>(v).is_some_and(|t| expected.contains(&t))
    }))
}

fn contains<const CI: bool>(values: &[Value]) -> Result<Matcher, String> {
    let needle = text_operand::<CI>(single(values)?)?;
    Ok(Box::new(move |v: &Value| {
        value_text::<CI>(v).is_some_and(|t| t.contains(needle.as_str()))
    }))
}

fn begins_with<const CI: bool>(values: &[Value]) -> Result<Matcher, String> {
    let prefix = text_operand::<CI>(single(values)?)?;
    Ok(Box::new(move |v: &Value| {
        value_text::<CI>(v).is_some_and(|t| t.starts_with(prefix.as_str()))
    }))
}

fn ends_with<const CI: bool>(values: &[Value]) -> Result<Matcher, String> {
    let suffix = text_operand::<CI>(single(values)?)?;
    Ok(Box::new(move |v: &Value| {
        value_text::<CI>(v).is_some_and(|t| t.ends_with(suffix.as_str()))
    }))
}

fn like<const CI: bool>(values: &[Value]) -> Result<Matcher, String> {
    let pattern = single(values)?
        .as_text()
        .ok_or_else(|| "LIKE pattern must be text".to_string())?;
    let regex = like_to_regex(pattern, CI).map_err(|e| e.to_string())?;
    Ok(Box::new(move |v: &Value| {
        v.to_match_text().is_some_and(|t| {
            if CI {
                regex.is_match(t.trim())
            } else {
                regex.is_match(&t)
            }
        })
    }))
}

/// Values that can be compared with ordering operators.
trait Scalar: PartialOrd + Copy + Send + Sync + 'static {
    const NAME: &'static str;
    fn from_value(value: &Value) -> Option<Self>;
}

impl Scalar for Decimal {
    const NAME: &'static str = "number";
    fn from_value(value: &Value) -> Option<Self> {
        value.as_decimal()
    }
}

impl Scalar for DateTime<Utc> {
    const NAME: &'static str = "timestamp";
    fn from_value(value: &Value) -> Option<Self> {
        value.as_timestamp()
    }
}

fn scalar<T: Scalar>(value: &Value) -> Result<T, String> {
    T::from_value(value).ok_or_else(|| format!("'{}' is not a {}", value, T::NAME))
}

fn compare<T: Scalar>(values: &[Value], test: fn(&T, &T) -> bool) -> Result<Matcher, String> {
    let operand = scalar::<T>(single(values)?)?;
    Ok(Box::new(move |v: &Value| {
        T::from_value(v).is_some_and(|x| test(&x, &operand))
    }))
}

fn equal<T: Scalar>(values: &[Value]) -> Result<Matcher, String> {
    compare::<T>(values, |a, b| a == b)
}

fn greater_than<T: Scalar>(values: &[Value]) -> Result<Matcher, String> {
    compare::<T>(values, |a, b| a > b)
}

fn greater_equal<T: Scalar>(values: &[Value]) -> Result<Matcher, String> {
    compare::<T>(values, |a, b| a >= b)
}

fn less_than<T: Scalar>(values: &[Value]) -> Result<Matcher, String> {
    compare::<T>(values, |a, b| a < b)
}

fn less_equal<T: Scalar>(values: &[Value]) -> Result<Matcher, String> {
    compare::<T>(values, |a, b| a <= b)
}

fn in_list<T: Scalar>(values: &[Value]) -> Result<Matcher, String> {
    if values.is_empty() {
        return Err("expected at least 1 operand".to_string());
    }
    let expected = values
        .iter()
        .map(scalar::<T>)
        .collect::<Result<Vec<T>, _>>()?;
    Ok(Box::new(move |v: &Value| {
        T::from_value(v).is_some_and(|x| expected.contains(&x))
    }))
}

fn between<T: Scalar>(values: &[Value]) -> Result<Matcher, String> {
    let [low, high] = values else {
        return Err(format!("expected 2 operands, got {}", values.len()));
    };
    let (low, high) = (scalar::<T>(low)?, scalar::<T>(high)?);
    Ok(Box::new(move |v: &Value| {
        T::from_value(v).is_some_and(|x| x >= low && x <= high)
    }))
}
