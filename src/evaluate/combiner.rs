//! AND/OR semantics of filter groups over a fetched record set.

use crate::evaluate::error::EvaluationError;
use crate::evaluate::evaluator::{EvaluationContext, LocalEvaluator};
use crate::identifier::codec::MetarId;
use crate::types::query::{Condition, LogicalOperator, Query};
use crate::types::record::ObservationRecord;
use log::debug;
use std::collections::HashSet;

/// A query flattened to a single level of groups.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedQuery {
    /// Combines the group results.
    pub operator: LogicalOperator,
    pub groups: Vec<NormalizedGroup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedGroup {
    pub operator: LogicalOperator,
    pub conditions: Vec<Condition>,
}

/// Builds the [`NormalizedQuery`] for `query` without touching it.
///
/// Top-level conditions become a group of their own, using the query's operator.
/// Groups without conditions are dropped.
///
/// # Errors
///
/// [`EvaluationError::UnsupportedQueryShape`] if any group contains nested groups.
pub fn normalize(query: &Query) -> Result<NormalizedQuery, EvaluationError> {
    if let Some(index) = query
        .groups
        .iter()
        .position(|group| !group.groups.is_empty())
    {
        return Err(EvaluationError::UnsupportedQueryShape(format!(
            "filter group {} contains nested groups, only one level of groups is supported",
            index
        )));
    }

    let mut groups = Vec::with_capacity(query.groups.len() + 1);
    if !query.conditions.is_empty() {
        groups.push(NormalizedGroup {
            operator: query.operator,
            conditions: query.conditions.clone(),
        });
    }
    groups.extend(
        query
            .groups
            .iter()
            .filter(|group| !group.conditions.is_empty())
            .map(|group| NormalizedGroup {
                operator: group.operator,
                conditions: group.conditions.clone(),
            }),
    );

    Ok(NormalizedQuery {
        operator: query.operator,
        groups,
    })
}

/// Applies the groups of `query` to `records`.
///
/// Every condition is evaluated locally, including station and observation time
/// conditions that were also sent upstream. The result keeps fetch order and holds
/// each identifier at most once.
pub fn combine(
    records: Vec<ObservationRecord>,
    query: &NormalizedQuery,
    evaluator: &LocalEvaluator,
    context: &mut EvaluationContext,
) -> Result<Vec<ObservationRecord>, EvaluationError> {
    if query.groups.is_empty() {
        return Ok(dedup(records));
    }

    let mut matched: Option<HashSet<MetarId>> = None;
    for group in &query.groups {
        let ids = match group.operator {
            LogicalOperator::And => and_group(&records, &group.conditions, evaluator, context)?,
            LogicalOperator::Or => or_group(&records, &group.conditions, evaluator, context)?,
        };
        debug!(
            "{:?} group with {} condition(s) matched {} record(s)",
            group.operator,
            group.conditions.len(),
            ids.len()
        );
        matched = Some(match (matched, query.operator) {
            (None, _) => ids,
            (Some(acc), LogicalOperator::And) => acc.intersection(&ids).copied().collect(),
            (Some(mut acc), LogicalOperator::Or) => {
                acc.extend(ids);
                acc
            }
        });
    }

    let matched = matched.unwrap_or_default();
    Ok(dedup(records)
        .into_iter()
        .filter(|record| matched.contains(&record.id))
        .collect())
}

fn and_group(
    records: &[ObservationRecord],
    conditions: &[Condition],
    evaluator: &LocalEvaluator,
    context: &mut EvaluationContext,
) -> Result<HashSet<MetarId>, EvaluationError> {
    let mut matched: HashSet<MetarId> = records.iter().map(|r| r.id).collect();
    for attribute in attributes_in_order(conditions) {
        let for_attribute: Vec<&Condition> = conditions
            .iter()
            .filter(|c| c.attribute == attribute)
            .collect();
        let narrowed = evaluator.narrow(records.iter().collect(), &for_attribute, context)?;
        let narrowed: HashSet<MetarId> = narrowed.iter().map(|r| r.id).collect();
        matched.retain(|id| narrowed.contains(id));
    }
    Ok(matched)
}

fn or_group(
    records: &[ObservationRecord],
    conditions: &[Condition],
    evaluator: &LocalEvaluator,
    context: &mut EvaluationContext,
) -> Result<HashSet<MetarId>, EvaluationError> {
    let mut matched = HashSet::new();
    for condition in conditions {
        let kept = evaluator.filter(records.iter().collect(), condition, context)?;
        matched.extend(kept.iter().map(|r| r.id));
    }
    Ok(matched)
}

/// Distinct attribute names in order of first appearance.
fn attributes_in_order(conditions: &[Condition]) -> Vec<&str> {
    let mut seen = HashSet::new();
    conditions
        .iter()
        .map(|c| c.attribute.as_str())
        .filter(|attribute| seen.insert(*attribute))
        .collect()
}

fn dedup(records: Vec<ObservationRecord>) -> Vec<ObservationRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(record.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::error::UnsupportedOperatorPolicy;
    use crate::types::query::{ConditionOperator, FilterGroup};
    use chrono::{TimeZone, Utc};

    fn record(station: &str, visibility: f64, wx: Option<&str>) -> ObservationRecord {
        let time = Utc.with_ymd_and_hms(2024, 5, 1, 12, 53, 0).unwrap();
        ObservationRecord::new(MetarId::encode(station, time).unwrap())
            .with("station", station)
            .with("visibility_statute_mi", visibility)
            .with("wx_string", wx)
    }

    fn sample() -> Vec<ObservationRecord> {
        vec![
            record("KATL", 10.0, Some("-RA")),
            record("KJFK", 2.0, Some("RA BR")),
            record("KLAX", 6.0, None),
            record("KORD", 1.0, Some("SN")),
        ]
    }

    fn run(query: &Query) -> Vec<String> {
        let normalized = normalize(query).unwrap();
        let mut context = EvaluationContext::new(UnsupportedOperatorPolicy::FailOpen);
        combine(sample(), &normalized, &LocalEvaluator::metar(), &mut context)
            .unwrap()
            .iter()
            .map(|r| r.get("station").and_then(|v| v.as_text()).unwrap().to_string())
            .collect()
    }

    fn visibility_at_least(miles: i32) -> Condition {
        Condition::single("visibility_statute_mi", ConditionOperator::GreaterEqual, miles)
    }

    fn rain() -> Condition {
        Condition::single("wx_string", ConditionOperator::Contains, "RA")
    }

    #[test]
    fn test_normalize_lifts_top_level_conditions() {
        let query = Query::or()
            .with_condition(rain())
            .with_group(FilterGroup::and())
            .with_group(FilterGroup::and().with_condition(visibility_at_least(3)));
        let normalized = normalize(&query).unwrap();
        assert_eq!(normalized.operator, LogicalOperator::Or);
        assert_eq!(
            normalized.groups,
            vec![
                NormalizedGroup {
                    operator: LogicalOperator::Or,
                    conditions: vec![rain()]
                },
                NormalizedGroup {
                    operator: LogicalOperator::And,
                    conditions: vec![visibility_at_least(3)]
                },
            ]
        );
        // The input query is unchanged.
        assert_eq!(query.conditions, vec![rain()]);
        assert_eq!(query.groups.len(), 2);
    }

    #[test]
    fn test_normalize_rejects_nested_groups() {
        let query = Query::and().with_group(
            FilterGroup::and().with_group(FilterGroup::or().with_condition(rain())),
        );
        assert!(matches!(
            normalize(&query),
            Err(EvaluationError::UnsupportedQueryShape(_))
        ));
    }

    #[test]
    fn test_and_group_requires_both() {
        let query = Query::and().with_group(
            FilterGroup::and()
                .with_condition(visibility_at_least(3))
                .with_condition(rain()),
        );
        assert_eq!(run(&query), vec!["KATL"]);
    }

    #[test]
    fn test_or_group_accepts_either_without_duplicates() {
        let query = Query::and().with_group(
            FilterGroup::or()
                .with_condition(visibility_at_least(3))
                .with_condition(rain()),
        );
        assert_eq!(run(&query), vec!["KATL", "KJFK", "KLAX"]);
    }

    #[test]
    fn test_groups_combined_with_query_operator() {
        let snow = FilterGroup::and().with_condition(Condition::equal("wx_string", "SN"));
        let clear = FilterGroup::and().with_condition(Condition::is_null("wx_string"));

        let either = Query::or().with_group(snow.clone()).with_group(clear.clone());
        assert_eq!(run(&either), vec!["KLAX", "KORD"]);

        let both = Query::and().with_group(snow).with_group(clear);
        assert!(run(&both).is_empty());
    }

    #[test]
    fn test_station_conditions_are_evaluated_locally() {
        let query = Query::and().with_group(
            FilterGroup::and()
                .with_condition(Condition::equal("station", "KATL"))
                .with_condition(rain()),
        );
        assert_eq!(run(&query), vec!["KATL"]);

        let query = Query::and().with_group(
            FilterGroup::or()
                .with_condition(Condition::equal("station", "KLAX"))
                .with_condition(rain()),
        );
        assert_eq!(run(&query), vec!["KATL", "KJFK", "KLAX"]);

        let query = Query::and()
            .with_condition(Condition::in_list("station", ["KATL", "KJFK"]))
            .with_condition(Condition::equal("station", "KJFK"));
        assert_eq!(run(&query), vec!["KJFK"]);
    }

    #[test]
    fn test_no_groups_returns_everything_deduplicated() {
        let mut records = sample();
        records.push(records[0].clone());
        let normalized = normalize(&Query::default()).unwrap();
        let mut context = EvaluationContext::default();
        let out = combine(records, &normalized, &LocalEvaluator::metar(), &mut context).unwrap();
        assert_eq!(out.len(), 4);
    }
}
