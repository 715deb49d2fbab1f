use crate::evaluate::error::{Diagnostic, EvaluationError, UnsupportedOperatorPolicy};
use crate::evaluate::predicate::{Predicate, PredicateTable};
use crate::types::attributes::AttributeSchema;
use crate::types::query::Condition;
use crate::types::record::ObservationRecord;
use log::{debug, warn};

/// Per-query evaluation state: the unsupported operator policy and the
/// diagnostics collected while it was applied.
#[derive(Debug, Default)]
pub struct EvaluationContext {
    policy: UnsupportedOperatorPolicy,
    diagnostics: Vec<Diagnostic>,
}

impl EvaluationContext {
    pub fn new(policy: UnsupportedOperatorPolicy) -> Self {
        Self {
            policy,
            diagnostics: Vec::new(),
        }
    }

    pub fn policy(&self) -> UnsupportedOperatorPolicy {
        self.policy
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Applies the policy to a condition that could not be evaluated. Returns `Ok`
    /// when the condition should be skipped.
    fn skip_or_fail(
        &mut self,
        condition: &Condition,
        error: EvaluationError,
    ) -> Result<(), EvaluationError> {
        match self.policy {
            UnsupportedOperatorPolicy::FailClosed => Err(error),
            UnsupportedOperatorPolicy::FailOpen => {
                let diagnostic = Diagnostic {
                    attribute: condition.attribute.clone(),
                    operator: condition.operator,
                    error,
                };
                warn!("Fail-open: {}", diagnostic);
                self.diagnostics.push(diagnostic);
                Ok(())
            }
        }
    }
}

/// Evaluates conditions against fetched records.
pub struct LocalEvaluator {
    schema: AttributeSchema,
    table: PredicateTable,
}

impl LocalEvaluator {
    pub fn new(schema: AttributeSchema, table: PredicateTable) -> Self {
        Self { schema, table }
    }

    pub fn metar() -> Self {
        Self::new(AttributeSchema::metar(), PredicateTable::standard())
    }

    /// Resolves the attribute kind and builds the predicate for `condition`.
    pub fn predicate(&self, condition: &Condition) -> Result<Predicate, EvaluationError> {
        let kind =
            self.schema
                .kind(&condition.attribute)
                .ok_or_else(|| EvaluationError::UnknownAttribute {
                    attribute: condition.attribute.clone(),
                })?;
        self.table.build(kind, condition)
    }

    /// Keeps the records matching a single condition. A condition that cannot be
    /// evaluated leaves `records` unchanged under the fail-open policy.
    pub fn filter<'a>(
        &self,
        records: Vec<&'a ObservationRecord>,
        condition: &Condition,
        context: &mut EvaluationContext,
    ) -> Result<Vec<&'a ObservationRecord>, EvaluationError> {
        let predicate = match self.predicate(condition) {
            Ok(predicate) => predicate,
            Err(error) => {
                context.skip_or_fail(condition, error)?;
                return Ok(records);
            }
        };
        let before = records.len();
        let kept: Vec<_> = records
            .into_iter()
            .filter(|record| predicate(record.get(&condition.attribute)))
            .collect();
        debug!(
            "{} {} {:?}: {} -> {} record(s)",
            condition.attribute,
            condition.operator,
            condition.values,
            before,
            kept.len()
        );
        Ok(kept)
    }

    /// Applies `conditions` one after another, each narrowing the output of the last.
    pub fn narrow<'a>(
        &self,
        records: Vec<&'a ObservationRecord>,
        conditions: &[&Condition],
        context: &mut EvaluationContext,
    ) -> Result<Vec<&'a ObservationRecord>, EvaluationError> {
        conditions
            .iter()
            .try_fold(records, |working, condition| {
                self.filter(working, condition, context)
            })
    }
}

impl Default for LocalEvaluator {
    fn default() -> Self {
        Self::metar()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::codec::MetarId;
    use crate::types::query::ConditionOperator;
    use chrono::{TimeZone, Utc};

    fn record(
        station: &str,
        minute: u32,
        visibility: f64,
        wx: Option<&str>,
    ) -> ObservationRecord {
        let time = Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap();
        ObservationRecord::new(MetarId::encode(station, time).unwrap())
            .with("station", station)
            .with("visibility_statute_mi", visibility)
            .with("wx_string", wx)
    }

    fn stations(records: &[&ObservationRecord]) -> Vec<String> {
        records
            .iter()
            .map(|r| r.get("station").and_then(|v| v.as_text()).unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_narrow_is_destructive() {
        let records = vec![
            record("KATL", 0, 10.0, Some("-RA")),
            record("KJFK", 1, 2.0, Some("RA BR")),
            record("KLAX", 2, 6.0, None),
        ];
        let refs: Vec<_> = records.iter().collect();
        let visibility = Condition::single(
            "visibility_statute_mi",
            ConditionOperator::GreaterEqual,
            3,
        );
        let rain = Condition::single("wx_string", ConditionOperator::Contains, "RA");

        let mut context = EvaluationContext::default();
        let evaluator = LocalEvaluator::metar();
        let kept = evaluator
            .narrow(refs, &[&visibility, &rain], &mut context)
            .unwrap();
        assert_eq!(stations(&kept), vec!["KATL"]);
        assert!(context.diagnostics().is_empty());
    }

    #[test]
    fn test_fail_open_leaves_set_unchanged() {
        let records = vec![record("KATL", 0, 10.0, None), record("KJFK", 1, 2.0, None)];
        let unsupported = Condition::single(
            "visibility_statute_mi",
            ConditionOperator::BeginsWith,
            "1",
        );
        let unknown = Condition::equal("ceiling", 100);

        let mut context = EvaluationContext::new(UnsupportedOperatorPolicy::FailOpen);
        let kept = LocalEvaluator::metar()
            .narrow(
                records.iter().collect(),
                &[&unsupported, &unknown],
                &mut context,
            )
            .unwrap();
        assert_eq!(kept.len(), 2);
        let diagnostics = context.into_diagnostics();
        assert_eq!(diagnostics.len(), 2);
        assert!(matches!(
            diagnostics[0].error,
            EvaluationError::UnsupportedOperator { .. }
        ));
        assert!(matches!(
            diagnostics[1].error,
            EvaluationError::UnknownAttribute { .. }
        ));
    }

    #[test]
    fn test_fail_closed_returns_error() {
        let records = vec![record("KATL", 0, 10.0, None)];
        let unsupported = Condition::single("wx_string", ConditionOperator::GreaterThan, "RA");
        let mut context = EvaluationContext::new(UnsupportedOperatorPolicy::FailClosed);
        let result =
            LocalEvaluator::metar().filter(records.iter().collect(), &unsupported, &mut context);
        assert_eq!(
            result.err(),
            Some(EvaluationError::UnsupportedOperator {
                attribute: "wx_string".to_string(),
                operator: ConditionOperator::GreaterThan,
            })
        );
    }
}
