use crate::translate::request::Translation;
use crate::types::query::{Condition, ConditionOperator};
use chrono::{DateTime, Utc};

/// A possibly half open observation time range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Turns observation time conditions into `startTime`/`endTime` bounds.
///
/// Bounds are not merged: the last condition touching a bound wins. `Equal` and
/// `Between` set both bounds and end the scan.
pub fn translate_observation_time(conditions: &[&Condition]) -> Translation<TimeWindow> {
    let mut window = TimeWindow::default();
    let mut unhandled = Vec::new();

    for condition in conditions {
        let instants: Option<Vec<DateTime<Utc>>> =
            condition.values.iter().map(|v| v.as_timestamp()).collect();

        match (condition.operator, instants.as_deref()) {
            (ConditionOperator::Equal, Some([at])) => {
                window.start = Some(*at);
                window.end = Some(*at);
                break;
            }
            (ConditionOperator::Between, Some([start, end])) => {
                window.start = Some(*start);
                window.end = Some(*end);
                break;
            }
            (ConditionOperator::GreaterEqual | ConditionOperator::GreaterThan, Some([start])) => {
                window.start = Some(*start);
            }
            (ConditionOperator::LessEqual | ConditionOperator::LessThan, Some([end])) => {
                window.end = Some(*end);
            }
            _ => unhandled.push((*condition).clone()),
        }
    }

    let fragment = (window.start.is_some() || window.end.is_some()).then_some(window);
    Translation {
        fragment,
        unhandled,
    }
}
