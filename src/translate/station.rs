use crate::translate::request::Translation;
use crate::types::query::{Condition, ConditionOperator};
use crate::types::value::Value;
use log::debug;

/// Turns station conditions into the `ids` request parameter.
///
/// `Equal` with one value and `In` with one or more values can be pushed upstream.
/// Scanning stops at the first condition that translates; conditions before it that
/// could not be translated are returned as unhandled.
pub fn translate_station(conditions: &[&Condition]) -> Translation<String> {
    let mut translation = Translation::default();
    for (index, condition) in conditions.iter().enumerate() {
        match station_list(condition) {
            Some(list) => {
                let skipped = conditions.len() - index - 1;
                if skipped > 0 {
                    debug!(
                        "Station list '{}' taken, {} later station condition(s) not considered",
                        list, skipped
                    );
                }
                translation.fragment = Some(list);
                break;
            }
            None => translation.unhandled.push((*condition).clone()),
        }
    }
    translation
}

fn station_list(condition: &Condition) -> Option<String> {
    let codes = match (condition.operator, condition.values.as_slice()) {
        (ConditionOperator::Equal, [value]) => vec![station_code(value)?],
        (ConditionOperator::In, values) if !values.is_empty() => values
            .iter()
            .map(station_code)
            .collect::<Option<Vec<_>>>()?,
        _ => return None,
    };
    Some(codes.join(","))
}

fn station_code(value: &Value) -> Option<String> {
    let code = value.as_text()?.trim();
    (!code.is_empty()).then(|| code.to_string())
}
