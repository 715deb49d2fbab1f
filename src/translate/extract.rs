use crate::types::query::{Condition, Query};

/// Collects every condition on `attribute`, first from the top-level list and then
/// from each filter group in order. The query itself is left untouched.
///
/// Nested groups below the first level are not searched; queries using them are
/// rejected before any extraction happens.
pub fn extract_conditions<'a>(query: &'a Query, attribute: &str) -> Vec<&'a Condition> {
    query
        .conditions
        .iter()
        .chain(query.groups.iter().flat_map(|group| group.conditions.iter()))
        .filter(|condition| condition.attribute == attribute)
        .collect()
}
