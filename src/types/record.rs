use crate::identifier::codec::MetarId;
use crate::types::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single METAR observation as returned by a query.
///
/// Records are created fresh for every fetch and never cached. Attribute names
/// follow the METAR schema in [`crate::AttributeSchema::metar`]; attributes the
/// upstream left out are simply absent from the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub id: MetarId,
    pub attributes: BTreeMap<String, Value>,
}

impl ObservationRecord {
    pub fn new(id: MetarId) -> Self {
        Self {
            id,
            attributes: BTreeMap::new(),
        }
    }

    /// Adds (or replaces) an attribute, returning the record for chaining.
    pub fn with(mut self, attribute: &str, value: impl Into<Value>) -> Self {
        self.set(attribute, value);
        self
    }

    pub fn set(&mut self, attribute: &str, value: impl Into<Value>) {
        self.attributes.insert(attribute.to_string(), value.into());
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }
}
