use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::model::Id;

/// A stored record of any kind: identity plus a flat attribute map.
///
/// Foreign keys are ordinary attributes named `<kind>_id`. The id lives outside
/// the attribute map so it can never be inherited or copied by accident.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub id: Id,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl Row {
    pub fn new(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// A row without identity, e.g. the caller's partial target of a clone
    pub fn partial() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    /// True when the attribute is present, not null and not an empty string
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).map(is_set_value).unwrap_or(false)
    }

    /// Build a row from `{"id": .., "attr": ..}` JSON, the shape typed records serialize to
    pub fn from_flat_json(value: Value) -> anyhow::Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(anyhow::anyhow!("Row JSON must be an object"));
        };
        let id = match map.remove("id") {
            Some(Value::String(id)) => id,
            Some(Value::Null) | None => Id::new(),
            Some(other) => return Err(anyhow::anyhow!("Row id must be a string, got {}", other)),
        };
        Ok(Self {
            id,
            attributes: map.into_iter().collect(),
        })
    }

    /// Inverse of [`Row::from_flat_json`]
    pub fn to_flat_json(&self) -> Value {
        let mut map: serde_json::Map<String, Value> = self
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        map.insert("id".to_string(), Value::String(self.id.clone()));
        Value::Object(map)
    }
}

pub(crate) fn is_set_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unset_attributes() {
        let row = Row::partial()
            .with("name", "")
            .with("key", Value::Null)
            .with("tempo", 120);
        assert!(!row.is_set("name"));
        assert!(!row.is_set("key"));
        assert!(!row.is_set("missing"));
        assert!(row.is_set("tempo"));
    }

    #[test]
    fn test_flat_json_keeps_id_out_of_attributes() {
        let row = Row::from_flat_json(json!({"id": "p1", "name": "jam", "tempo": 120.0})).unwrap();
        assert_eq!(row.id, "p1");
        assert!(row.get("id").is_none());
        assert_eq!(row.get_str("name"), Some("jam"));
        assert_eq!(row.to_flat_json()["id"], json!("p1"));
    }

    #[test]
    fn test_flat_json_rejects_non_objects() {
        assert!(Row::from_flat_json(json!([1, 2])).is_err());
        assert!(Row::from_flat_json(json!({"id": 5})).is_err());
    }
}
