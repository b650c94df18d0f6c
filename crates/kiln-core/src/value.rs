//! Structured intermediate value shared by all converters

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Generic hierarchical value (maps, lists, scalars).
///
/// Every converter parses its source into a `Value` and hands it to the
/// resource writer. Maps are ordered so encoding the same tree twice yields
/// identical bytes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// An empty map
    pub fn map() -> Self {
        Value::Map(BTreeMap::new())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Look up a key when this value is a map
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Insert a key, turning a non-map value into a map first
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        if !matches!(self, Value::Map(_)) {
            *self = Value::map();
        }
        if let Value::Map(m) = self {
            m.insert(key.into(), value);
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_object() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"Name":"Hero","Level":3,"Speed":1.5,"Tags":["a"]}"#).unwrap();
        let value = Value::from(json);

        assert_eq!(value.get("Name"), Some(&Value::from("Hero")));
        assert_eq!(value.get("Level"), Some(&Value::Int(3)));
        assert_eq!(value.get("Speed"), Some(&Value::Float(1.5)));
        assert_eq!(
            value.get("Tags"),
            Some(&Value::List(vec![Value::from("a")]))
        );
    }

    #[test]
    fn test_insert_promotes_to_map() {
        let mut value = Value::Null;
        value.insert("key", Value::Bool(true));
        assert_eq!(value.get("key"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_bincode_roundtrip_preserves_tree() {
        let mut value = Value::map();
        value.insert("data", Value::Bytes(vec![0, 1, 2]));
        value.insert("nested", Value::List(vec![Value::Null, Value::Int(-4)]));

        let bytes = bincode::serialize(&value).unwrap();
        let back: Value = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, value);
    }
}
