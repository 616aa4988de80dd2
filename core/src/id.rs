//! Identity types for Canopy resources.
//!
//! Resource ids are opaque strings. Documents may carry integer ids; they
//! are accepted on load and rendered in decimal.

use crate::{Map, Value};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A pointer to a resource: its type name and id.
///
/// Relationships store refs only, never embedded resources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ref {
    /// Target resource type.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Target resource id.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
}

impl Ref {
    /// Create a new ref.
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: id.into(),
        }
    }

    /// Render as a `{type, id}` map value.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::from(self.type_name.as_str()));
        map.insert("id".to_string(), Value::from(self.id.as_str()));
        Value::Map(map)
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.type_name, self.id)
    }
}

/// Convert a scalar value to a resource id, if it has an id form.
pub fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Int(i) => Some(i.to_string()),
        _ => None,
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

/// Serde helper accepting either a string or an integer id.
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}
