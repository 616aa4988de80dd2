//! Resource structures for Canopy.
//!
//! Resources are stored normalized: attributes hold plain values and
//! relationships hold refs, so a graph stays a flat lookup table.

use crate::id::deserialize_id;
use crate::{Map, Ref, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The stored value of one relationship on a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationshipValue {
    /// To-many relationship.
    Many(Vec<Ref>),
    /// To-one relationship, possibly empty.
    One(Option<Ref>),
}

impl RelationshipValue {
    /// Iterate over the refs held by this relationship.
    pub fn refs(&self) -> Box<dyn Iterator<Item = &Ref> + '_> {
        match self {
            RelationshipValue::Many(refs) => Box::new(refs.iter()),
            RelationshipValue::One(r) => Box::new(r.iter()),
        }
    }

    /// Render refs as `{type, id}` maps (or null / a list of maps).
    pub fn to_value(&self) -> Value {
        match self {
            RelationshipValue::Many(refs) => Value::List(refs.iter().map(Ref::to_value).collect()),
            RelationshipValue::One(Some(r)) => r.to_value(),
            RelationshipValue::One(None) => Value::Null,
        }
    }
}

/// A typed, identified record in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique identifier within its type.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Resource type name (reference to the schema).
    #[serde(rename = "type")]
    pub type_name: String,
    /// Attribute values.
    #[serde(default)]
    pub attributes: Map,
    /// Relationship refs by relationship name.
    #[serde(default)]
    pub relationships: BTreeMap<String, RelationshipValue>,
}

impl Resource {
    /// Create a new resource with no attributes or relationships.
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
            attributes: Map::new(),
            relationships: BTreeMap::new(),
        }
    }

    /// Set an attribute value.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Get an attribute value by name.
    pub fn get_attr(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Get a relationship by name.
    pub fn get_relationship(&self, name: &str) -> Option<&RelationshipValue> {
        self.relationships.get(name)
    }

    /// A ref pointing at this resource.
    pub fn to_ref(&self) -> Ref {
        Ref::new(self.type_name.clone(), self.id.clone())
    }
}
