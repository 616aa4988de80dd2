//! Schema definition types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute definition within a resource type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttrDef {
    /// Attribute name.
    #[serde(skip)]
    pub name: String,
    /// Type name (string, integer, number, boolean, ...).
    #[serde(rename = "type")]
    pub type_name: String,
}

impl AttrDef {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// How many resources a relationship points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
}

/// Relationship definition within a resource type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipDef {
    /// Relationship name.
    #[serde(skip)]
    pub name: String,
    /// Target resource type.
    #[serde(rename = "type")]
    pub target: String,
    /// Cardinality of the relationship.
    pub cardinality: Cardinality,
    /// Name of the inverse relationship on the target type, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse: Option<String>,
}

impl RelationshipDef {
    /// A to-one relationship.
    pub fn one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            cardinality: Cardinality::One,
            inverse: None,
        }
    }

    /// A to-many relationship.
    pub fn many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            cardinality: Cardinality::Many,
            inverse: None,
        }
    }

    pub fn with_inverse(mut self, inverse: impl Into<String>) -> Self {
        self.inverse = Some(inverse.into());
        self
    }

    pub fn is_many(&self) -> bool {
        self.cardinality == Cardinality::Many
    }
}

fn default_id_attribute() -> String {
    "id".to_string()
}

/// Resource type definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTypeDef {
    /// Type name.
    #[serde(skip)]
    pub name: String,
    /// Name of the attribute holding the resource id.
    #[serde(default = "default_id_attribute")]
    pub id_attribute: String,
    /// Attribute definitions.
    #[serde(default)]
    pub attributes: BTreeMap<String, AttrDef>,
    /// Relationship definitions.
    #[serde(default)]
    pub relationships: BTreeMap<String, RelationshipDef>,
}

impl ResourceTypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id_attribute: default_id_attribute(),
            attributes: BTreeMap::new(),
            relationships: BTreeMap::new(),
        }
    }

    /// Get an attribute definition by name.
    pub fn get_attr(&self, name: &str) -> Option<&AttrDef> {
        self.attributes.get(name)
    }

    /// Get a relationship definition by name.
    pub fn get_relationship(&self, name: &str) -> Option<&RelationshipDef> {
        self.relationships.get(name)
    }

    /// Get all attribute names.
    pub fn attr_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(|s| s.as_str())
    }

    /// Classify a field name on this type.
    pub fn field_kind(&self, name: &str) -> FieldKind<'_> {
        if name == self.id_attribute || name == "id" {
            FieldKind::Id
        } else if let Some(attr) = self.attributes.get(name) {
            FieldKind::Attribute(attr)
        } else if let Some(rel) = self.relationships.get(name) {
            FieldKind::Relationship(rel)
        } else {
            FieldKind::Unknown
        }
    }

    /// Fill in `name` fields from map keys after deserialization.
    pub(crate) fn attach_names(&mut self, name: &str) {
        self.name = name.to_string();
        for (attr_name, attr) in &mut self.attributes {
            attr.name = attr_name.clone();
        }
        for (rel_name, rel) in &mut self.relationships {
            rel.name = rel_name.clone();
        }
    }
}

/// What a field name refers to on a resource type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind<'a> {
    /// The id attribute.
    Id,
    /// A declared attribute.
    Attribute(&'a AttrDef),
    /// A declared relationship.
    Relationship(&'a RelationshipDef),
    /// Not declared on the type.
    Unknown,
}

impl FieldKind<'_> {
    /// True for the id and declared attributes.
    pub fn is_attribute(&self) -> bool {
        matches!(self, FieldKind::Id | FieldKind::Attribute(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, FieldKind::Unknown)
    }
}
