//! The Schema - immutable resource type lookup.

use crate::{FieldKind, RelationshipDef, ResourceTypeDef};
use std::collections::HashMap;

/// The Schema provides runtime lookup of resource type definitions.
/// It is immutable after construction.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Resource type definitions by name.
    types: HashMap<String, ResourceTypeDef>,
}

impl Schema {
    /// Create a schema from already validated definitions
    /// (use SchemaBuilder or `Schema::from_json` for construction).
    pub(crate) fn new(types: HashMap<String, ResourceTypeDef>) -> Self {
        Self { types }
    }

    // ==================== Type Lookups ====================

    /// Get a type definition by name.
    pub fn get_type(&self, name: &str) -> Option<&ResourceTypeDef> {
        self.types.get(name)
    }

    // ==================== Field Lookups ====================

    /// Classify a field on a type. Unknown types yield `FieldKind::Unknown`.
    pub fn field_kind(&self, type_name: &str, field: &str) -> FieldKind<'_> {
        self.types
            .get(type_name)
            .map(|t| t.field_kind(field))
            .unwrap_or(FieldKind::Unknown)
    }

    /// Get a relationship definition from a type.
    pub fn get_relationship(&self, type_name: &str, name: &str) -> Option<&RelationshipDef> {
        self.types
            .get(type_name)
            .and_then(|t| t.get_relationship(name))
    }

    /// The id attribute of a type.
    pub fn id_attribute(&self, type_name: &str) -> Option<&str> {
        self.types.get(type_name).map(|t| t.id_attribute.as_str())
    }
}
