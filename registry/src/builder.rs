//! SchemaBuilder for constructing an immutable Schema.

use crate::{AttrDef, RelationshipDef, ResourceTypeDef, Schema};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Errors that can occur during schema construction.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Duplicate type name: {0}")]
    DuplicateTypeName(String),

    #[error("Field {field} on type {type_name} is declared as both attribute and relationship")]
    DuplicateField { type_name: String, field: String },

    #[error("Relationship {relationship} on type {type_name} targets unknown type {target}")]
    UnknownRelationshipTarget {
        type_name: String,
        relationship: String,
        target: String,
    },

    #[error("Relationship {relationship} on type {type_name} names inverse {inverse}, which is not a relationship on {target}")]
    UnknownInverse {
        type_name: String,
        relationship: String,
        target: String,
        inverse: String,
    },

    #[error("Invalid schema document: {0}")]
    InvalidDocument(#[from] serde_json::Error),
}

/// Builder for constructing an immutable Schema.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    /// Types being built.
    types: HashMap<String, ResourceTypeDef>,
}

impl SchemaBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type definition.
    pub fn add_type(&mut self, name: impl Into<String>) -> TypeBuilder<'_> {
        TypeBuilder {
            builder: self,
            def: ResourceTypeDef::new(name),
        }
    }

    /// Build the immutable Schema.
    pub fn build(self) -> Result<Schema, RegistryError> {
        for type_def in self.types.values() {
            for rel in type_def.relationships.values() {
                let Some(target) = self.types.get(&rel.target) else {
                    return Err(RegistryError::UnknownRelationshipTarget {
                        type_name: type_def.name.clone(),
                        relationship: rel.name.clone(),
                        target: rel.target.clone(),
                    });
                };

                if let Some(inverse) = &rel.inverse {
                    if target.get_relationship(inverse).is_none() {
                        return Err(RegistryError::UnknownInverse {
                            type_name: type_def.name.clone(),
                            relationship: rel.name.clone(),
                            target: rel.target.clone(),
                            inverse: inverse.clone(),
                        });
                    }
                }
            }
        }

        Ok(Schema::new(self.types))
    }
}

/// Builder for a resource type definition.
pub struct TypeBuilder<'a> {
    builder: &'a mut SchemaBuilder,
    def: ResourceTypeDef,
}

impl<'a> TypeBuilder<'a> {
    /// Set the id attribute name (defaults to "id").
    pub fn id_attribute(mut self, name: impl Into<String>) -> Self {
        self.def.id_attribute = name.into();
        self
    }

    /// Add an attribute.
    pub fn attr(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        let attr = AttrDef::new(name, type_name);
        self.def.attributes.insert(attr.name.clone(), attr);
        self
    }

    /// Add a relationship.
    pub fn relationship(mut self, rel: RelationshipDef) -> Self {
        self.def.relationships.insert(rel.name.clone(), rel);
        self
    }

    /// Finish building this type.
    pub fn done(self) -> Result<(), RegistryError> {
        if self.builder.types.contains_key(&self.def.name) {
            return Err(RegistryError::DuplicateTypeName(self.def.name));
        }
        check_fields(&self.def)?;

        self.builder.types.insert(self.def.name.clone(), self.def);
        Ok(())
    }
}

fn check_fields(def: &ResourceTypeDef) -> Result<(), RegistryError> {
    if let Some(field) = def
        .relationships
        .keys()
        .find(|name| def.attributes.contains_key(*name))
    {
        return Err(RegistryError::DuplicateField {
            type_name: def.name.clone(),
            field: field.clone(),
        });
    }
    Ok(())
}

/// Schema document: `{"resources": {type: definition}}`.
#[derive(Debug, Deserialize)]
struct SchemaDocument {
    resources: BTreeMap<String, ResourceTypeDef>,
}

impl Schema {
    /// Load and validate a schema from a JSON document.
    pub fn from_json(source: &str) -> Result<Schema, RegistryError> {
        let doc: SchemaDocument = serde_json::from_str(source)?;
        Self::from_document(doc)
    }

    /// Load and validate a schema from an already parsed JSON document.
    pub fn from_json_value(doc: serde_json::Value) -> Result<Schema, RegistryError> {
        let doc: SchemaDocument = serde_json::from_value(doc)?;
        Self::from_document(doc)
    }

    fn from_document(doc: SchemaDocument) -> Result<Schema, RegistryError> {
        let mut builder = SchemaBuilder::new();
        for (name, mut def) in doc.resources {
            def.attach_names(&name);
            check_fields(&def)?;
            builder.types.insert(name, def);
        }
        builder.build()
    }
}
