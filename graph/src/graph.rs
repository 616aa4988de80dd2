//! Core graph storage implementation.

use crate::index::TypeIndex;
use canopy_core::{
    id_from_value, CoreError, CoreResult, Map, Ref, RelationshipValue, Resource, Value,
};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// The in-memory graph snapshot.
///
/// A graph is a map of type name to id to resource. Queries only ever take
/// `&Graph`; a snapshot is never mutated while it is being read.
#[derive(Debug, Default, Clone)]
pub struct Graph {
    /// Resource storage: type -> id -> resource
    resources: HashMap<String, HashMap<String, Resource>>,
    /// Type index
    type_index: TypeIndex,
}

impl Graph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Construction ====================

    /// Insert a resource. Fails if a resource with the same type and id exists.
    pub fn insert(&mut self, resource: Resource) -> CoreResult<()> {
        let by_id = self.resources.entry(resource.type_name.clone()).or_default();
        if by_id.contains_key(&resource.id) {
            return Err(CoreError::DuplicateResource {
                type_name: resource.type_name,
                id: resource.id,
            });
        }

        self.type_index.insert(&resource.type_name, &resource.id);
        by_id.insert(resource.id.clone(), resource);
        Ok(())
    }

    /// Builder-style insert.
    pub fn with_resource(mut self, resource: Resource) -> CoreResult<Self> {
        self.insert(resource)?;
        Ok(self)
    }

    /// Load a graph from a JSON document of the form `{type: {id: resource}}`.
    ///
    /// A resource may omit its `id` and `type`; the enclosing keys are used.
    /// When present they must agree with the keys.
    pub fn from_json(source: &str) -> CoreResult<Self> {
        let doc: serde_json::Value = serde_json::from_str(source)?;
        Self::from_json_value(doc)
    }

    /// Load a graph from an already parsed JSON document.
    pub fn from_json_value(doc: serde_json::Value) -> CoreResult<Self> {
        let raw: BTreeMap<String, BTreeMap<String, RawResource>> = serde_json::from_value(doc)?;

        let mut graph = Graph::new();
        for (type_name, by_id) in raw {
            for (key, raw_resource) in by_id {
                let resource = raw_resource.into_resource(&type_name, &key)?;
                graph.insert(resource)?;
            }
        }
        Ok(graph)
    }

    // ==================== Lookups ====================

    /// Get a resource by type and id.
    pub fn get(&self, type_name: &str, id: &str) -> Option<&Resource> {
        self.resources.get(type_name).and_then(|by_id| by_id.get(id))
    }

    /// Resolve a ref to the resource it points at.
    pub fn resolve(&self, target: &Ref) -> Option<&Resource> {
        self.get(&target.type_name, &target.id)
    }

    /// All resources of a type, in insertion order.
    pub fn resources_of_type(&self, type_name: &str) -> impl Iterator<Item = &Resource> + '_ {
        let by_id = self.resources.get(type_name);
        self.type_index
            .get(type_name)
            .filter_map(move |id| by_id.and_then(|resources| resources.get(id)))
    }
}

/// Resource as it appears in a graph document.
#[derive(Debug, Deserialize)]
struct RawResource {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default, rename = "type")]
    type_name: Option<String>,
    #[serde(default)]
    attributes: Map,
    #[serde(default)]
    relationships: BTreeMap<String, RelationshipValue>,
}

impl RawResource {
    fn into_resource(self, type_name: &str, key: &str) -> CoreResult<Resource> {
        if let Some(declared) = &self.type_name {
            if declared != type_name {
                return Err(CoreError::TypeMismatch {
                    id: key.to_string(),
                    declared: declared.clone(),
                    expected: type_name.to_string(),
                });
            }
        }

        let id = match self.id.as_ref().map(Value::from) {
            Some(value) => id_from_value(&value).unwrap_or_else(|| value.to_string()),
            None => key.to_string(),
        };
        if id != key {
            return Err(CoreError::IdMismatch {
                type_name: type_name.to_string(),
                id,
                key: key.to_string(),
            });
        }

        Ok(Resource {
            attributes: self.attributes,
            relationships: self.relationships,
            ..Resource::new(type_name, id)
        })
    }
}
