//! Indexes for graph lookups.

use std::collections::HashMap;

/// Type index: type name -> ids in insertion order.
///
/// Insertion order is what makes whole-type scans deterministic.
#[derive(Debug, Default, Clone)]
pub struct TypeIndex {
    index: HashMap<String, Vec<String>>,
}

impl TypeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, type_name: &str, id: &str) {
        self.index
            .entry(type_name.to_string())
            .or_default()
            .push(id.to_string());
    }

    pub fn get(&self, type_name: &str) -> impl Iterator<Item = &str> + '_ {
        self.index
            .get(type_name)
            .into_iter()
            .flat_map(|ids| ids.iter().map(String::as_str))
    }
}
