//! Canopy Registry
//!
//! Runtime schema lookup. Single source of truth for resource types, their
//! attributes and relationships. The schema is immutable after construction
//! via SchemaBuilder or a JSON document.

mod builder;
mod registry;
mod types;

pub use builder::{RegistryError, SchemaBuilder, TypeBuilder};
pub use registry::Schema;
pub use types::*;
