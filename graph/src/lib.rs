//! Canopy Graph Storage
//!
//! This crate provides the read-only graph snapshot queries run against:
//! - Resource storage keyed by type and id
//! - Type index: scan resources of a type in insertion order
//! - Ref resolution
//! - Loading snapshots from JSON documents

mod graph;
mod index;

pub use graph::*;
pub use index::TypeIndex;
