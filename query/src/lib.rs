//! Canopy Query
//!
//! Execute declarative queries against a graph snapshot.
//!
//! Responsibilities:
//! - Normalize query documents into one canonical shape
//! - Validate field references before any resource is read
//! - Project resources, following relationship sub-queries
//! - Group and aggregate rows, recursively
//! - Order rows and apply cursor pagination

mod config;
mod error;
mod executor;
mod filter;
mod group;
mod model;
mod normalize;
mod order;
mod projector;
mod validate;


pub use config::{EngineConfig, DEFAULT_MAX_QUERY_DEPTH};
pub use error::{QueryError, QueryResult};
pub use executor::{execute, QueryEngine};
pub use filter::matches;
pub use group::group_rows;
pub use model::{
    Anchor, Condition, Direction, GroupSpec, NormalizedQuery, OrderKey, Select, Selection, Slice,
    WhereClause,
};
pub use normalize::{normalize, Normalizer};
pub use order::{apply_order_and_slice, validate_slice};
pub use projector::Projector;
pub use validate::validate;
