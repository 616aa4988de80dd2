//! Canopy Core Types
//!
//! This crate provides the foundational types used throughout Canopy:
//! - The dynamic `Value` type shared by data, queries and results
//! - Resource references (`Ref`) and normalized resources
//! - Common error types

mod entity;
mod error;
mod id;
mod value;

pub use entity::*;
pub use error::*;
pub use id::*;
pub use value::*;
