//! Built-in operator implementations.

pub mod aggregate;
pub mod comparison;
pub mod conditional;
pub mod logical;
pub mod path;
