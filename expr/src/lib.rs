//! Canopy Expressions
//!
//! Evaluate the embedded operator DSL against a value.
//!
//! Responsibilities:
//! - Keep the operator registry (tag -> implementation)
//! - Decide whether a value is an expression by registry lookup
//! - Evaluate comparison, logical, path, conditional and aggregate operators
//!
//! This crate knows nothing about schemas or graphs.

mod error;
mod eval;
mod ops;
mod table;

pub use error::{ExprError, ExprResult};
pub use eval::Evaluator;
pub use ops::path::{get_path, split_path};
pub use table::{OperatorFn, OperatorTable};
