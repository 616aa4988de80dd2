//! Operator registry.
//!
//! An expression is a single-key map whose key is a tag registered here.
//! Expression-ness is decided by table membership only, so a table can be
//! swapped to give the same tags different semantics.

use crate::ops;
use crate::{Evaluator, ExprResult};
use canopy_core::Value;
use std::collections::HashMap;
use std::fmt;

/// An operator implementation: `(operand, input, evaluator) -> value`.
///
/// Operators receive their operand unevaluated and decide themselves
/// whether and how to evaluate it.
pub type OperatorFn = fn(&Value, &Value, &Evaluator<'_>) -> ExprResult<Value>;

/// Table of operator tags to implementations.
#[derive(Clone)]
pub struct OperatorTable {
    operators: HashMap<String, OperatorFn>,
}

impl OperatorTable {
    /// A table with no operators registered.
    pub fn empty() -> Self {
        Self {
            operators: HashMap::new(),
        }
    }

    /// The in-memory operator set.
    pub fn in_memory() -> Self {
        let mut table = Self::empty();

        // Comparison
        table.register("$eq", ops::comparison::eq);
        table.register("$ne", ops::comparison::ne);
        table.register("$gt", ops::comparison::gt);
        table.register("$gte", ops::comparison::gte);
        table.register("$lt", ops::comparison::lt);
        table.register("$lte", ops::comparison::lte);
        table.register("$in", ops::comparison::in_list);
        table.register("$nin", ops::comparison::not_in_list);
        table.register("$matchesRegex", ops::comparison::matches_regex);
        table.register("$isDefined", ops::comparison::is_defined);

        // Logical
        table.register("$and", ops::logical::and);
        table.register("$or", ops::logical::or);
        table.register("$not", ops::logical::not);

        // Path access
        table.register("$get", ops::path::get);
        table.register("$pluck", ops::path::pluck);
        table.register("$literal", ops::path::literal);

        // Conditional
        table.register("$if", ops::conditional::if_then_else);
        table.register("$case", ops::conditional::case);

        // Aggregates
        table.register("$count", ops::aggregate::count);
        table.register("$sum", ops::aggregate::sum);
        table.register("$mean", ops::aggregate::mean);
        table.register("$median", ops::aggregate::median);
        table.register("$min", ops::aggregate::min);
        table.register("$max", ops::aggregate::max);

        table
    }

    /// Register an operator, returning the implementation it replaced.
    pub fn register(&mut self, tag: impl Into<String>, op: OperatorFn) -> Option<OperatorFn> {
        self.operators.insert(tag.into(), op)
    }

    /// Builder-style register.
    pub fn with(mut self, tag: impl Into<String>, op: OperatorFn) -> Self {
        self.register(tag, op);
        self
    }

    /// Remove an operator.
    pub fn unregister(&mut self, tag: &str) -> Option<OperatorFn> {
        self.operators.remove(tag)
    }

    /// Look up an operator.
    pub fn get(&self, tag: &str) -> Option<OperatorFn> {
        self.operators.get(tag).copied()
    }

    /// Check if a tag is registered.
    pub fn contains(&self, tag: &str) -> bool {
        self.operators.contains_key(tag)
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.operators.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl Default for OperatorTable {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl fmt::Debug for OperatorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorTable")
            .field("tags", &self.tags())
            .finish()
    }
}
