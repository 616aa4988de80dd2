//! Configuration for query execution

use canopy_expr::OperatorTable;

/// Default bound on sub-query and regroup nesting.
pub const DEFAULT_MAX_QUERY_DEPTH: usize = 32;

/// Configuration for a query engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum nesting of sub-queries (and of group levels) in one query
    pub max_query_depth: usize,
    /// Operators used to recognise and evaluate expressions
    pub operators: OperatorTable,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_query_depth: DEFAULT_MAX_QUERY_DEPTH,
            operators: OperatorTable::in_memory(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_query_depth(mut self, depth: usize) -> Self {
        self.max_query_depth = depth;
        self
    }

    pub fn with_operators(mut self, operators: OperatorTable) -> Self {
        self.operators = operators;
        self
    }
}
