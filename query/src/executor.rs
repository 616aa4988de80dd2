//! Query execution.

use canopy_core::Value;
use canopy_expr::Evaluator;
use canopy_graph::Graph;
use canopy_registry::Schema;
use tracing::debug;

use crate::config::EngineConfig;
use crate::model::NormalizedQuery;
use crate::normalize::Normalizer;
use crate::projector::Projector;
use crate::validate::validate;
use crate::QueryResult;

/// Query engine over one schema and graph snapshot.
pub struct QueryEngine<'s, 'g> {
    schema: &'s Schema,
    graph: &'g Graph,
    config: EngineConfig,
}

impl<'s, 'g> QueryEngine<'s, 'g> {
    /// Create a new engine with the default configuration.
    pub fn new(schema: &'s Schema, graph: &'g Graph) -> Self {
        Self {
            schema,
            graph,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Normalize a query document without executing it.
    pub fn normalize(&self, query: &Value) -> QueryResult<NormalizedQuery> {
        Normalizer::new(self.schema, &self.config.operators)
            .with_max_depth(self.config.max_query_depth)
            .normalize(query)
    }

    /// Execute a query document.
    pub fn execute(&self, query: &Value) -> QueryResult<Value> {
        let normalized = self.normalize(query)?;
        self.execute_normalized(&normalized)
    }

    /// Validate and execute an already normalized query.
    pub fn execute_normalized(&self, query: &NormalizedQuery) -> QueryResult<Value> {
        debug!(type_name = %query.type_name, id = ?query.id, "executing query");
        validate(self.schema, query)?;

        let evaluator = Evaluator::new(&self.config.operators);
        let result = Projector::new(self.schema, self.graph, evaluator).project(query)?;

        match &result {
            Value::List(rows) => debug!(rows = rows.len(), "query finished"),
            Value::Null => debug!("query found nothing"),
            _ => debug!(rows = 1, "query finished"),
        }
        Ok(result)
    }

    /// Execute a query given as JSON and return the result as JSON.
    pub fn execute_json(&self, query: &serde_json::Value) -> QueryResult<serde_json::Value> {
        self.execute(&Value::from(query)).map(|result| result.to_json())
    }
}

/// Execute a query with the default configuration.
pub fn execute(schema: &Schema, graph: &Graph, query: &Value) -> QueryResult<Value> {
    QueryEngine::new(schema, graph).execute(query)
}
