//! Query error types.

use canopy_expr::ExprError;
use thiserror::Error;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors that can occur during query normalization, validation and execution.
///
/// Everything except `DanglingReference` is a caller error and is raised
/// before any resource is read.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryError {
    #[error("Query is missing its root `type`")]
    MissingType,

    #[error("Query on type {type_name} is missing `select`")]
    MissingSelect { type_name: String },

    #[error("Unknown type: {name}")]
    UnknownType { name: String },

    #[error("Unknown field: {field} on {scope}")]
    UnknownField { scope: String, field: String },

    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    #[error("Invalid cursor anchor: {message}")]
    InvalidAnchor { message: String },

    #[error("Cursor anchors `before`/`after` require an `order`")]
    AnchorWithoutOrder,

    #[error("Query nesting exceeds the maximum depth of {limit}")]
    QueryTooDeep { limit: usize },

    #[error("Dangling reference: {from}.{relationship} points at missing {target}")]
    DanglingReference {
        from: String,
        relationship: String,
        target: String,
    },

    #[error(transparent)]
    Expression(#[from] ExprError),
}

impl QueryError {
    pub fn missing_select(type_name: impl Into<String>) -> Self {
        Self::MissingSelect {
            type_name: type_name.into(),
        }
    }

    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::UnknownType { name: name.into() }
    }

    pub fn unknown_field(scope: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            scope: scope.into(),
            field: field.into(),
        }
    }

    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    pub fn invalid_anchor(message: impl Into<String>) -> Self {
        Self::InvalidAnchor {
            message: message.into(),
        }
    }

    /// Returns true for errors caused by the query itself rather than the data.
    pub fn is_caller_error(&self) -> bool {
        !matches!(self, Self::DanglingReference { .. })
    }
}
