//! Expression error types.

use thiserror::Error;

/// Result type for expression evaluation.
pub type ExprResult<T> = Result<T, ExprError>;

/// Errors that can occur while evaluating expressions.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExprError {
    #[error("Unknown operator: {tag}")]
    UnknownOperator { tag: String },

    #[error("Expected an expression, found {found}")]
    NotAnExpression { found: String },

    #[error("Invalid operand for {operator}: {message}")]
    InvalidOperand { operator: String, message: String },

    #[error("Invalid regular expression {pattern}: {message}")]
    InvalidRegex { pattern: String, message: String },
}

impl ExprError {
    pub fn unknown_operator(tag: impl Into<String>) -> Self {
        Self::UnknownOperator { tag: tag.into() }
    }

    pub fn not_an_expression(found: impl Into<String>) -> Self {
        Self::NotAnExpression {
            found: found.into(),
        }
    }

    pub fn invalid_operand(operator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOperand {
            operator: operator.into(),
            message: message.into(),
        }
    }
}
