//! Expression evaluation.

use crate::{ExprError, ExprResult, OperatorTable};
use canopy_core::Value;

/// Expression evaluator.
///
/// The evaluator is stateless apart from the operator table it borrows;
/// the input value is passed to each call.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'t> {
    operators: &'t OperatorTable,
}

impl<'t> Evaluator<'t> {
    /// Create a new evaluator over an operator table.
    pub fn new(operators: &'t OperatorTable) -> Self {
        Self { operators }
    }

    /// Returns true if `value` is a single-key map whose key is a registered operator.
    pub fn is_expression(&self, value: &Value) -> bool {
        value
            .single_entry()
            .is_some_and(|(tag, _)| self.operators.contains(tag))
    }

    /// Evaluate `expr` against `input`.
    ///
    /// Anything that is not an expression is plain data and evaluates to itself.
    pub fn evaluate(&self, expr: &Value, input: &Value) -> ExprResult<Value> {
        match expr.single_entry() {
            Some((tag, operand)) => match self.operators.get(tag) {
                Some(op) => op(operand, input, self),
                None => Ok(expr.clone()),
            },
            None => Ok(expr.clone()),
        }
    }

    /// Evaluate an operand slot that takes a sub-expression.
    ///
    /// Literals pass through, but a single-key map tagged with an
    /// unregistered `$` operator is an error rather than data.
    pub fn evaluate_operand(&self, expr: &Value, input: &Value) -> ExprResult<Value> {
        if let Some((tag, _)) = expr.single_entry() {
            if tag.starts_with('$') && !self.operators.contains(tag) {
                return Err(ExprError::unknown_operator(tag));
            }
        }
        self.evaluate(expr, input)
    }

    /// Evaluate a value that must be an expression.
    pub fn evaluate_required(&self, expr: &Value, input: &Value) -> ExprResult<Value> {
        self.check_expression(expr)?;
        self.evaluate(expr, input)
    }

    /// Fail unless `value` is an expression.
    ///
    /// A single-key map with an unregistered `$` tag reports the tag.
    pub fn check_expression(&self, value: &Value) -> ExprResult<()> {
        match value.single_entry() {
            Some((tag, _)) if self.operators.contains(tag) => Ok(()),
            Some((tag, _)) if tag.starts_with('$') => Err(ExprError::unknown_operator(tag)),
            _ => Err(ExprError::not_an_expression(value.to_string())),
        }
    }

    /// Walk an expression and reject any nested `$` tag the table does not know.
    ///
    /// `$literal` operands are data and are not walked.
    pub fn check_operators(&self, value: &Value) -> ExprResult<()> {
        match value {
            Value::Map(map) => {
                if let Some((tag, operand)) = value.single_entry() {
                    if tag == "$literal" && self.operators.contains(tag) {
                        return Ok(());
                    }
                    if tag.starts_with('$') && !self.operators.contains(tag) {
                        return Err(ExprError::unknown_operator(tag));
                    }
                    return self.check_operators(operand);
                }
                map.values().try_for_each(|v| self.check_operators(v))
            }
            Value::List(items) => items.iter().try_for_each(|v| self.check_operators(v)),
            _ => Ok(()),
        }
    }
}
