//! Logical operators.
//!
//! These control their own evaluation: each sub-expression is evaluated
//! against the same input, and `$and`/`$or` short-circuit.

use crate::{Evaluator, ExprError, ExprResult};
use canopy_core::Value;

fn sub_expressions<'a>(operator: &str, operand: &'a Value) -> ExprResult<&'a [Value]> {
    operand.as_list().ok_or_else(|| {
        ExprError::invalid_operand(
            operator,
            format!("expected a list of expressions, found {}", operand.type_name()),
        )
    })
}

pub fn and(operand: &Value, input: &Value, ev: &Evaluator<'_>) -> ExprResult<Value> {
    for expr in sub_expressions("$and", operand)? {
        if !ev.evaluate_operand(expr, input)?.is_truthy() {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

pub fn or(operand: &Value, input: &Value, ev: &Evaluator<'_>) -> ExprResult<Value> {
    for expr in sub_expressions("$or", operand)? {
        if ev.evaluate_operand(expr, input)?.is_truthy() {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

pub fn not(operand: &Value, input: &Value, ev: &Evaluator<'_>) -> ExprResult<Value> {
    Ok(Value::Bool(!ev.evaluate_operand(operand, input)?.is_truthy()))
}
