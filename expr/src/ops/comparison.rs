//! Comparison and membership operators.
//!
//! The input is the value under test; the operand is what it is compared
//! with. Operands may themselves be expressions over the same input.

use crate::{Evaluator, ExprError, ExprResult};
use canopy_core::Value;
use std::cmp::Ordering;

/// Order two values when they belong to the same comparable domain.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_))
        | (Value::String(_), Value::String(_))
        | (Value::Bool(_), Value::Bool(_)) => Some(a.cmp_sortable(b)),
        _ => None,
    }
}

fn ordered(
    operand: &Value,
    input: &Value,
    ev: &Evaluator<'_>,
    accept: fn(Ordering) -> bool,
) -> ExprResult<Value> {
    let rhs = ev.evaluate(operand, input)?;
    Ok(Value::Bool(compare(input, &rhs).is_some_and(accept)))
}

pub fn eq(operand: &Value, input: &Value, ev: &Evaluator<'_>) -> ExprResult<Value> {
    let rhs = ev.evaluate(operand, input)?;
    Ok(Value::Bool(input.loose_eq(&rhs)))
}

pub fn ne(operand: &Value, input: &Value, ev: &Evaluator<'_>) -> ExprResult<Value> {
    let rhs = ev.evaluate(operand, input)?;
    Ok(Value::Bool(!input.loose_eq(&rhs)))
}

pub fn gt(operand: &Value, input: &Value, ev: &Evaluator<'_>) -> ExprResult<Value> {
    ordered(operand, input, ev, Ordering::is_gt)
}

pub fn gte(operand: &Value, input: &Value, ev: &Evaluator<'_>) -> ExprResult<Value> {
    ordered(operand, input, ev, Ordering::is_ge)
}

pub fn lt(operand: &Value, input: &Value, ev: &Evaluator<'_>) -> ExprResult<Value> {
    ordered(operand, input, ev, Ordering::is_lt)
}

pub fn lte(operand: &Value, input: &Value, ev: &Evaluator<'_>) -> ExprResult<Value> {
    ordered(operand, input, ev, Ordering::is_le)
}

fn membership(operator: &str, operand: &Value, input: &Value, ev: &Evaluator<'_>) -> ExprResult<bool> {
    match ev.evaluate(operand, input)? {
        Value::List(items) => Ok(items.iter().any(|item| item.loose_eq(input))),
        other => Err(ExprError::invalid_operand(
            operator,
            format!("expected a list, found {}", other.type_name()),
        )),
    }
}

pub fn in_list(operand: &Value, input: &Value, ev: &Evaluator<'_>) -> ExprResult<Value> {
    membership("$in", operand, input, ev).map(Value::Bool)
}

pub fn not_in_list(operand: &Value, input: &Value, ev: &Evaluator<'_>) -> ExprResult<Value> {
    membership("$nin", operand, input, ev).map(|found| Value::Bool(!found))
}

pub fn matches_regex(operand: &Value, input: &Value, ev: &Evaluator<'_>) -> ExprResult<Value> {
    let pattern = match ev.evaluate(operand, input)? {
        Value::String(p) => p,
        other => {
            return Err(ExprError::invalid_operand(
                "$matchesRegex",
                format!("expected a pattern string, found {}", other.type_name()),
            ))
        }
    };
    let re = regex_lite::Regex::new(&pattern).map_err(|e| ExprError::InvalidRegex {
        pattern: pattern.clone(),
        message: e.to_string(),
    })?;

    Ok(Value::Bool(input.as_str().is_some_and(|s| re.is_match(s))))
}

/// `{$isDefined: true}` holds for non-null input, `{$isDefined: false}` for null.
pub fn is_defined(operand: &Value, input: &Value, ev: &Evaluator<'_>) -> ExprResult<Value> {
    let expected = ev.evaluate(operand, input)?.as_bool().unwrap_or(true);
    Ok(Value::Bool(!input.is_null() == expected))
}
