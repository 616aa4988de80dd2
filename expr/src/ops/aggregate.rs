//! Aggregate operators.
//!
//! The operand is a literal list, or an expression evaluated against the
//! input whose result supplies the items (typically `$pluck` over a group's
//! rows). Reducers skip nulls; `$count` counts every item.
//!
//! Empty-result convention: `$sum` of nothing is 0 and `$count` is 0;
//! `$mean`, `$median`, `$min` and `$max` of nothing are null.

use crate::{Evaluator, ExprError, ExprResult};
use canopy_core::Value;

fn items(operator: &str, operand: &Value, input: &Value, ev: &Evaluator<'_>) -> ExprResult<Vec<Value>> {
    match operand {
        Value::List(items) => Ok(items.clone()),
        Value::Null => match input {
            Value::List(items) => Ok(items.clone()),
            other => Err(ExprError::invalid_operand(
                operator,
                format!("null operand needs a list input, found {}", other.type_name()),
            )),
        },
        expr if ev.is_expression(expr) => match ev.evaluate(expr, input)? {
            Value::List(items) => Ok(items),
            Value::Null => Ok(Vec::new()),
            scalar => Ok(vec![scalar]),
        },
        other => Err(ExprError::invalid_operand(
            operator,
            format!("expected a list or an expression, found {}", other.type_name()),
        )),
    }
}

fn numbers(values: &[Value]) -> impl Iterator<Item = &Value> {
    values.iter().filter(|v| v.is_number())
}

pub fn count(operand: &Value, input: &Value, ev: &Evaluator<'_>) -> ExprResult<Value> {
    Ok(Value::from(items("$count", operand, input, ev)?.len()))
}

/// Integer sum while every item is an Int; switches to Float on the first
/// Float or on overflow.
pub fn sum(operand: &Value, input: &Value, ev: &Evaluator<'_>) -> ExprResult<Value> {
    let values = items("$sum", operand, input, ev)?;

    let mut int_sum: Option<i64> = Some(0);
    let mut float_sum = 0.0f64;
    for value in numbers(&values) {
        float_sum += value.as_number().unwrap_or(0.0);
        int_sum = match (int_sum, value) {
            (Some(acc), Value::Int(i)) => acc.checked_add(*i),
            _ => None,
        };
    }

    Ok(match int_sum {
        Some(i) => Value::Int(i),
        None => Value::Float(float_sum),
    })
}

pub fn mean(operand: &Value, input: &Value, ev: &Evaluator<'_>) -> ExprResult<Value> {
    let values = items("$mean", operand, input, ev)?;

    let nums: Vec<f64> = numbers(&values).filter_map(Value::as_number).collect();
    if nums.is_empty() {
        return Ok(Value::Null);
    }
    Ok(Value::Float(nums.iter().sum::<f64>() / nums.len() as f64))
}

pub fn median(operand: &Value, input: &Value, ev: &Evaluator<'_>) -> ExprResult<Value> {
    let values = items("$median", operand, input, ev)?;

    let mut nums: Vec<&Value> = numbers(&values).collect();
    if nums.is_empty() {
        return Ok(Value::Null);
    }
    nums.sort_by(|a, b| a.cmp_sortable(b));

    let mid = nums.len() / 2;
    if nums.len() % 2 == 1 {
        Ok(nums[mid].clone())
    } else {
        let lo = nums[mid - 1].as_number().unwrap_or(0.0);
        let hi = nums[mid].as_number().unwrap_or(0.0);
        Ok(Value::Float((lo + hi) / 2.0))
    }
}

fn extreme(
    operator: &str,
    operand: &Value,
    input: &Value,
    ev: &Evaluator<'_>,
    keep: std::cmp::Ordering,
) -> ExprResult<Value> {
    let values = items(operator, operand, input, ev)?;

    let mut result: Option<Value> = None;
    for value in values.into_iter().filter(|v| !v.is_null()) {
        result = Some(match result {
            Some(current) if value.cmp_sortable(&current) != keep => current,
            _ => value,
        });
    }

    Ok(result.unwrap_or(Value::Null))
}

pub fn min(operand: &Value, input: &Value, ev: &Evaluator<'_>) -> ExprResult<Value> {
    extreme("$min", operand, input, ev, std::cmp::Ordering::Less)
}

pub fn max(operand: &Value, input: &Value, ev: &Evaluator<'_>) -> ExprResult<Value> {
    extreme("$max", operand, input, ev, std::cmp::Ordering::Greater)
}
