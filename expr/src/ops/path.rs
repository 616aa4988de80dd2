//! Path access operators.
//!
//! Paths are dotted strings (`home.name`) or lists of segments. A literal
//! `$` segment over a list continues the remaining path for each element
//! and flattens the results. Access through null or a missing key yields
//! null; it never fails.

use crate::{Evaluator, ExprError, ExprResult};
use canopy_core::Value;

/// Split a dotted path into segments. The empty path has no segments.
pub fn split_path(path: &str) -> Vec<&str> {
    if path.is_empty() {
        Vec::new()
    } else {
        path.split('.').collect()
    }
}

/// Resolve a path against a value.
pub fn get_path(value: &Value, segments: &[&str]) -> Value {
    let Some((head, rest)) = segments.split_first() else {
        return value.clone();
    };

    match value {
        Value::List(items) if *head == "$" => {
            let nested_wildcard = rest.contains(&"$");
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match get_path(item, rest) {
                    Value::List(inner) if nested_wildcard => out.extend(inner),
                    other => out.push(other),
                }
            }
            Value::List(out)
        }
        Value::List(items) => head
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get(i))
            .map(|item| get_path(item, rest))
            .unwrap_or(Value::Null),
        Value::Map(map) => map
            .get(*head)
            .map(|next| get_path(next, rest))
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn path_operand(operator: &str, operand: &Value) -> ExprResult<Vec<String>> {
    match operand {
        Value::String(path) => Ok(split_path(path).into_iter().map(str::to_string).collect()),
        Value::List(segments) => segments
            .iter()
            .map(|s| {
                s.as_str().map(str::to_string).ok_or_else(|| {
                    ExprError::invalid_operand(operator, "path segments must be strings")
                })
            })
            .collect(),
        other => Err(ExprError::invalid_operand(
            operator,
            format!("expected a path, found {}", other.type_name()),
        )),
    }
}

pub fn get(operand: &Value, input: &Value, _ev: &Evaluator<'_>) -> ExprResult<Value> {
    let segments = path_operand("$get", operand)?;
    let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
    Ok(get_path(input, &segments))
}

/// `$get` mapped over a list input, producing a flat list for aggregates.
pub fn pluck(operand: &Value, input: &Value, _ev: &Evaluator<'_>) -> ExprResult<Value> {
    let segments = path_operand("$pluck", operand)?;
    let mut segments: Vec<&str> = segments.iter().map(String::as_str).collect();

    match input {
        Value::List(_) => {
            segments.insert(0, "$");
            Ok(get_path(input, &segments))
        }
        Value::Null => Ok(Value::List(Vec::new())),
        other => Ok(get_path(other, &segments)),
    }
}

pub fn literal(operand: &Value, _input: &Value, _ev: &Evaluator<'_>) -> ExprResult<Value> {
    Ok(operand.clone())
}
