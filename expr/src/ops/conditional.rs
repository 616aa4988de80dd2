//! Conditional operators.

use crate::{Evaluator, ExprError, ExprResult};
use canopy_core::Value;

/// `{$if: {if, then, else}}`. A missing `else` yields null.
pub fn if_then_else(operand: &Value, input: &Value, ev: &Evaluator<'_>) -> ExprResult<Value> {
    let map = operand
        .as_map()
        .ok_or_else(|| ExprError::invalid_operand("$if", "expected {if, then, else}"))?;
    let condition = map
        .get("if")
        .ok_or_else(|| ExprError::invalid_operand("$if", "missing `if`"))?;

    let branch = if ev.evaluate_operand(condition, input)?.is_truthy() {
        map.get("then")
    } else {
        map.get("else")
    };

    match branch {
        Some(expr) => ev.evaluate(expr, input),
        None => Ok(Value::Null),
    }
}

/// `{$case: {value, cases: [{when, then}], default}}`.
///
/// `value` is evaluated against the input (the input itself when absent).
/// Cases are tried in order: an expression `when` is evaluated against the
/// value and must be truthy, a plain `when` must equal the value. `then`
/// and `default` are evaluated against the original input.
pub fn case(operand: &Value, input: &Value, ev: &Evaluator<'_>) -> ExprResult<Value> {
    let map = operand
        .as_map()
        .ok_or_else(|| ExprError::invalid_operand("$case", "expected {value, cases, default}"))?;

    let subject = match map.get("value") {
        Some(expr) => ev.evaluate(expr, input)?,
        None => input.clone(),
    };

    let cases = match map.get("cases") {
        Some(Value::List(cases)) => cases.as_slice(),
        Some(_) => return Err(ExprError::invalid_operand("$case", "`cases` must be a list")),
        None => &[],
    };

    for case in cases {
        let (Some(when), Some(then)) = (case.get("when"), case.get("then")) else {
            return Err(ExprError::invalid_operand(
                "$case",
                "each case needs `when` and `then`",
            ));
        };

        let tagged = when
            .single_entry()
            .is_some_and(|(tag, _)| tag.starts_with('$'));
        let matched = if tagged || ev.is_expression(when) {
            ev.evaluate_operand(when, &subject)?.is_truthy()
        } else {
            subject.loose_eq(when)
        };
        if matched {
            return ev.evaluate(then, input);
        }
    }

    match map.get("default") {
        Some(expr) => ev.evaluate(expr, input),
        None => Ok(Value::Null),
    }
}
