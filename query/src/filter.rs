//! Where-clause evaluation.

use crate::model::{Condition, WhereClause};
use crate::QueryResult;
use canopy_core::Value;
use canopy_expr::{get_path, split_path, Evaluator};

/// Test a row against a where clause.
pub fn matches(clause: &WhereClause, row: &Value, ev: &Evaluator<'_>) -> QueryResult<bool> {
    match clause {
        WhereClause::And(clauses) => {
            for clause in clauses {
                if !matches(clause, row, ev)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        WhereClause::Or(clauses) => {
            for clause in clauses {
                if matches(clause, row, ev)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        WhereClause::Not(clause) => Ok(!matches(clause, row, ev)?),
        WhereClause::Expression(expr) => Ok(ev.evaluate(expr, row)?.is_truthy()),
        WhereClause::Field { path, condition } => {
            let value = get_path(row, &split_path(path));
            match condition {
                Condition::Equals(expected) => Ok(value.loose_eq(expected)),
                Condition::Expression(expr) => Ok(ev.evaluate(expr, &value)?.is_truthy()),
            }
        }
    }
}

/// Test a row against an optional where clause.
pub fn passes(clause: Option<&WhereClause>, row: &Value, ev: &Evaluator<'_>) -> QueryResult<bool> {
    match clause {
        Some(clause) => matches(clause, row, ev),
        None => Ok(true),
    }
}
