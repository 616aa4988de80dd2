//! Pre-execution validation.
//!
//! Every field a query filters, orders or groups on must be known before a
//! single resource is read. `select` is lenient: an undeclared name there
//! simply yields no value.

use crate::model::{GroupSpec, NormalizedQuery, Selection, WhereClause};
use crate::order::validate_slice;
use crate::{QueryError, QueryResult};
use canopy_core::Value;
use canopy_expr::split_path;
use canopy_registry::{ResourceTypeDef, Schema};

/// Validate a normalized query against the schema.
pub fn validate(schema: &Schema, query: &NormalizedQuery) -> QueryResult<()> {
    let def = schema
        .get_type(&query.type_name)
        .ok_or_else(|| QueryError::unknown_type(&query.type_name))?;

    for (key, selection) in &query.select {
        if let Selection::Subquery(sub) = selection {
            let rel = def
                .get_relationship(key)
                .ok_or_else(|| QueryError::unknown_field(&def.name, key))?;
            if rel.target != sub.type_name {
                return Err(QueryError::invalid_query(format!(
                    "sub-query {} must query {}, not {}",
                    key, rel.target, sub.type_name
                )));
            }
            if !rel.is_many() && sub.group.is_some() {
                return Err(QueryError::invalid_query(format!(
                    "to-one relationship {} cannot be grouped",
                    key
                )));
            }
            validate(schema, sub)?;
        }
    }

    if let Some(clause) = &query.where_clause {
        check_where(clause, &def.name, &|head: &str| {
            !def.field_kind(head).is_unknown()
        })?;
    }
    for key in &query.order {
        if !def.field_kind(&key.field).is_attribute() {
            return Err(QueryError::unknown_field(&def.name, &key.field));
        }
    }
    validate_slice(&query.order, &query.slice)?;

    if let Some(group) = &query.group {
        let known = row_fields(def, query);
        validate_group(group, &known, &format!("{}.group", def.name))?;
    }
    Ok(())
}

/// Fields carried by the rows a group partitions.
fn row_fields(def: &ResourceTypeDef, query: &NormalizedQuery) -> Vec<String> {
    let mut fields = vec!["id".to_string(), def.id_attribute.clone()];
    fields.extend(def.attr_names().map(str::to_string));
    fields.extend(query.select.keys().cloned());
    fields
}

fn validate_group(group: &GroupSpec, known: &[String], scope: &str) -> QueryResult<()> {
    let is_known = |name: &str| known.iter().any(|k| k == name);

    for by in &group.by {
        if !is_known(by) {
            return Err(QueryError::unknown_field(scope, by));
        }
    }

    for selection in group.select.values() {
        if let Selection::Field(source) = selection {
            if !group.by.contains(source) && !group.aggregates.contains_key(source) {
                return Err(QueryError::unknown_field(scope, source));
            }
        }
    }

    for expr in group.aggregates.values() {
        check_plucked_fields(expr, &is_known, scope)?;
    }

    let outputs: Vec<String> = group.output_keys().map(str::to_string).collect();
    let is_output = |name: &str| outputs.iter().any(|k| k == name);
    if let Some(clause) = &group.where_clause {
        check_where(clause, scope, &is_output)?;
    }
    for key in &group.order {
        if !is_output(&key.field) {
            return Err(QueryError::unknown_field(scope, &key.field));
        }
    }
    validate_slice(&group.order, &group.slice)?;

    if let Some(inner) = &group.group {
        validate_group(inner, &outputs, &format!("{}.group", scope))?;
    }
    Ok(())
}

/// Check the head segment of every field path in a where clause.
fn check_where(
    clause: &WhereClause,
    scope: &str,
    is_known: &dyn Fn(&str) -> bool,
) -> QueryResult<()> {
    match clause {
        WhereClause::And(clauses) | WhereClause::Or(clauses) => clauses
            .iter()
            .try_for_each(|c| check_where(c, scope, is_known)),
        WhereClause::Not(inner) => check_where(inner, scope, is_known),
        WhereClause::Expression(_) => Ok(()),
        WhereClause::Field { path, .. } => {
            let head = split_path(path).first().copied().unwrap_or_default();
            if is_known(head) {
                Ok(())
            } else {
                Err(QueryError::unknown_field(scope, path))
            }
        }
    }
}

/// Check the fields `$pluck` reads inside an aggregate.
fn check_plucked_fields(
    expr: &Value,
    is_known: &dyn Fn(&str) -> bool,
    scope: &str,
) -> QueryResult<()> {
    match expr {
        Value::Map(map) => {
            if let Some((tag, operand)) = expr.single_entry() {
                if tag == "$pluck" {
                    let head = match operand {
                        Value::String(path) => split_path(path).first().map(|s| s.to_string()),
                        Value::List(segments) => segments
                            .first()
                            .and_then(Value::as_str)
                            .map(str::to_string),
                        _ => None,
                    };
                    if let Some(head) = head.filter(|h| h != "$") {
                        if !is_known(&head) {
                            return Err(QueryError::unknown_field(scope, head));
                        }
                    }
                    return Ok(());
                }
            }
            map.values()
                .try_for_each(|v| check_plucked_fields(v, is_known, scope))
        }
        Value::List(items) => items
            .iter()
            .try_for_each(|v| check_plucked_fields(v, is_known, scope)),
        _ => Ok(()),
    }
}
