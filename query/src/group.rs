//! Grouping and aggregation.

use crate::filter;
use crate::model::{GroupSpec, Selection};
use crate::order::apply_order_and_slice;
use crate::QueryResult;
use canopy_core::{Map, Value};
use canopy_expr::Evaluator;
use std::collections::HashMap;
use tracing::trace;

/// Rows sharing one `by` tuple, in first-appearance order.
struct Partition {
    key: Vec<Value>,
    members: Vec<Value>,
}

fn partition(by: &[String], rows: Vec<Map>) -> Vec<Partition> {
    let mut partitions: Vec<Partition> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    if by.is_empty() {
        // Grand total: one partition, even over no rows.
        partitions.push(Partition {
            key: Vec::new(),
            members: rows.into_iter().map(Value::Map).collect(),
        });
        return partitions;
    }

    for row in rows {
        let key: Vec<Value> = by
            .iter()
            .map(|field| row.get(field).cloned().unwrap_or_default())
            .collect();
        let signature = Value::List(key.clone()).to_string();
        let slot = *index.entry(signature).or_insert_with(|| {
            partitions.push(Partition {
                key,
                members: Vec::new(),
            });
            partitions.len() - 1
        });
        partitions[slot].members.push(Value::Map(row));
    }
    partitions
}

/// Group rows by `spec`, applying its filter, order, slice and regrouping.
pub fn group_rows(spec: &GroupSpec, rows: Vec<Map>, ev: &Evaluator<'_>) -> QueryResult<Vec<Map>> {
    let input_count = rows.len();
    let partitions = partition(&spec.by, rows);
    trace!(
        rows = input_count,
        partitions = partitions.len(),
        by = ?spec.by,
        "partitioned rows"
    );

    let mut grouped = Vec::with_capacity(partitions.len());
    for part in partitions {
        let members = Value::List(part.members);

        let mut context: Map = spec.by.iter().cloned().zip(part.key).collect();
        let mut aggregates = Map::new();
        for (name, expr) in &spec.aggregates {
            let value = ev.evaluate_required(expr, &members)?;
            aggregates.insert(name.clone(), value);
        }
        context.extend(aggregates.clone());
        let context = Value::Map(context);

        let mut row = Map::new();
        for (key, selection) in &spec.select {
            let value = match selection {
                Selection::Field(source) => match context.get(source) {
                    Some(value) => value.clone(),
                    None => continue,
                },
                Selection::Expression(expr) => ev.evaluate(expr, &context)?,
                // Group levels never select relationships.
                Selection::Subquery(_) => continue,
            };
            row.insert(key.clone(), value);
        }
        row.extend(aggregates);

        if filter::passes(spec.where_clause.as_ref(), &Value::Map(row.clone()), ev)? {
            grouped.push(row);
        }
    }

    let grouped = apply_order_and_slice(grouped, &spec.order, &spec.slice, |row, field| {
        row.get(field).cloned().unwrap_or_default()
    })?;

    match &spec.group {
        Some(inner) => group_rows(inner, grouped, ev),
        None => Ok(grouped),
    }
}
