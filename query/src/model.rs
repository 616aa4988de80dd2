//! Normalized query model.
//!
//! The normalizer turns every legal shorthand into these types: `select` is
//! always a map, `order` is always a list and top-level `limit`/`offset`
//! live in the slice. `to_value` renders the canonical document form, which
//! normalizes back to an identical model.

use canopy_core::{Map, Value};
use std::collections::BTreeMap;

/// Output key -> selection.
pub type Select = BTreeMap<String, Selection>;

/// Anchor for cursor pagination: order key -> value.
pub type Anchor = Map;

/// A query in canonical form.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedQuery {
    /// Resource type queried.
    pub type_name: String,
    /// Single-resource lookup.
    pub id: Option<String>,
    /// Output fields.
    pub select: Select,
    /// Resource filter.
    pub where_clause: Option<WhereClause>,
    /// Sort keys; empty keeps graph order.
    pub order: Vec<OrderKey>,
    /// Window over the ordered resources.
    pub slice: Slice,
    /// Grouping applied after filtering and slicing.
    pub group: Option<GroupSpec>,
}

/// How one output field is produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Copy an attribute (or the id) by its source name.
    Field(String),
    /// Evaluate an expression against the resource view.
    Expression(Value),
    /// Resolve the relationship named by the output key with a sub-query.
    Subquery(Box<NormalizedQuery>),
}

/// A resource or group-row filter.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereClause {
    /// All clauses hold. A multi-entry where map normalizes to this.
    And(Vec<WhereClause>),
    /// Any clause holds.
    Or(Vec<WhereClause>),
    /// The clause does not hold.
    Not(Box<WhereClause>),
    /// A condition on the value at a dotted path.
    Field { path: String, condition: Condition },
    /// An expression over the whole row, tested for truthiness.
    Expression(Value),
}

/// Test applied to the value at a where path.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Plain value: equality.
    Equals(Value),
    /// Expression evaluated with the path's value as input.
    Expression(Value),
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderKey {
    pub field: String,
    pub direction: Direction,
}

impl OrderKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }
}

/// Pagination window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slice {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub before: Option<Anchor>,
    pub after: Option<Anchor>,
}

impl Slice {
    /// True when the slice keeps every row.
    pub fn is_unbounded(&self) -> bool {
        self.limit.is_none() && self.offset.is_none() && !self.has_anchor()
    }

    pub fn has_anchor(&self) -> bool {
        self.before.is_some() || self.after.is_some()
    }
}

/// A grouping level.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSpec {
    /// Partition keys; empty means a single grand-total group.
    pub by: Vec<String>,
    /// Output fields, evaluated against the {by, aggregates} context.
    pub select: Select,
    /// Aggregate name -> expression over the partition's rows.
    pub aggregates: BTreeMap<String, Value>,
    /// Filter over finished group rows.
    pub where_clause: Option<WhereClause>,
    pub order: Vec<OrderKey>,
    pub slice: Slice,
    /// Regrouping of this level's output.
    pub group: Option<Box<GroupSpec>>,
}

impl GroupSpec {
    /// Keys every finished group row can carry.
    pub fn output_keys(&self) -> impl Iterator<Item = &str> {
        self.select
            .keys()
            .chain(self.aggregates.keys())
            .map(String::as_str)
    }
}

// ==================== Rendering ====================

fn entry(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Map(map)
}

pub(crate) fn select_to_value(select: &Select) -> Value {
    Value::Map(
        select
            .iter()
            .map(|(key, selection)| {
                let value = match selection {
                    Selection::Field(source) => Value::from(source.as_str()),
                    Selection::Expression(expr) => expr.clone(),
                    Selection::Subquery(query) => query.to_value(),
                };
                (key.clone(), value)
            })
            .collect(),
    )
}

fn order_to_value(order: &[OrderKey]) -> Value {
    Value::List(
        order
            .iter()
            .map(|key| entry(&key.field, Value::from(key.direction.as_str())))
            .collect(),
    )
}

impl Slice {
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if let Some(limit) = self.limit {
            map.insert("limit".to_string(), Value::from(limit));
        }
        if let Some(offset) = self.offset {
            map.insert("offset".to_string(), Value::from(offset));
        }
        if let Some(before) = &self.before {
            map.insert("before".to_string(), Value::Map(before.clone()));
        }
        if let Some(after) = &self.after {
            map.insert("after".to_string(), Value::Map(after.clone()));
        }
        Value::Map(map)
    }
}

impl WhereClause {
    pub fn to_value(&self) -> Value {
        match self {
            WhereClause::And(clauses) => entry(
                "$and",
                Value::List(clauses.iter().map(WhereClause::to_value).collect()),
            ),
            WhereClause::Or(clauses) => entry(
                "$or",
                Value::List(clauses.iter().map(WhereClause::to_value).collect()),
            ),
            WhereClause::Not(clause) => entry("$not", clause.to_value()),
            WhereClause::Field { path, condition } => match condition {
                Condition::Equals(value) | Condition::Expression(value) => {
                    entry(path, value.clone())
                }
            },
            WhereClause::Expression(expr) => expr.clone(),
        }
    }
}

/// Insert the optional clauses shared by queries and group levels.
fn insert_shape(
    map: &mut Map,
    where_clause: &Option<WhereClause>,
    order: &[OrderKey],
    slice: &Slice,
) {
    if let Some(clause) = where_clause {
        map.insert("where".to_string(), clause.to_value());
    }
    if !order.is_empty() {
        map.insert("order".to_string(), order_to_value(order));
    }
    if !slice.is_unbounded() {
        map.insert("slice".to_string(), slice.to_value());
    }
}

impl GroupSpec {
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(
            "by".to_string(),
            Value::List(self.by.iter().map(|b| Value::from(b.as_str())).collect()),
        );
        map.insert("select".to_string(), select_to_value(&self.select));
        if !self.aggregates.is_empty() {
            map.insert(
                "aggregates".to_string(),
                Value::Map(self.aggregates.clone()),
            );
        }
        insert_shape(&mut map, &self.where_clause, &self.order, &self.slice);
        if let Some(group) = &self.group {
            map.insert("group".to_string(), group.to_value());
        }
        Value::Map(map)
    }
}

impl NormalizedQuery {
    /// Render the canonical document form.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::from(self.type_name.as_str()));
        if let Some(id) = &self.id {
            map.insert("id".to_string(), Value::from(id.as_str()));
        }
        map.insert("select".to_string(), select_to_value(&self.select));
        insert_shape(&mut map, &self.where_clause, &self.order, &self.slice);
        if let Some(group) = &self.group {
            map.insert("group".to_string(), group.to_value());
        }
        Value::Map(map)
    }

    /// Depth of the sub-query tree (1 for a query without sub-queries).
    pub fn depth(&self) -> usize {
        1 + self
            .select
            .values()
            .filter_map(|s| match s {
                Selection::Subquery(sub) => Some(sub.depth()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }
}
