//! Query normalization.
//!
//! Folds every legal shorthand of a query document into a
//! [`NormalizedQuery`]. Normalization is pure and recursive: relationship
//! entries in `select` become sub-queries of the relationship's target type,
//! and rendering the result with `to_value` normalizes back to itself.

use crate::config::DEFAULT_MAX_QUERY_DEPTH;
use crate::model::{
    Anchor, Condition, Direction, GroupSpec, NormalizedQuery, OrderKey, Select, Selection, Slice,
    WhereClause,
};
use crate::{QueryError, QueryResult};
use canopy_core::{id_from_value, Map, Value};
use canopy_expr::{Evaluator, OperatorTable};
use canopy_registry::{FieldKind, ResourceTypeDef, Schema};
use std::collections::BTreeMap;

const QUERY_KEYS: &[&str] = &[
    "type", "id", "select", "where", "order", "group", "slice", "limit", "offset",
];
const GROUP_KEYS: &[&str] = &[
    "by",
    "select",
    "aggregates",
    "where",
    "order",
    "slice",
    "limit",
    "offset",
    "group",
];
const SLICE_KEYS: &[&str] = &["limit", "offset", "before", "after"];

/// Normalize a query with the in-memory operator table.
pub fn normalize(schema: &Schema, query: &Value) -> QueryResult<NormalizedQuery> {
    let operators = OperatorTable::in_memory();
    Normalizer::new(schema, &operators).normalize(query)
}

/// Query normalizer.
pub struct Normalizer<'s, 't> {
    schema: &'s Schema,
    evaluator: Evaluator<'t>,
    max_depth: usize,
}

impl<'s, 't> Normalizer<'s, 't> {
    pub fn new(schema: &'s Schema, operators: &'t OperatorTable) -> Self {
        Self {
            schema,
            evaluator: Evaluator::new(operators),
            max_depth: DEFAULT_MAX_QUERY_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Normalize a root query document.
    pub fn normalize(&self, query: &Value) -> QueryResult<NormalizedQuery> {
        let normalized = self.normalize_query(query, None, 1)?;
        if normalized.id.is_some() && normalized.group.is_some() {
            return Err(QueryError::invalid_query(
                "`group` cannot be combined with `id`",
            ));
        }
        Ok(normalized)
    }

    /// A required expression, with every nested operator tag registered.
    fn check_expression(&self, expr: &Value) -> QueryResult<()> {
        self.evaluator.check_expression(expr)?;
        self.evaluator.check_operators(expr)?;
        Ok(())
    }

    fn check_depth(&self, depth: usize) -> QueryResult<()> {
        if depth > self.max_depth {
            return Err(QueryError::QueryTooDeep {
                limit: self.max_depth,
            });
        }
        Ok(())
    }

    // ==================== Queries ====================

    fn normalize_query(
        &self,
        query: &Value,
        expected_type: Option<&str>,
        depth: usize,
    ) -> QueryResult<NormalizedQuery> {
        self.check_depth(depth)?;

        let map = query
            .as_map()
            .ok_or_else(|| QueryError::invalid_query("a query must be an object"))?;
        check_keys(map, QUERY_KEYS, "query")?;

        let type_name = match (map.get("type"), expected_type) {
            (Some(Value::String(name)), Some(expected)) if name != expected => {
                return Err(QueryError::invalid_query(format!(
                    "sub-query type {} does not match relationship target {}",
                    name, expected
                )));
            }
            (Some(Value::String(name)), _) => name.clone(),
            (Some(other), _) => {
                return Err(QueryError::invalid_query(format!(
                    "`type` must be a string, found {}",
                    other.type_name()
                )));
            }
            (None, Some(expected)) => expected.to_string(),
            (None, None) => return Err(QueryError::MissingType),
        };
        let def = self
            .schema
            .get_type(&type_name)
            .ok_or_else(|| QueryError::unknown_type(&type_name))?;

        let id = match map.get("id") {
            None | Some(Value::Null) => None,
            Some(_) if depth > 1 => {
                return Err(QueryError::invalid_query(
                    "`id` is only allowed on the root query",
                ));
            }
            Some(value) => Some(id_from_value(value).ok_or_else(|| {
                QueryError::invalid_query(format!("invalid id: {}", value))
            })?),
        };

        let group = map
            .get("group")
            .map(|g| self.normalize_group(g, depth))
            .transpose()?;

        let select = match map.get("select") {
            Some(select) => self.normalize_select(def, select, depth)?,
            None if group.is_some() => Select::new(),
            None => return Err(QueryError::missing_select(&type_name)),
        };

        Ok(NormalizedQuery {
            type_name,
            id,
            select,
            where_clause: self.normalize_optional_where(map.get("where"))?,
            order: normalize_order(map.get("order"))?,
            slice: normalize_slice(map)?,
            group,
        })
    }

    // ==================== Select ====================

    fn normalize_select(
        &self,
        def: &ResourceTypeDef,
        select: &Value,
        depth: usize,
    ) -> QueryResult<Select> {
        let mut out = Select::new();
        match select {
            Value::String(name) => self.select_name(def, name, depth, &mut out)?,
            Value::List(items) => {
                for item in items {
                    match item {
                        Value::String(name) => self.select_name(def, name, depth, &mut out)?,
                        Value::Map(entries) => {
                            for (key, value) in entries {
                                let selection = self.select_entry(def, key, value, depth)?;
                                out.insert(key.clone(), selection);
                            }
                        }
                        other => {
                            return Err(QueryError::invalid_query(format!(
                                "select items must be names or objects, found {}",
                                other.type_name()
                            )));
                        }
                    }
                }
            }
            Value::Map(entries) => {
                for (key, value) in entries {
                    let selection = self.select_entry(def, key, value, depth)?;
                    out.insert(key.clone(), selection);
                }
            }
            other => {
                return Err(QueryError::invalid_query(format!(
                    "`select` must be a list or an object, found {}",
                    other.type_name()
                )));
            }
        }
        Ok(out)
    }

    /// A bare name: `*`, an attribute, or a relationship selected with `*`.
    fn select_name(
        &self,
        def: &ResourceTypeDef,
        name: &str,
        depth: usize,
        out: &mut Select,
    ) -> QueryResult<()> {
        if name == "*" {
            out.insert(
                def.id_attribute.clone(),
                Selection::Field(def.id_attribute.clone()),
            );
            for attr in def.attr_names() {
                out.insert(attr.to_string(), Selection::Field(attr.to_string()));
            }
            return Ok(());
        }
        let selection = self.select_entry(def, name, &Value::from(name), depth)?;
        out.insert(name.to_string(), selection);
        Ok(())
    }

    fn select_entry(
        &self,
        def: &ResourceTypeDef,
        key: &str,
        value: &Value,
        depth: usize,
    ) -> QueryResult<Selection> {
        match value {
            Value::String(source) => match def.field_kind(source) {
                FieldKind::Relationship(rel) if source == key => {
                    let star = Map::from([("select".to_string(), Value::from("*"))]);
                    let sub =
                        self.normalize_query(&Value::Map(star), Some(&rel.target), depth + 1)?;
                    Ok(Selection::Subquery(Box::new(sub)))
                }
                FieldKind::Relationship(_) => Err(QueryError::invalid_query(format!(
                    "relationship {} cannot be selected under another name ({})",
                    source, key
                ))),
                _ => Ok(Selection::Field(source.clone())),
            },
            Value::Map(_) if self.evaluator.is_expression(value) => {
                self.evaluator.check_operators(value)?;
                Ok(Selection::Expression(value.clone()))
            }
            Value::Map(_) => match def.get_relationship(key) {
                Some(rel) => {
                    let sub = self.normalize_query(value, Some(&rel.target), depth + 1)?;
                    Ok(Selection::Subquery(Box::new(sub)))
                }
                None => {
                    // Surfaces an unregistered operator tag by name.
                    if value
                        .single_entry()
                        .is_some_and(|(tag, _)| tag.starts_with('$'))
                    {
                        self.evaluator.check_expression(value)?;
                    }
                    Err(QueryError::invalid_query(format!(
                        "select entry {} on {} is neither an expression nor a relationship",
                        key, def.name
                    )))
                }
            },
            other => Err(QueryError::invalid_query(format!(
                "select entry {} must be a name, an expression or a sub-query, found {}",
                key,
                other.type_name()
            ))),
        }
    }

    // ==================== Where ====================

    fn normalize_optional_where(&self, value: Option<&Value>) -> QueryResult<Option<WhereClause>> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Map(map)) if map.is_empty() => Ok(None),
            Some(value) => self.normalize_where(value).map(Some),
        }
    }

    /// Normalize a where map. Several entries are an implicit conjunction.
    pub(crate) fn normalize_where(&self, value: &Value) -> QueryResult<WhereClause> {
        let map = value.as_map().ok_or_else(|| {
            QueryError::invalid_query(format!("`where` must be an object, found {}", value))
        })?;

        let mut clauses = map
            .iter()
            .map(|(key, value)| self.where_entry(key, value))
            .collect::<QueryResult<Vec<_>>>()?;

        if clauses.len() == 1 {
            Ok(clauses.remove(0))
        } else {
            Ok(WhereClause::And(clauses))
        }
    }

    fn where_entry(&self, key: &str, value: &Value) -> QueryResult<WhereClause> {
        match key {
            "$and" | "$or" => {
                let items = value.as_list().ok_or_else(|| {
                    QueryError::invalid_query(format!("{} takes a list of where clauses", key))
                })?;
                let clauses = items
                    .iter()
                    .map(|item| self.normalize_where(item))
                    .collect::<QueryResult<Vec<_>>>()?;
                if key == "$and" {
                    Ok(WhereClause::And(clauses))
                } else {
                    Ok(WhereClause::Or(clauses))
                }
            }
            "$not" => Ok(WhereClause::Not(Box::new(self.normalize_where(value)?))),
            tag if tag.starts_with('$') => {
                let expr = Value::Map(Map::from([(tag.to_string(), value.clone())]));
                self.check_expression(&expr)?;
                Ok(WhereClause::Expression(expr))
            }
            path => {
                let condition = if self.evaluator.is_expression(value) {
                    self.evaluator.check_operators(value)?;
                    Condition::Expression(value.clone())
                } else {
                    if value
                        .single_entry()
                        .is_some_and(|(tag, _)| tag.starts_with('$'))
                    {
                        self.evaluator.check_expression(value)?;
                    }
                    Condition::Equals(value.clone())
                };
                Ok(WhereClause::Field {
                    path: path.to_string(),
                    condition,
                })
            }
        }
    }

    // ==================== Group ====================

    fn normalize_group(&self, value: &Value, depth: usize) -> QueryResult<GroupSpec> {
        self.check_depth(depth)?;

        let map = value
            .as_map()
            .ok_or_else(|| QueryError::invalid_query("`group` must be an object"))?;
        check_keys(map, GROUP_KEYS, "group")?;

        let by = match map.get("by") {
            Some(Value::String(name)) => vec![name.clone()],
            Some(Value::List(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        QueryError::invalid_query("`group.by` entries must be names")
                    })
                })
                .collect::<QueryResult<Vec<_>>>()?,
            Some(other) => {
                return Err(QueryError::invalid_query(format!(
                    "`group.by` must be a name or a list of names, found {}",
                    other.type_name()
                )));
            }
            None => return Err(QueryError::invalid_query("`group` requires `by`")),
        };

        let select = match map.get("select") {
            None => by_fields(&by),
            Some(select) => self.normalize_group_select(&by, select)?,
        };

        let mut aggregates = BTreeMap::new();
        match map.get("aggregates") {
            None => {}
            Some(Value::Map(entries)) => {
                for (name, expr) in entries {
                    self.check_expression(expr)?;
                    aggregates.insert(name.clone(), expr.clone());
                }
            }
            Some(other) => {
                return Err(QueryError::invalid_query(format!(
                    "`group.aggregates` must be an object, found {}",
                    other.type_name()
                )));
            }
        }

        let group = map
            .get("group")
            .map(|g| self.normalize_group(g, depth + 1))
            .transpose()?
            .map(Box::new);

        Ok(GroupSpec {
            by,
            select,
            aggregates,
            where_clause: self.normalize_optional_where(map.get("where"))?,
            order: normalize_order(map.get("order"))?,
            slice: normalize_slice(map)?,
            group,
        })
    }

    fn normalize_group_select(&self, by: &[String], select: &Value) -> QueryResult<Select> {
        let mut out = Select::new();
        let add_name = |name: &str, out: &mut Select| {
            if name == "*" {
                out.extend(by_fields(by));
            } else {
                out.insert(name.to_string(), Selection::Field(name.to_string()));
            }
        };
        let items: Vec<&Value> = match select {
            Value::List(items) => items.iter().collect(),
            other => vec![other],
        };
        for item in items {
            match item {
                Value::String(name) => add_name(name, &mut out),
                Value::Map(entries) => {
                    for (key, value) in entries {
                        let selection = match value {
                            Value::String(source) => Selection::Field(source.clone()),
                            _ => {
                                self.check_expression(value)?;
                                Selection::Expression(value.clone())
                            }
                        };
                        out.insert(key.clone(), selection);
                    }
                }
                other => {
                    return Err(QueryError::invalid_query(format!(
                        "group select items must be names or objects, found {}",
                        other.type_name()
                    )));
                }
            }
        }
        Ok(out)
    }
}

fn by_fields(by: &[String]) -> Select {
    by.iter()
        .map(|name| (name.clone(), Selection::Field(name.clone())))
        .collect()
}

fn check_keys(map: &Map, allowed: &[&str], scope: &str) -> QueryResult<()> {
    match map.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(QueryError::invalid_query(format!(
            "unexpected key {} in {}",
            key, scope
        ))),
        None => Ok(()),
    }
}

// ==================== Order ====================

fn normalize_order(value: Option<&Value>) -> QueryResult<Vec<OrderKey>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::List(items)) if items.is_empty() => {
            Err(QueryError::invalid_query("`order` must not be empty"))
        }
        Some(Value::List(items)) => items.iter().map(order_key).collect(),
        Some(single) => Ok(vec![order_key(single)?]),
    }
}

fn order_key(value: &Value) -> QueryResult<OrderKey> {
    match value {
        Value::String(field) => Ok(OrderKey::asc(field.as_str())),
        Value::Map(_) => {
            let (field, direction) = value.single_entry().ok_or_else(|| {
                QueryError::invalid_query("each order entry must have exactly one key")
            })?;
            let direction = match direction.as_str() {
                Some("asc") => Direction::Asc,
                Some("desc") => Direction::Desc,
                _ => {
                    return Err(QueryError::invalid_query(format!(
                        "order direction for {} must be \"asc\" or \"desc\", found {}",
                        field, direction
                    )));
                }
            };
            Ok(OrderKey {
                field: field.to_string(),
                direction,
            })
        }
        other => Err(QueryError::invalid_query(format!(
            "order entries must be names or objects, found {}",
            other.type_name()
        ))),
    }
}

// ==================== Slice ====================

fn normalize_slice(map: &Map) -> QueryResult<Slice> {
    let top_limit = map.get("limit");
    let top_offset = map.get("offset");

    match map.get("slice") {
        Some(_) if top_limit.is_some() || top_offset.is_some() => Err(QueryError::invalid_query(
            "use either `slice` or top-level `limit`/`offset`, not both",
        )),
        None | Some(Value::Null) => Ok(Slice {
            limit: top_limit.map(|v| count_value("limit", v)).transpose()?,
            offset: top_offset.map(|v| count_value("offset", v)).transpose()?,
            ..Slice::default()
        }),
        Some(Value::Map(slice)) => {
            check_keys(slice, SLICE_KEYS, "slice")?;
            Ok(Slice {
                limit: slice
                    .get("limit")
                    .map(|v| count_value("limit", v))
                    .transpose()?,
                offset: slice
                    .get("offset")
                    .map(|v| count_value("offset", v))
                    .transpose()?,
                before: slice.get("before").map(|v| anchor("before", v)).transpose()?,
                after: slice.get("after").map(|v| anchor("after", v)).transpose()?,
            })
        }
        Some(other) => Err(QueryError::invalid_query(format!(
            "`slice` must be an object, found {}",
            other.type_name()
        ))),
    }
}

fn count_value(name: &str, value: &Value) -> QueryResult<usize> {
    value
        .as_int()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| {
            QueryError::invalid_query(format!(
                "`{}` must be a non-negative integer, found {}",
                name, value
            ))
        })
}

fn anchor(name: &str, value: &Value) -> QueryResult<Anchor> {
    value.as_map().cloned().ok_or_else(|| {
        QueryError::invalid_anchor(format!(
            "`{}` must map order keys to values, found {}",
            name, value
        ))
    })
}
