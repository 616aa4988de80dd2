//! Graph projection.
//!
//! Resolves a normalized query against a graph snapshot. Recursion follows
//! the query's own sub-queries, one relationship hop per level, so cyclic
//! relationships terminate with the query tree.

use crate::filter;
use crate::group::group_rows;
use crate::model::{NormalizedQuery, Selection};
use crate::order::apply_order_and_slice;
use crate::{QueryError, QueryResult};
use canopy_core::{Map, Ref, RelationshipValue, Resource, Value};
use canopy_expr::Evaluator;
use canopy_graph::Graph;
use canopy_registry::Schema;
use tracing::trace;

/// Projects resources into result rows.
pub struct Projector<'a> {
    schema: &'a Schema,
    graph: &'a Graph,
    evaluator: Evaluator<'a>,
}

impl<'a> Projector<'a> {
    pub fn new(schema: &'a Schema, graph: &'a Graph, evaluator: Evaluator<'a>) -> Self {
        Self {
            schema,
            graph,
            evaluator,
        }
    }

    /// Resolve a query to a row, an array of rows, or null.
    pub fn project(&self, query: &NormalizedQuery) -> QueryResult<Value> {
        if let Some(id) = &query.id {
            return match self.graph.get(&query.type_name, id) {
                Some(resource) => Ok(Value::Map(self.project_resource(query, resource)?)),
                None => Ok(Value::Null),
            };
        }

        let resources: Vec<&'a Resource> =
            self.graph.resources_of_type(&query.type_name).collect();
        self.project_collection(query, resources)
    }

    /// Filter, order, slice and then project or group a set of resources.
    fn project_collection(
        &self,
        query: &NormalizedQuery,
        resources: Vec<&'a Resource>,
    ) -> QueryResult<Value> {
        let total = resources.len();
        let mut kept = Vec::with_capacity(total);
        for resource in resources {
            if self.accepts(query, resource)? {
                kept.push(resource);
            }
        }
        trace!(
            type_name = %query.type_name,
            total,
            kept = kept.len(),
            "filtered resources"
        );

        let id_attribute = self.id_attribute(&query.type_name);
        let kept = apply_order_and_slice(kept, &query.order, &query.slice, |resource, field| {
            field_value(resource, field, id_attribute).unwrap_or_default()
        })?;

        match &query.group {
            Some(group) => {
                let rows = kept
                    .into_iter()
                    .map(|resource| self.group_input_row(query, resource))
                    .collect::<QueryResult<Vec<_>>>()?;
                let grouped = group_rows(group, rows, &self.evaluator)?;
                Ok(Value::List(grouped.into_iter().map(Value::Map).collect()))
            }
            None => kept
                .into_iter()
                .map(|resource| self.project_resource(query, resource).map(Value::Map))
                .collect::<QueryResult<Vec<_>>>()
                .map(Value::List),
        }
    }

    fn accepts(&self, query: &NormalizedQuery, resource: &'a Resource) -> QueryResult<bool> {
        match &query.where_clause {
            Some(clause) => {
                let view = self.view(resource)?;
                filter::matches(clause, &view, &self.evaluator)
            }
            None => Ok(true),
        }
    }

    /// Project one resource through the query's select.
    fn project_resource(&self, query: &NormalizedQuery, resource: &'a Resource) -> QueryResult<Map> {
        let id_attribute = self.id_attribute(&resource.type_name);
        let mut view: Option<Value> = None;
        let mut row = Map::new();

        for (key, selection) in &query.select {
            match selection {
                Selection::Field(source) => {
                    if let Some(value) = field_value(resource, source, id_attribute) {
                        row.insert(key.clone(), value);
                    } else if self
                        .schema
                        .get_type(&resource.type_name)
                        .is_some_and(|def| def.get_attr(source).is_some())
                    {
                        row.insert(key.clone(), Value::Null);
                    }
                }
                Selection::Expression(expr) => {
                    let input = match view.take() {
                        Some(view) => view,
                        None => self.view(resource)?,
                    };
                    row.insert(key.clone(), self.evaluator.evaluate(expr, &input)?);
                    view = Some(input);
                }
                Selection::Subquery(sub) => {
                    row.insert(key.clone(), self.project_relationship(resource, key, sub)?);
                }
            }
        }
        Ok(row)
    }

    fn project_relationship(
        &self,
        resource: &'a Resource,
        name: &str,
        sub: &NormalizedQuery,
    ) -> QueryResult<Value> {
        let many = self
            .schema
            .get_relationship(&resource.type_name, name)
            .is_some_and(|rel| rel.is_many());
        let refs: Vec<&Ref> = resource
            .get_relationship(name)
            .map(|value| value.refs().collect())
            .unwrap_or_default();

        if many {
            let targets = refs
                .into_iter()
                .map(|target| self.resolve(resource, name, target))
                .collect::<QueryResult<Vec<_>>>()?;
            return self.project_collection(sub, targets);
        }

        match refs.first() {
            Some(target) => {
                let target = self.resolve(resource, name, target)?;
                if self.accepts(sub, target)? {
                    Ok(Value::Map(self.project_resource(sub, target)?))
                } else {
                    Ok(Value::Null)
                }
            }
            None => Ok(Value::Null),
        }
    }

    /// Rows fed to grouping: id and attributes, overlaid with the selection.
    fn group_input_row(&self, query: &NormalizedQuery, resource: &'a Resource) -> QueryResult<Map> {
        let mut row = base_row(resource, self.id_attribute(&resource.type_name));
        row.extend(self.project_resource(query, resource)?);
        Ok(row)
    }

    /// Input for expressions and where clauses: id, attributes and each
    /// relationship resolved one hop (targets carry their own refs).
    fn view(&self, resource: &'a Resource) -> QueryResult<Value> {
        let mut view = base_row(resource, self.id_attribute(&resource.type_name));

        for (name, value) in &resource.relationships {
            let resolved = match value {
                RelationshipValue::One(None) => Value::Null,
                RelationshipValue::One(Some(target)) => {
                    self.related_row(self.resolve(resource, name, target)?)
                }
                RelationshipValue::Many(targets) => Value::List(
                    targets
                        .iter()
                        .map(|t| self.resolve(resource, name, t).map(|r| self.related_row(r)))
                        .collect::<QueryResult<Vec<_>>>()?,
                ),
            };
            view.insert(name.clone(), resolved);
        }
        Ok(Value::Map(view))
    }

    fn related_row(&self, resource: &Resource) -> Value {
        let mut row = base_row(resource, self.id_attribute(&resource.type_name));
        for (name, value) in &resource.relationships {
            row.insert(name.clone(), value.to_value());
        }
        Value::Map(row)
    }

    fn resolve(&self, from: &Resource, relationship: &str, target: &Ref) -> QueryResult<&'a Resource> {
        self.graph
            .resolve(target)
            .ok_or_else(|| QueryError::DanglingReference {
                from: from.to_ref().to_string(),
                relationship: relationship.to_string(),
                target: target.to_string(),
            })
    }

    fn id_attribute(&self, type_name: &str) -> &'a str {
        self.schema.id_attribute(type_name).unwrap_or("id")
    }
}

/// Read an attribute or the id. `None` when the resource carries no value.
fn field_value(resource: &Resource, field: &str, id_attribute: &str) -> Option<Value> {
    match resource.get_attr(field) {
        Some(value) => Some(value.clone()),
        None if field == id_attribute || field == "id" => Some(Value::from(resource.id.as_str())),
        None => None,
    }
}

fn base_row(resource: &Resource, id_attribute: &str) -> Map {
    let mut row = resource.attributes.clone();
    row.entry(id_attribute.to_string())
        .or_insert_with(|| Value::from(resource.id.as_str()));
    row.entry("id".to_string())
        .or_insert_with(|| Value::from(resource.id.as_str()));
    row
}
