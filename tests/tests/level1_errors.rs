//! Level 1 - Query errors.
//!
//! Every malformed query is rejected up front as a caller error.

use canopy_tests::prelude::*;
use serde_json::Value as Json;

fn bears() -> Scenario {
    Scenario::new("errors")
        .schema(care_bears_schema())
        .graph(care_bears_graph())
}

/// A chain of `bestFriend` sub-queries `levels` deep.
fn best_friend_chain(levels: usize) -> Json {
    let mut select = json!(["name"]);
    for _ in 0..levels {
        select = json!({"name": "name", "bestFriend": {"select": select}});
    }
    json!({"type": "bears", "id": "2", "select": select})
}

mod shape {
    use super::*;

    pub fn scenario() -> Scenario {
        bears()
            .step(
                "missing_type",
                json!({"select": ["name"]}),
                |a| a.caller_error().error("missing its root `type`"),
            )
            .step(
                "missing_select",
                json!({"type": "bears"}),
                |a| a.caller_error().error("missing `select`"),
            )
            .step(
                "unknown_type",
                json!({"type": "unicorns", "select": ["name"]}),
                |a| a.caller_error().error("Unknown type: unicorns"),
            )
            .step(
                "unknown_query_key",
                json!({"type": "bears", "select": ["name"], "filter": {}}),
                |a| a.caller_error().error("filter"),
            )
            .step(
                "slice_and_limit",
                json!({"type": "bears", "select": ["name"], "limit": 1, "slice": {"limit": 2}}),
                |a| a.caller_error().error_matching(r"either `slice` or top-level"),
            )
            .step(
                "bad_direction",
                json!({"type": "bears", "select": ["name"], "order": {"name": "sideways"}}),
                |a| a.caller_error().error("Invalid query"),
            )
            .step(
                "subquery_type_mismatch",
                json!({
                    "type": "bears",
                    "select": {"home": {"type": "bears", "select": ["name"]}}
                }),
                |a| a.caller_error().error("does not match relationship target"),
            )
            .step(
                "renamed_relationship",
                json!({"type": "bears", "select": {"house": "home"}}),
                |a| a.caller_error(),
            )
    }

    #[test]
    fn test_malformed_queries() {
        scenario().run().unwrap();
    }
}

mod fields {
    use super::*;

    pub fn scenario() -> Scenario {
        bears()
            .step(
                "unknown_where_field",
                json!({"type": "bears", "select": ["name"], "where": {"wings": 2}}),
                |a| a.caller_error().error("Unknown field: wings on bears"),
            )
            .step(
                "unknown_nested_where_field",
                json!({
                    "type": "homes",
                    "select": {"residents": {"select": ["name"], "where": {"wings": 2}}}
                }),
                |a| a.caller_error().error("Unknown field: wings"),
            )
            .step(
                "order_by_relationship",
                json!({"type": "bears", "select": ["name"], "order": "home"}),
                |a| a.caller_error().error("Unknown field: home"),
            )
            .step(
                "unknown_group_key",
                json!({"type": "matches", "group": {"by": "venue"}}),
                |a| a.caller_error().error("Unknown field: venue"),
            )
            .step(
                "group_where_outside_outputs",
                json!({
                    "type": "matches",
                    "group": {
                        "by": "team",
                        "aggregates": {"n": {"$count": null}},
                        "where": {"goals": {"$gt": 1}}
                    }
                }),
                |a| a.caller_error().error_matching(r"Unknown field: goals on matches\.group"),
            )
            .step(
                "grouping_a_to_one_relationship",
                json!({
                    "type": "bears",
                    "select": {"home": {"select": ["name"], "group": {"by": "name"}}}
                }),
                |a| a.caller_error(),
            )
    }

    #[test]
    fn test_unknown_fields() {
        scenario().run().unwrap();
    }
}

mod expressions {
    use super::*;

    pub fn scenario() -> Scenario {
        bears()
            .step(
                "unregistered_operator_in_select",
                json!({"type": "bears", "select": {"x": {"$frobnicate": "name"}}}),
                |a| a.caller_error().error("Unknown operator: $frobnicate"),
            )
            .step(
                "unregistered_operator_in_where",
                json!({"type": "bears", "select": ["name"], "where": {"name": {"$like": "C%"}}}),
                |a| a.caller_error().error("Unknown operator: $like"),
            )
            .step(
                "unregistered_aggregate",
                json!({"type": "matches", "group": {"by": [], "aggregates": {"x": {"$mode": null}}}}),
                |a| a.caller_error().error("Unknown operator: $mode"),
            )
            .step(
                "unregistered_operator_under_not",
                json!({
                    "type": "bears",
                    "select": ["name"],
                    "where": {"yearIntroduced": {"$not": {"$eqq": 1982}}}
                }),
                |a| a.caller_error().error("Unknown operator: $eqq"),
            )
            .step(
                "unregistered_operator_under_and",
                json!({
                    "type": "bears",
                    "select": ["name"],
                    "where": {"yearIntroduced": {"$and": [{"$gtt": 3000}]}}
                }),
                |a| a.caller_error().error("Unknown operator: $gtt"),
            )
            .step(
                "unregistered_operator_in_condition",
                json!({
                    "type": "bears",
                    "select": {"x": {"$if": {"if": {"$gett": "home"}, "then": 1, "else": 2}}}
                }),
                |a| a.caller_error().error("Unknown operator: $gett"),
            )
            .step(
                "unregistered_operator_inside_aggregate",
                json!({
                    "type": "matches",
                    "group": {"by": [], "aggregates": {"total": {"$sum": {"$plukc": "goals"}}}}
                }),
                |a| a.caller_error().error("Unknown operator: $plukc"),
            )
            .step(
                "quoted_operator_is_data",
                json!({"type": "bears", "id": "1", "select": {"x": {"$literal": {"$eqq": 1}}}}),
                |a| a.returns(json!({"x": {"$eqq": 1}})),
            )
            .step(
                "malformed_operand",
                json!({"type": "bears", "select": {"x": {"$if": {"then": 1}}}}),
                |a| a.caller_error().error("Invalid operand for $if"),
            )
    }

    #[test]
    fn test_expression_errors() {
        scenario().run().unwrap();
    }
}

mod depth {
    use super::*;

    pub fn scenario() -> Scenario {
        bears()
            .step("within_limit", best_friend_chain(8), |a| {
                a.first(json!({"name": "Cheer Bear"}))
            })
            .step("too_deep", best_friend_chain(40), |a| {
                a.caller_error().error("maximum depth of 32")
            })
    }

    #[test]
    fn test_query_depth_limit() {
        scenario().run().unwrap();
    }
}
