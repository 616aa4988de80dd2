//! Level 3 - Property tests for normalization, ordering and grouping.

use canopy_core::{attrs, Map, Value};
use canopy_expr::{Evaluator, OperatorTable};
use canopy_query::{
    apply_order_and_slice, group_rows, normalize, validate_slice, GroupSpec, OrderKey, Select,
    Selection, Slice,
};
use canopy_registry::Schema;
use canopy_tests::fixtures::care_bears_schema;
use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeMap;

fn field(row: &Map, name: &str) -> Value {
    row.get(name).cloned().unwrap_or_default()
}

fn match_rows() -> impl Strategy<Value = Vec<Map>> {
    prop::collection::vec(
        (0..6i64, 10..14i64, prop_oneof![Just("Bears"), Just("Cousins")]),
        0..20,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (goals, age, team))| {
                attrs! {"id" => i as i64, "goals" => goals, "ageGroup" => age, "team" => team}
            })
            .collect()
    })
}

fn group_by(by: &[&str], aggregates: serde_json::Value) -> GroupSpec {
    let by: Vec<String> = by.iter().map(|s| s.to_string()).collect();
    let select: Select = by
        .iter()
        .map(|b| (b.clone(), Selection::Field(b.clone())))
        .collect();
    let aggregates = match Value::from(aggregates) {
        Value::Map(map) => map,
        _ => BTreeMap::new(),
    };
    GroupSpec {
        by,
        select,
        aggregates,
        where_clause: None,
        order: Vec::new(),
        slice: Slice::default(),
        group: None,
    }
}

const ATTRIBUTES: [&str; 4] = ["name", "yearIntroduced", "bellyBadge", "furColor"];

fn direction() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("asc"), Just("desc")]
}

fn bear_where() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        (0..3000i64).prop_map(|year| json!({"yearIntroduced": {"$gte": year}, "name": {"$ne": ""}})),
        (0..3000i64).prop_map(|year| json!({"$or": [
            {"yearIntroduced": {"$gt": year}},
            {"bellyBadge": "rainbow"}
        ]})),
        prop::sample::select(vec!["tan", "turquoise"])
            .prop_map(|fur| json!({"$not": {"furColor": fur}})),
        Just(json!({"home.isInClouds": true, "$and": [{"$not": {"bestFriend.name": "Wish Bear"}}]})),
    ]
}

fn computed_field() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        (0..3000i64).prop_map(|year| json!({"late": {"$gt": year}})),
        Just(json!({"era": {"$case": {
            "value": {"$get": "yearIntroduced"},
            "cases": [{"when": {"$lt": 2000}, "then": "classic"}],
            "default": "modern"
        }}})),
        Just(json!({"housed": {"$if": {"if": {"$get": "home"}, "then": true, "else": false}}})),
        Just(json!({"raw": {"$literal": {"$get": "name"}}})),
    ]
}

fn relationship_entry() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        Just(json!("home")),
        Just(json!({"home": {"select": ["name"], "where": {"isInClouds": true}}})),
        direction().prop_map(|dir| json!({"powers": {
            "select": ["*"],
            "where": {"$or": [{"type": "group power"}, {"name": {"$ne": ""}}]},
            "order": {"name": dir}
        }})),
        (1..4i64).prop_map(|limit| json!({"bestFriend": {
            "select": {"name": "name", "bestFriend": {"select": ["name"]}}
        }, "powers": {"select": ["name"], "order": "name", "limit": limit}})),
    ]
}

/// Ordering with either a plain window or a cursor anchored on the order prefix.
fn bear_order() -> impl Strategy<Value = (serde_json::Value, Option<serde_json::Value>)> {
    (
        direction(),
        direction(),
        prop::option::of(0..10i64),
        prop_oneof![Just("after"), Just("before")],
        any::<bool>(),
    )
        .prop_map(|(year_dir, name_dir, limit, side, anchored)| {
            let order = json!([{"yearIntroduced": year_dir}, {"name": name_dir}]);
            let slice = match (anchored, limit) {
                (true, _) => {
                    let mut slice = serde_json::Map::new();
                    slice.insert(
                        side.to_string(),
                        json!({"yearIntroduced": 1982, "name": "Cheer Bear"}),
                    );
                    if let Some(limit) = limit {
                        slice.insert("limit".to_string(), json!(limit));
                    }
                    Some(serde_json::Value::Object(slice))
                }
                (false, Some(limit)) => Some(json!({"limit": limit, "offset": 1})),
                (false, None) => None,
            };
            (order, slice)
        })
}

fn bear_group() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        Just(json!({"by": [], "aggregates": {"n": {"$count": null}}})),
        direction().prop_map(|dir| json!({
            "by": "yearIntroduced",
            "select": ["*", {"crowded": {"$gt": 2}}],
            "aggregates": {"n": {"$count": null}, "names": {"$pluck": "name"}},
            "where": {"n": {"$gte": 1}},
            "order": {"n": dir},
            "limit": 5
        })),
        (1..3i64).prop_map(|min| json!({
            "by": ["yearIntroduced", "furColor"],
            "aggregates": {"n": {"$count": null}},
            "group": {
                "by": "yearIntroduced",
                "aggregates": {"colors": {"$count": null}, "n": {"$sum": {"$pluck": "n"}}},
                "where": {"$or": [{"colors": {"$gte": min}}, {"$not": {"n": 0}}]},
                "order": [{"n": "desc"}, "yearIntroduced"],
                "slice": {"after": {"n": 10}},
                "group": {"by": [], "aggregates": {"years": {"$count": null}}}
            }
        })),
    ]
}

fn bear_query() -> impl Strategy<Value = serde_json::Value> {
    (
        prop::sample::subsequence(ATTRIBUTES.to_vec(), 1..=4),
        prop::option::of(computed_field()),
        prop::option::of(relationship_entry()),
        prop::option::of(bear_where()),
        prop::option::of(bear_order()),
        prop::option::of(bear_group()),
    )
        .prop_map(|(fields, computed, relationship, filter, order, group)| {
            let mut select: Vec<serde_json::Value> = fields.into_iter().map(|f| json!(f)).collect();
            select.extend(computed);
            let mut query = json!({"type": "bears"});
            if let Some(filter) = filter {
                query["where"] = filter;
            }
            if let Some(group) = group {
                query["group"] = group;
            } else {
                select.extend(relationship);
                if let Some((order, slice)) = order {
                    query["order"] = order;
                    if let Some(slice) = slice {
                        query["slice"] = slice;
                    }
                }
            }
            query["select"] = json!(select);
            query
        })
}

proptest! {
    #[test]
    fn test_normalize_is_idempotent(query in bear_query()) {
        let schema = Schema::from_json_value(care_bears_schema()).unwrap();

        let once = normalize(&schema, &Value::from(query)).unwrap();
        let twice = normalize(&schema, &once.to_value()).unwrap();

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_group_key_yields_one_row(rows in match_rows()) {
        let table = OperatorTable::in_memory();
        let ev = Evaluator::new(&table);
        let spec = group_by(&[], json!({"n": {"$count": null}, "total": {"$sum": {"$pluck": "goals"}}}));
        let expected_total: i64 = rows.iter().filter_map(|r| field(r, "goals").as_int()).sum();
        let count = rows.len() as i64;

        let grouped = group_rows(&spec, rows, &ev).unwrap();

        prop_assert_eq!(grouped.len(), 1);
        prop_assert_eq!(field(&grouped[0], "n"), Value::Int(count));
        prop_assert_eq!(field(&grouped[0], "total"), Value::Int(expected_total));
    }

    #[test]
    fn test_partitions_cover_every_row(rows in match_rows()) {
        let table = OperatorTable::in_memory();
        let ev = Evaluator::new(&table);
        let spec = group_by(&["team", "ageGroup"], json!({"n": {"$count": null}}));
        let count = rows.len() as i64;

        let grouped = group_rows(&spec, rows, &ev).unwrap();

        let covered: i64 = grouped.iter().filter_map(|r| field(r, "n").as_int()).sum();
        prop_assert_eq!(covered, count);
    }

    #[test]
    fn test_regrouping_by_the_same_key_is_stable(rows in match_rows()) {
        let table = OperatorTable::in_memory();
        let ev = Evaluator::new(&table);
        let spec = group_by(&["team"], json!({}));

        let once = group_rows(&spec, rows, &ev).unwrap();
        let twice = group_rows(&spec, once.clone(), &ev).unwrap();

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_sort_is_stable(rows in match_rows()) {
        let order = [OrderKey::asc("goals")];

        let sorted = apply_order_and_slice(rows, &order, &Slice::default(), field).unwrap();

        for pair in sorted.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let (ga, gb) = (field(a, "goals").as_int(), field(b, "goals").as_int());
            prop_assert!(ga <= gb);
            if ga == gb {
                prop_assert!(field(a, "id").as_int() < field(b, "id").as_int());
            }
        }
    }

    #[test]
    fn test_after_then_offset_matches_combined_slice(
        rows in match_rows(),
        anchor in 0..6i64,
        offset in 0..5usize,
    ) {
        let order = [OrderKey::desc("goals"), OrderKey::asc("id")];
        let after = Slice {
            after: Some(attrs! {"goals" => anchor}),
            ..Slice::default()
        };
        let combined = Slice {
            offset: Some(offset),
            ..after.clone()
        };
        let skip = Slice {
            offset: Some(offset),
            ..Slice::default()
        };

        let stepwise = apply_order_and_slice(rows.clone(), &order, &after, field).unwrap();
        let stepwise = apply_order_and_slice(stepwise, &[], &skip, field).unwrap();
        let direct = apply_order_and_slice(rows, &order, &combined, field).unwrap();

        prop_assert_eq!(stepwise, direct);
    }

    #[test]
    fn test_anchor_must_be_an_order_prefix(
        keys in prop::sample::subsequence(vec!["a", "b", "c", "d"], 1..=4).prop_shuffle(),
        take in 1..=4usize,
    ) {
        let order: Vec<OrderKey> = keys.iter().map(|k| OrderKey::asc(*k)).collect();
        let take = take.min(order.len());

        let prefix: Map = keys[..take].iter().map(|k| (k.to_string(), Value::Int(1))).collect();
        let accepted = Slice { after: Some(prefix), ..Slice::default() };
        prop_assert!(validate_slice(&order, &accepted).is_ok());

        let mut gapped = Map::new();
        gapped.insert(keys[keys.len() - 1].to_string(), Value::Int(1));
        if keys.len() > 1 {
            let rejected = Slice { before: Some(gapped), ..Slice::default() };
            prop_assert!(validate_slice(&order, &rejected).is_err());
        }
    }
}
