//! Query row shapes and scoping.

use weft_engine::OpRef;
use weft_foundation::{Value, record};

use crate::full_registry;

#[test]
fn a_fresh_map_has_the_standard_regions() {
    let registry = full_registry(42);
    let map = registry
        .invoke(
            &OpRef::new("mapping", "generate"),
            record(&[("owner", Value::from("user-1"))]),
        )
        .unwrap()
        .output_field("map")
        .unwrap();

    let rows = registry
        .query(&OpRef::new("mapping", "regions"), record(&[("map", map)]))
        .unwrap();
    assert_eq!(rows.len(), weft_concepts::REGIONS.len());
    assert!(rows.iter().all(|row| row.get("region").is_some()));
}

#[test]
fn scores_round_through_their_query() {
    let registry = full_registry(42);
    registry
        .invoke(
            &OpRef::new("score", "assign"),
            record(&[
                ("map", Value::from("m-1")),
                ("region", Value::from("neck")),
                ("level", Value::Int(4)),
            ]),
        )
        .unwrap();

    let rows = registry
        .query(
            &OpRef::new("score", "scores_for"),
            record(&[("map", Value::from("m-1"))]),
        )
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("region"), Some(&Value::from("neck")));
    assert_eq!(rows[0].get("level"), Some(&Value::Int(4)));
}

#[test]
fn event_logs_preserve_order_and_scope() {
    let registry = full_registry(42);
    let tracker = registry
        .invoke(
            &OpRef::new("tracker", "track"),
            record(&[("owner", Value::from("user-1"))]),
        )
        .unwrap()
        .output_field("tracker")
        .unwrap();

    for entry in ["first", "second", "third"] {
        registry
            .invoke(
                &OpRef::new("tracker", "log"),
                record(&[("tracker", tracker.clone()), ("entry", Value::from(entry))]),
            )
            .unwrap();
    }

    let rows = registry
        .query(
            &OpRef::new("tracker", "events_for"),
            record(&[("tracker", tracker)]),
        )
        .unwrap();
    let entries: Vec<_> = rows
        .iter()
        .filter_map(|row| row.get("entry").and_then(Value::as_str).map(String::from))
        .collect();
    assert_eq!(entries, vec!["first", "second", "third"]);
}

#[test]
fn queries_with_unknown_subjects_return_no_rows() {
    let registry = full_registry(42);
    for (module, op, field) in [
        ("account", "lookup", "user"),
        ("mapping", "maps_for", "owner"),
        ("score", "scores_for", "map"),
        ("tracker", "events_for", "tracker"),
        ("summary", "summaries_for", "owner"),
    ] {
        let rows = registry
            .query(
                &OpRef::new(module, op),
                record(&[(field, Value::from("nothing-here"))]),
            )
            .unwrap();
        assert!(rows.is_empty(), "{module}.{op} returned rows for an unknown id");
    }
}
