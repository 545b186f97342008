//! Tests for the join/filter/map flow pipeline.

use std::sync::{Arc, Mutex};

use weft_engine::{ArgSource, FlowStage, FlowStep, Frame, FrameSet, OpRef, QueryStep};
use weft_foundation::Value;

use crate::test_registry;

fn frames_with_parent(parent: &str) -> FrameSet {
    FrameSet::from_frame(Frame::new().bind("parent", Value::from(parent)).unwrap())
}

#[test]
fn join_fans_out_k_rows_per_frame() {
    let registry = test_registry(
        Arc::new(Mutex::new(Vec::new())),
        vec![("p-1", vec!["c-1", "c-2", "c-3"])],
    );
    let steps = vec![FlowStep::from(
        QueryStep::new(OpRef::new("item", "children"))
            .arg("parent", ArgSource::var("parent"))
            .bind("child", "child"),
    )];

    let out = FlowStage::new("fan-out", &registry)
        .run(&steps, frames_with_parent("p-1"))
        .unwrap();
    assert_eq!(out.len(), 3);
}

#[test]
fn join_with_no_rows_is_an_inner_join() {
    let registry = test_registry(Arc::new(Mutex::new(Vec::new())), vec![]);
    let steps = vec![FlowStep::from(
        QueryStep::new(OpRef::new("item", "children"))
            .arg("parent", ArgSource::var("parent"))
            .bind("child", "child"),
    )];

    let out = FlowStage::new("inner-join", &registry)
        .run(&steps, frames_with_parent("p-404"))
        .unwrap();
    assert!(out.is_empty());
}

#[test]
fn filter_output_is_a_subset_of_input() {
    let registry = test_registry(Arc::new(Mutex::new(Vec::new())), vec![]);
    let steps = vec![FlowStep::filter("ends-in-2", |frame| {
        frame
            .get("n")
            .and_then(Value::as_int)
            .is_some_and(|n| n % 2 == 0)
    })];

    let mut input = FrameSet::new();
    for n in 0..6i64 {
        input.push(Frame::new().bind("n", Value::Int(n)).unwrap());
    }
    let out = FlowStage::new("narrow", &registry)
        .run(&steps, input.clone())
        .unwrap();

    assert_eq!(out.len(), 3);
    for frame in out.iter() {
        assert!(input.iter().any(|f| f == frame));
    }
}

#[test]
fn chained_joins_compose() {
    let registry = test_registry(
        Arc::new(Mutex::new(Vec::new())),
        vec![
            ("root", vec!["a", "b"]),
            ("a", vec!["a-1"]),
            ("b", vec!["b-1", "b-2"]),
        ],
    );
    let steps = vec![
        FlowStep::from(
            QueryStep::new(OpRef::new("item", "children"))
                .arg("parent", ArgSource::var("parent"))
                .bind("child", "mid"),
        ),
        FlowStep::from(
            QueryStep::new(OpRef::new("item", "children"))
                .arg("parent", ArgSource::var("mid"))
                .bind("child", "leaf"),
        ),
    ];

    let out = FlowStage::new("two-hops", &registry)
        .run(&steps, frames_with_parent("root"))
        .unwrap();
    // a -> a-1; b -> b-1, b-2
    assert_eq!(out.len(), 3);
    let leaves: Vec<_> = out
        .iter()
        .filter_map(|f| f.get("leaf").and_then(Value::as_str).map(String::from))
        .collect();
    assert_eq!(leaves, vec!["a-1", "b-1", "b-2"]);
}

#[test]
fn map_never_drops_frames_on_fresh_names() {
    let registry = test_registry(Arc::new(Mutex::new(Vec::new())), vec![]);
    let steps = vec![FlowStep::map("tag-all", &["tag"], |_| {
        vec![(Arc::from("tag"), Value::from("seen"))]
    })];

    let mut input = FrameSet::new();
    for n in 0..4i64 {
        input.push(Frame::new().bind("n", Value::Int(n)).unwrap());
    }
    let out = FlowStage::new("tag", &registry).run(&steps, input).unwrap();
    assert_eq!(out.len(), 4);
    assert!(out.iter().all(|f| f.get("tag") == Some(&Value::from("seen"))));
}
