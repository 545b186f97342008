//! Tests for breadth-first cascade dispatch.

use std::sync::{Arc, Mutex};

use weft_engine::{
    ArgSource, EffectTemplate, Engine, EngineLimits, FieldPattern, OpRef, RuleSet,
    Synchronization, TriggerPattern,
};
use weft_foundation::{CascadeLimit, ErrorKind, Value, record};

use crate::test_registry;

fn note_on_create() -> Synchronization {
    Synchronization::named("note-on-create")
        .when(
            TriggerPattern::on(OpRef::new("item", "create"))
                .output("item", FieldPattern::var("item")),
        )
        .then(
            EffectTemplate::invoke(OpRef::new("item", "note"))
                .field("about", ArgSource::var("item")),
        )
}

#[test]
fn a_creation_cascades_into_one_note_with_its_bindings() {
    let notes = Arc::new(Mutex::new(Vec::new()));
    let registry = test_registry(Arc::clone(&notes), vec![]);
    let rules = RuleSet::compile(vec![note_on_create()], &registry).unwrap();
    let engine = Engine::new(registry, rules);

    engine
        .apply(
            &OpRef::new("item", "create"),
            record(&[("kind", Value::from("todo"))]),
        )
        .unwrap();

    // The note carries the freshly minted id, not a stale binding.
    assert_eq!(&*notes.lock().unwrap(), &[Value::from("todo-1")]);
}

#[test]
fn each_match_fires_exactly_once() {
    let notes = Arc::new(Mutex::new(Vec::new()));
    let registry = test_registry(Arc::clone(&notes), vec![]);
    let rules = RuleSet::compile(vec![note_on_create()], &registry).unwrap();
    let engine = Engine::new(registry, rules);

    for _ in 0..3 {
        engine
            .apply(
                &OpRef::new("item", "create"),
                record(&[("kind", Value::from("todo"))]),
            )
            .unwrap();
    }
    assert_eq!(notes.lock().unwrap().len(), 3);
}

#[test]
fn an_engine_with_no_matching_rules_is_idempotent() {
    let notes = Arc::new(Mutex::new(Vec::new()));
    let registry = test_registry(Arc::clone(&notes), vec![]);
    let only_failures = Synchronization::named("failures-only")
        .when(TriggerPattern::on(OpRef::new("item", "create")).on_failure())
        .then(EffectTemplate::invoke(OpRef::new("item", "note")).field(
            "about",
            ArgSource::lit("failed"),
        ));
    let rules = RuleSet::compile(vec![only_failures], &registry).unwrap();
    let engine = Engine::new(registry, rules);

    let (_, first) = engine
        .apply(
            &OpRef::new("item", "create"),
            record(&[("kind", Value::from("todo"))]),
        )
        .unwrap();
    let (_, second) = engine
        .apply(
            &OpRef::new("item", "create"),
            record(&[("kind", Value::from("todo"))]),
        )
        .unwrap();

    assert!(first.trace.is_empty());
    assert!(second.trace.is_empty());
    assert_eq!(first.occurrences, second.occurrences);
    assert!(notes.lock().unwrap().is_empty());
}

#[test]
fn chained_rules_run_in_later_generations() {
    let notes = Arc::new(Mutex::new(Vec::new()));
    let registry = test_registry(Arc::clone(&notes), vec![]);
    // create -> note("seen") -> note is also watched and re-noted once.
    let first = Synchronization::named("note-the-create")
        .when(TriggerPattern::on(OpRef::new("item", "create")))
        .then(
            EffectTemplate::invoke(OpRef::new("item", "note"))
                .field("about", ArgSource::lit("first")),
        );
    let second = Synchronization::named("note-the-note")
        .when(
            TriggerPattern::on(OpRef::new("item", "note"))
                .input("about", FieldPattern::lit("first")),
        )
        .then(
            EffectTemplate::invoke(OpRef::new("item", "note"))
                .field("about", ArgSource::lit("second")),
        );
    let rules = RuleSet::compile(vec![first, second], &registry).unwrap();
    let engine = Engine::new(registry, rules);

    let (_, report) = engine
        .apply(
            &OpRef::new("item", "create"),
            record(&[("kind", Value::from("todo"))]),
        )
        .unwrap();

    assert_eq!(
        &*notes.lock().unwrap(),
        &[Value::from("first"), Value::from("second")]
    );
    let generations: Vec<u32> = report.trace.firings().iter().map(|f| f.generation).collect();
    assert_eq!(generations, vec![1, 2]);
}

#[test]
fn a_self_triggering_rule_stops_at_the_generation_limit() {
    let notes = Arc::new(Mutex::new(Vec::new()));
    let registry = test_registry(Arc::clone(&notes), vec![]);
    let echo = Synchronization::named("echo")
        .when(
            TriggerPattern::on(OpRef::new("item", "note"))
                .input("about", FieldPattern::var("about")),
        )
        .then(
            EffectTemplate::invoke(OpRef::new("item", "note"))
                .field("about", ArgSource::var("about")),
        );
    let rules = RuleSet::compile(vec![echo], &registry).unwrap();
    let engine = Engine::new(registry, rules)
        .with_limits(EngineLimits::default().with_max_generations(3));

    let err = engine
        .apply(
            &OpRef::new("item", "note"),
            record(&[("about", Value::from("loop"))]),
        )
        .unwrap_err();

    assert!(matches!(
        err.kind,
        ErrorKind::LimitExceeded(CascadeLimit::MaxGenerations { limit: 3 })
    ));
    // The direct invocation plus one effect per allowed generation ran
    // before the guard tripped; none are rolled back.
    assert_eq!(notes.lock().unwrap().len(), 4);
}
