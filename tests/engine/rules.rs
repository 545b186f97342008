//! Tests for rule registration and validation.

use std::sync::{Arc, Mutex};

use weft_engine::{
    ArgSource, EffectTemplate, FieldPattern, OpRef, QueryStep, RuleSet, Synchronization,
    TriggerPattern,
};
use weft_foundation::ErrorKind;

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
fn a_well_formed_rule_set_compiles() {
    let registry = test_registry(Arc::new(Mutex::new(Vec::new())), vec![]);
    let set = RuleSet::compile(vec![note_on_create()], &registry).unwrap();
    assert_eq!(set.len(), 1);
}

#[test]
fn registration_rejects_unknown_operations() {
    let registry = test_registry(Arc::new(Mutex::new(Vec::new())), vec![]);
    let rule = Synchronization::named("watch-ghost")
        .when(TriggerPattern::on(OpRef::new("ghost", "apparate")))
        .then(EffectTemplate::invoke(OpRef::new("item", "note")));
    let err = RuleSet::compile(vec![rule], &registry).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownOperation(_)));
}

#[test]
fn registration_rejects_kind_confusion() {
    let registry = test_registry(Arc::new(Mutex::new(Vec::new())), vec![]);

    // A query cannot be a trigger: queries never occur.
    let rule = Synchronization::named("watch-query")
        .when(TriggerPattern::on(OpRef::new("item", "children")))
        .then(EffectTemplate::invoke(OpRef::new("item", "note")));
    let err = RuleSet::compile(vec![rule], &registry).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MalformedRule { .. }));

    // An action cannot be a flow query.
    let rule = note_on_create().step(QueryStep::new(OpRef::new("item", "note")));
    let err = RuleSet::compile(vec![rule], &registry).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MalformedRule { .. }));
}

#[test]
fn registration_rejects_fields_outside_the_contract() {
    let registry = test_registry(Arc::new(Mutex::new(Vec::new())), vec![]);
    let rule = Synchronization::named("bad-trigger-field")
        .when(
            TriggerPattern::on(OpRef::new("item", "create"))
                .input("flavour", FieldPattern::Any),
        )
        .then(EffectTemplate::invoke(OpRef::new("item", "note")));
    let err = RuleSet::compile(vec![rule], &registry).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MissingField { .. }));
}

#[test]
fn registration_rejects_unbound_consequent_variables() {
    let registry = test_registry(Arc::new(Mutex::new(Vec::new())), vec![]);
    let rule = Synchronization::named("dangling")
        .when(TriggerPattern::on(OpRef::new("item", "create")))
        .then(
            EffectTemplate::invoke(OpRef::new("item", "note"))
                .field("about", ArgSource::var("never_bound")),
        );
    let err = RuleSet::compile(vec![rule], &registry).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::UnboundVariable { .. }
    ));
}

#[test]
fn query_binds_count_as_bound_variables() {
    let registry = test_registry(Arc::new(Mutex::new(Vec::new())), vec![]);
    let rule = Synchronization::named("note-children")
        .when(
            TriggerPattern::on(OpRef::new("item", "create"))
                .output("item", FieldPattern::var("item")),
        )
        .step(
            QueryStep::new(OpRef::new("item", "children"))
                .arg("parent", ArgSource::var("item"))
                .bind("child", "child"),
        )
        .then(
            EffectTemplate::invoke(OpRef::new("item", "note"))
                .field("about", ArgSource::var("child")),
        );
    assert!(RuleSet::compile(vec![rule], &registry).is_ok());
}
