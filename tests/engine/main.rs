//! Integration tests for Layer 1: Engine
//!
//! Tests pattern matching, the flow pipeline, rule validation, and cascade
//! dispatch through the public API.

mod cascades;
mod flows;
mod rules;

use std::sync::{Arc, Mutex};

use weft_engine::{OperationContract, OperationOutput, Registry};
use weft_foundation::{Value, record};

/// Registry used across the engine tests: `item.create` mints sequential
/// ids, `item.note` records what it was invoked with, and `item.children`
/// returns a configurable row set per parent.
pub fn test_registry(
    notes: Arc<Mutex<Vec<Value>>>,
    children: Vec<(&'static str, Vec<&'static str>)>,
) -> Registry {
    let mut registry = Registry::new();

    let counter = Arc::new(Mutex::new(0u32));
    registry
        .register_action(
            OperationContract::action("item", "create")
                .with_input("kind")
                .with_output("item"),
            move |input| {
                let Some(kind) = input.get("kind").and_then(Value::as_str) else {
                    return Ok(OperationOutput::failure("kind must be a string"));
                };
                let mut counter = counter.lock().unwrap();
                *counter += 1;
                Ok(OperationOutput::Success(record(&[(
                    "item",
                    Value::from(format!("{kind}-{counter}")),
                )])))
            },
        )
        .unwrap();

    registry
        .register_action(
            OperationContract::action("item", "note")
                .with_input("about")
                .with_output("about"),
            move |input| {
                let about = input.get("about").cloned().unwrap_or(Value::Nil);
                notes.lock().unwrap().push(about.clone());
                Ok(OperationOutput::Success(record(&[("about", about)])))
            },
        )
        .unwrap();

    registry
        .register_query(
            OperationContract::query("item", "children")
                .with_input("parent")
                .with_output("child"),
            move |input| {
                let Some(parent) = input.get("parent").and_then(Value::as_str) else {
                    return Ok(vec![]);
                };
                Ok(children
                    .iter()
                    .filter(|(p, _)| *p == parent)
                    .flat_map(|(_, kids)| kids.iter())
                    .map(|child| record(&[("child", Value::from(*child))]))
                    .collect())
            },
        )
        .unwrap();

    registry
}
