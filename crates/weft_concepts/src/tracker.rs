//! Symptom-event trackers.
//!
//! A tracker belongs to an owner and accumulates logged entries in order.
//! Entries are opaque strings; the tracker neither parses nor deduplicates
//! them.

use std::sync::{Arc, Mutex};

use weft_engine::{OperationContract, OperationOutput, Registry};
use weft_foundation::{Result, Value, WfMap, record};

use crate::ident::SharedMinter;
use crate::lock;

#[derive(Debug, Default)]
struct State {
    /// tracker id -> owner
    trackers: WfMap<Arc<str>, Arc<str>>,
    /// tracker ids in creation order
    order: Vec<Arc<str>>,
    /// (tracker id, event id, entry) in log order
    events: Vec<(Arc<str>, Arc<str>, Arc<str>)>,
}

/// The tracker concept: per-owner symptom event logs.
#[derive(Clone, Debug)]
pub struct TrackerConcept {
    state: Arc<Mutex<State>>,
    minter: SharedMinter,
}

impl TrackerConcept {
    /// Creates the concept with a shared identifier minter.
    #[must_use]
    pub fn new(minter: SharedMinter) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            minter,
        }
    }

    /// Installs `tracker.track` and `tracker.log`, plus the
    /// `trackers_for`, `roster`, `event_count`, and `events_for` queries,
    /// into the registry.
    ///
    /// # Errors
    /// Returns an error if any operation name is already taken.
    pub fn install(&self, registry: &mut Registry) -> Result<()> {
        let state = Arc::clone(&self.state);
        let minter = Arc::clone(&self.minter);
        registry.register_action(
            OperationContract::action("tracker", "track")
                .with_input("owner")
                .with_output("tracker"),
            move |input| {
                let Some(owner) = input.get("owner").and_then(Value::as_str) else {
                    return Ok(OperationOutput::failure("owner must be a string"));
                };
                if owner.is_empty() {
                    return Ok(OperationOutput::failure("owner must not be empty"));
                }
                let tracker = lock(&minter)?.mint("tracker");
                let mut state = lock(&state)?;
                state.trackers = state.trackers.insert(Arc::clone(&tracker), Arc::from(owner));
                state.order.push(Arc::clone(&tracker));
                Ok(OperationOutput::Success(record(&[(
                    "tracker",
                    Value::String(tracker),
                )])))
            },
        )?;

        let state = Arc::clone(&self.state);
        let minter = Arc::clone(&self.minter);
        registry.register_action(
            OperationContract::action("tracker", "log")
                .with_input("tracker")
                .with_input("entry")
                .with_output("event"),
            move |input| {
                let Some(tracker) = input.get("tracker").and_then(Value::as_str) else {
                    return Ok(OperationOutput::failure("tracker must be a string"));
                };
                let Some(entry) = input.get("entry").and_then(Value::as_str) else {
                    return Ok(OperationOutput::failure("entry must be a string"));
                };
                let mut state = lock(&state)?;
                if !state.trackers.contains_key(tracker) {
                    return Ok(OperationOutput::failure("unknown tracker"));
                }
                let event = lock(&minter)?.mint("event");
                state
                    .events
                    .push((Arc::from(tracker), Arc::clone(&event), Arc::from(entry)));
                Ok(OperationOutput::Success(record(&[(
                    "event",
                    Value::String(event),
                )])))
            },
        )?;

        let state = Arc::clone(&self.state);
        registry.register_query(
            OperationContract::query("tracker", "trackers_for")
                .with_input("owner")
                .with_output("tracker"),
            move |input| {
                let Some(owner) = input.get("owner").and_then(Value::as_str) else {
                    return Ok(vec![]);
                };
                let state = lock(&state)?;
                Ok(state
                    .order
                    .iter()
                    .filter(|t| state.trackers.get(&***t).is_some_and(|o| &**o == owner))
                    .map(|t| record(&[("tracker", Value::String(Arc::clone(t)))]))
                    .collect())
            },
        )?;

        let state = Arc::clone(&self.state);
        registry.register_query(
            OperationContract::query("tracker", "roster")
                .with_output("tracker")
                .with_output("owner"),
            move |_| {
                let state = lock(&state)?;
                Ok(state
                    .order
                    .iter()
                    .filter_map(|t| {
                        state.trackers.get(&**t).map(|owner| {
                            record(&[
                                ("tracker", Value::String(Arc::clone(t))),
                                ("owner", Value::String(Arc::clone(owner))),
                            ])
                        })
                    })
                    .collect())
            },
        )?;

        let state = Arc::clone(&self.state);
        registry.register_query(
            OperationContract::query("tracker", "event_count")
                .with_input("tracker")
                .with_output("count"),
            move |input| {
                let Some(tracker) = input.get("tracker").and_then(Value::as_str) else {
                    return Ok(vec![]);
                };
                let count = lock(&state)?
                    .events
                    .iter()
                    .filter(|(t, _, _)| &**t == tracker)
                    .count();
                Ok(vec![record(&[(
                    "count",
                    Value::Int(i64::try_from(count).unwrap_or(i64::MAX)),
                )])])
            },
        )?;

        let state = Arc::clone(&self.state);
        registry.register_query(
            OperationContract::query("tracker", "events_for")
                .with_input("tracker")
                .with_output("event")
                .with_output("entry"),
            move |input| {
                let Some(tracker) = input.get("tracker").and_then(Value::as_str) else {
                    return Ok(vec![]);
                };
                Ok(lock(&state)?
                    .events
                    .iter()
                    .filter(|(t, _, _)| &**t == tracker)
                    .map(|(_, event, entry)| {
                        record(&[
                            ("event", Value::String(Arc::clone(event))),
                            ("entry", Value::String(Arc::clone(entry))),
                        ])
                    })
                    .collect())
            },
        )
    }
}
