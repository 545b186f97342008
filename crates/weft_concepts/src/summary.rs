//! Generated summaries.
//!
//! A summary is an owner-scoped snapshot of composed text. This module only
//! stores what it is handed; assembling the body from scores or events is
//! the rule layer's job.

use std::sync::{Arc, Mutex};

use weft_engine::{OperationContract, OperationOutput, Registry};
use weft_foundation::{Result, Value, record};

use crate::ident::SharedMinter;
use crate::lock;

#[derive(Debug, Default)]
struct State {
    /// (owner, summary id, body) in composition order
    summaries: Vec<(Arc<str>, Arc<str>, Arc<str>)>,
}

/// The summary concept: per-owner composed snapshots.
#[derive(Clone, Debug)]
pub struct SummaryConcept {
    state: Arc<Mutex<State>>,
    minter: SharedMinter,
}

impl SummaryConcept {
    /// Creates the concept with a shared identifier minter.
    #[must_use]
    pub fn new(minter: SharedMinter) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            minter,
        }
    }

    /// Installs `summary.compose` and `summary.summaries_for` into the
    /// registry.
    ///
    /// # Errors
    /// Returns an error if any operation name is already taken.
    pub fn install(&self, registry: &mut Registry) -> Result<()> {
        let state = Arc::clone(&self.state);
        let minter = Arc::clone(&self.minter);
        registry.register_action(
            OperationContract::action("summary", "compose")
                .with_input("owner")
                .with_input("body")
                .with_output("summary"),
            move |input| {
                let Some(owner) = input.get("owner").and_then(Value::as_str) else {
                    return Ok(OperationOutput::failure("owner must be a string"));
                };
                if owner.is_empty() {
                    return Ok(OperationOutput::failure("owner must not be empty"));
                }
                let Some(body) = input.get("body").and_then(Value::as_str) else {
                    return Ok(OperationOutput::failure("body must be a string"));
                };
                let summary = lock(&minter)?.mint("summary");
                lock(&state)?.summaries.push((
                    Arc::from(owner),
                    Arc::clone(&summary),
                    Arc::from(body),
                ));
                Ok(OperationOutput::Success(record(&[(
                    "summary",
                    Value::String(summary),
                )])))
            },
        )?;

        let state = Arc::clone(&self.state);
        registry.register_query(
            OperationContract::query("summary", "summaries_for")
                .with_input("owner")
                .with_output("summary")
                .with_output("body"),
            move |input| {
                let Some(owner) = input.get("owner").and_then(Value::as_str) else {
                    return Ok(vec![]);
                };
                Ok(lock(&state)?
                    .summaries
                    .iter()
                    .filter(|(o, _, _)| &**o == owner)
                    .map(|(_, summary, body)| {
                        record(&[
                            ("summary", Value::String(Arc::clone(summary))),
                            ("body", Value::String(Arc::clone(body))),
                        ])
                    })
                    .collect())
            },
        )
    }
}
