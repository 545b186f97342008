//! Pain scores per map region.
//!
//! A score attaches a 0..=10 level to one region of one map. Re-assigning
//! the same region replaces the previous level in place; history is not
//! kept. Map and region are opaque identifiers here.

use std::sync::{Arc, Mutex};

use weft_engine::{OperationContract, OperationOutput, Registry};
use weft_foundation::{Result, Value, record};

use crate::ident::SharedMinter;
use crate::lock;

/// The inclusive level range scores accept.
pub const LEVEL_RANGE: std::ops::RangeInclusive<i64> = 0..=10;

#[derive(Debug)]
struct Entry {
    score: Arc<str>,
    map: Arc<str>,
    region: Arc<str>,
    level: i64,
}

#[derive(Debug, Default)]
struct State {
    entries: Vec<Entry>,
}

/// The score concept: region-level pain scores.
#[derive(Clone, Debug)]
pub struct ScoreConcept {
    state: Arc<Mutex<State>>,
    minter: SharedMinter,
}

impl ScoreConcept {
    /// Creates the concept with a shared identifier minter.
    #[must_use]
    pub fn new(minter: SharedMinter) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            minter,
        }
    }

    /// Installs `score.assign` and `score.scores_for` into the registry.
    ///
    /// # Errors
    /// Returns an error if any operation name is already taken.
    pub fn install(&self, registry: &mut Registry) -> Result<()> {
        let state = Arc::clone(&self.state);
        let minter = Arc::clone(&self.minter);
        registry.register_action(
            OperationContract::action("score", "assign")
                .with_input("map")
                .with_input("region")
                .with_input("level")
                .with_output("score"),
            move |input| {
                let Some(map) = input.get("map").and_then(Value::as_str) else {
                    return Ok(OperationOutput::failure("map must be a string"));
                };
                let Some(region) = input.get("region").and_then(Value::as_str) else {
                    return Ok(OperationOutput::failure("region must be a string"));
                };
                let Some(level) = input.get("level").and_then(Value::as_int) else {
                    return Ok(OperationOutput::failure("level must be an integer"));
                };
                if !LEVEL_RANGE.contains(&level) {
                    return Ok(OperationOutput::failure(
                        "level must be between 0 and 10",
                    ));
                }

                let mut state = lock(&state)?;
                let existing = state
                    .entries
                    .iter()
                    .position(|e| &*e.map == map && &*e.region == region);
                let score = match existing {
                    Some(index) => {
                        state.entries[index].level = level;
                        Arc::clone(&state.entries[index].score)
                    }
                    None => {
                        let score = lock(&minter)?.mint("score");
                        state.entries.push(Entry {
                            score: Arc::clone(&score),
                            map: Arc::from(map),
                            region: Arc::from(region),
                            level,
                        });
                        score
                    }
                };
                Ok(OperationOutput::Success(record(&[(
                    "score",
                    Value::String(score),
                )])))
            },
        )?;

        let state = Arc::clone(&self.state);
        registry.register_query(
            OperationContract::query("score", "scores_for")
                .with_input("map")
                .with_output("region")
                .with_output("level"),
            move |input| {
                let Some(map) = input.get("map").and_then(Value::as_str) else {
                    return Ok(vec![]);
                };
                Ok(lock(&state)?
                    .entries
                    .iter()
                    .filter(|e| &*e.map == map)
                    .map(|e| {
                        record(&[
                            ("region", Value::String(Arc::clone(&e.region))),
                            ("level", Value::Int(e.level)),
                        ])
                    })
                    .collect())
            },
        )
    }
}
