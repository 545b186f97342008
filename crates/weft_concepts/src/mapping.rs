//! Body-location maps.
//!
//! A map belongs to an owner and carries a fixed list of body regions that
//! scores can later attach to. The owner is an opaque identifier; this
//! module never checks it against the account store.

use std::sync::{Arc, Mutex};

use weft_engine::{OperationContract, OperationOutput, Registry};
use weft_foundation::{Result, Value, WfMap, record};

use crate::ident::SharedMinter;
use crate::lock;

/// The body regions every generated map carries, in presentation order.
pub const REGIONS: [&str; 10] = [
    "head", "neck", "shoulders", "back", "arms", "hands", "hips", "legs", "knees", "feet",
];

#[derive(Debug, Default)]
struct State {
    /// map id -> owner
    maps: WfMap<Arc<str>, Arc<str>>,
    /// insertion order for stable query results
    order: Vec<Arc<str>>,
}

/// The mapping concept: body-location maps per owner.
#[derive(Clone, Debug)]
pub struct MappingConcept {
    state: Arc<Mutex<State>>,
    minter: SharedMinter,
}

impl MappingConcept {
    /// Creates the concept with a shared identifier minter.
    #[must_use]
    pub fn new(minter: SharedMinter) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            minter,
        }
    }

    /// Installs `mapping.generate`, `mapping.maps_for`, and
    /// `mapping.regions` into the registry.
    ///
    /// # Errors
    /// Returns an error if any operation name is already taken.
    pub fn install(&self, registry: &mut Registry) -> Result<()> {
        let state = Arc::clone(&self.state);
        let minter = Arc::clone(&self.minter);
        registry.register_action(
            OperationContract::action("mapping", "generate")
                .with_input("owner")
                .with_output("map"),
            move |input| {
                let Some(owner) = input.get("owner").and_then(Value::as_str) else {
                    return Ok(OperationOutput::failure("owner must be a string"));
                };
                if owner.is_empty() {
                    return Ok(OperationOutput::failure("owner must not be empty"));
                }
                let map = lock(&minter)?.mint("map");
                let mut state = lock(&state)?;
                state.maps = state.maps.insert(Arc::clone(&map), Arc::from(owner));
                state.order.push(Arc::clone(&map));
                Ok(OperationOutput::Success(record(&[(
                    "map",
                    Value::String(map),
                )])))
            },
        )?;

        let state = Arc::clone(&self.state);
        registry.register_query(
            OperationContract::query("mapping", "maps_for")
                .with_input("owner")
                .with_output("map"),
            move |input| {
                let Some(owner) = input.get("owner").and_then(Value::as_str) else {
                    return Ok(vec![]);
                };
                let state = lock(&state)?;
                Ok(state
                    .order
                    .iter()
                    .filter(|map| state.maps.get(&***map).is_some_and(|o| &**o == owner))
                    .map(|map| record(&[("map", Value::String(Arc::clone(map)))]))
                    .collect())
            },
        )?;

        let state = Arc::clone(&self.state);
        registry.register_query(
            OperationContract::query("mapping", "regions")
                .with_input("map")
                .with_output("region"),
            move |input| {
                let Some(map) = input.get("map").and_then(Value::as_str) else {
                    return Ok(vec![]);
                };
                if !lock(&state)?.maps.contains_key(map) {
                    return Ok(vec![]);
                }
                Ok(REGIONS
                    .iter()
                    .map(|region| record(&[("region", Value::from(*region))]))
                    .collect())
            },
        )
    }
}
