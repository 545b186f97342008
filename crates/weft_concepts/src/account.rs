//! User accounts.
//!
//! Registration, a trivial authenticate check, and a lookup query. Knows
//! nothing about maps, scores, trackers, or summaries.

use std::sync::{Arc, Mutex};

use weft_engine::{OperationContract, OperationOutput, Registry};
use weft_foundation::{Result, Value, WfMap, record};

use crate::ident::SharedMinter;
use crate::lock;

#[derive(Debug, Default)]
struct State {
    /// user id -> display name
    users: WfMap<Arc<str>, Arc<str>>,
}

/// The account concept: an independent store of registered users.
#[derive(Clone, Debug)]
pub struct AccountConcept {
    state: Arc<Mutex<State>>,
    minter: SharedMinter,
}

impl AccountConcept {
    /// Creates the concept with a shared identifier minter.
    #[must_use]
    pub fn new(minter: SharedMinter) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            minter,
        }
    }

    /// Installs `account.register`, `account.authenticate`, and
    /// `account.lookup` into the registry.
    ///
    /// # Errors
    /// Returns an error if any operation name is already taken.
    pub fn install(&self, registry: &mut Registry) -> Result<()> {
        let state = Arc::clone(&self.state);
        let minter = Arc::clone(&self.minter);
        registry.register_action(
            OperationContract::action("account", "register")
                .with_input("name")
                .with_output("user"),
            move |input| {
                let Some(name) = input.get("name").and_then(Value::as_str) else {
                    return Ok(OperationOutput::failure("name must be a string"));
                };
                if name.is_empty() {
                    return Ok(OperationOutput::failure("name must not be empty"));
                }
                let mut state = lock(&state)?;
                if state.users.iter().any(|(_, n)| &**n == name) {
                    return Ok(OperationOutput::failure("name already registered"));
                }
                let user = lock(&minter)?.mint("user");
                state.users = state.users.insert(Arc::clone(&user), Arc::from(name));
                Ok(OperationOutput::Success(record(&[(
                    "user",
                    Value::String(user),
                )])))
            },
        )?;

        let state = Arc::clone(&self.state);
        registry.register_action(
            OperationContract::action("account", "authenticate")
                .with_input("user")
                .with_output("user"),
            move |input| {
                let Some(user) = input.get("user").and_then(Value::as_str) else {
                    return Ok(OperationOutput::failure("user must be a string"));
                };
                if lock(&state)?.users.contains_key(user) {
                    Ok(OperationOutput::Success(record(&[(
                        "user",
                        Value::from(user),
                    )])))
                } else {
                    Ok(OperationOutput::failure("unknown user"))
                }
            },
        )?;

        let state = Arc::clone(&self.state);
        registry.register_query(
            OperationContract::query("account", "lookup")
                .with_input("user")
                .with_output("user")
                .with_output("name"),
            move |input| {
                let Some(user) = input.get("user").and_then(Value::as_str) else {
                    return Ok(vec![]);
                };
                Ok(lock(&state)?
                    .users
                    .get(user)
                    .map(|name| {
                        record(&[
                            ("user", Value::from(user)),
                            ("name", Value::String(Arc::clone(name))),
                        ])
                    })
                    .into_iter()
                    .collect())
            },
        )
    }
}
