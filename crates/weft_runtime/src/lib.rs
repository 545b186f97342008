//! Request boundary and session wiring for Weft.
//!
//! This crate provides:
//! - [`Boundary`] - Requests and timers as synthetic operations
//! - [`Session`] - Registry construction, rule compilation, and the engine
//! - `weft_demo` - A scripted scenario binary

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::sync::{Mutex, MutexGuard};

use weft_foundation::{Error, Result};

pub mod boundary;
pub mod session;

pub use boundary::{Boundary, Response, ResponseBuffer, ops};
pub use session::{RequestOutcome, Session, SessionConfig, application_rules};

/// Locks shared runtime state, surfacing poisoning as an internal error.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| Error::internal("runtime state lock poisoned"))
}
