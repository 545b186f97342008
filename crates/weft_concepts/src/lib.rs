//! Independent concept modules for Weft.
//!
//! Each concept is a self-contained store with validated operations. A
//! concept installs its contracts and handlers into a
//! [`Registry`](weft_engine::Registry) and never references another
//! concept; all coupling between them lives in the rule layer.
//!
//! This crate provides:
//! - [`AccountConcept`] - User registration and lookup
//! - [`MappingConcept`] - Body-location maps per owner
//! - [`ScoreConcept`] - Region-level pain scores
//! - [`TrackerConcept`] - Symptom event logs
//! - [`SummaryConcept`] - Composed per-owner snapshots
//! - [`IdMinter`] - Deterministic seeded identifier minting

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::sync::{Mutex, MutexGuard};

use weft_foundation::{Error, Result};

pub mod account;
pub mod ident;
pub mod mapping;
pub mod score;
pub mod summary;
pub mod tracker;

pub use account::AccountConcept;
pub use ident::{IdMinter, SharedMinter, shared_minter};
pub use mapping::{MappingConcept, REGIONS};
pub use score::{LEVEL_RANGE, ScoreConcept};
pub use summary::SummaryConcept;
pub use tracker::TrackerConcept;

/// Locks concept state, surfacing poisoning as an internal error instead of
/// panicking inside a handler.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| Error::internal("concept state lock poisoned"))
}
