//! Weft - Reactive synchronization engine
//!
//! This crate re-exports all layers of the Weft system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: weft_runtime    — Request boundary, session wiring, demo binary
//! Layer 2: weft_concepts   — Independent concept modules (accounts, maps,
//!                            scores, trackers, summaries)
//! Layer 1: weft_engine     — Operation registry, frames, pattern matcher,
//!                            flow pipeline, cascade dispatch
//! Layer 0: weft_foundation — Core types (Value, Record, Error, collections)
//! ```
//!
//! Concepts never call each other. Every cross-concept behavior is a
//! declarative synchronization rule the engine evaluates over operation
//! occurrences.

pub use weft_concepts as concepts;
pub use weft_engine as engine;
pub use weft_foundation as foundation;
pub use weft_runtime as runtime;
