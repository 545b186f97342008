//! Core types, values, and persistent collections for Weft.
//!
//! This crate provides:
//! - [`Value`] - The opaque domain value type threaded through the engine
//! - [`Record`] - A named-field record of values
//! - [`Error`] - Rich error types with context
//! - Persistent collections ([`WfVec`], [`WfMap`])

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collections;
pub mod error;
pub mod value;

pub use collections::{WfMap, WfVec};
pub use error::{CascadeLimit, Error, ErrorContext, ErrorKind};
pub use value::{Record, Value, record};

/// Result type used throughout Weft.
pub type Result<T> = std::result::Result<T, Error>;
