//! Operation registry, pattern matching, and the reactive dispatch loop for
//! Weft.
//!
//! This crate provides:
//! - [`Registry`] - Operation contracts and invocation
//! - [`TriggerPattern`] - Occurrence matching with variable binding
//! - [`FlowStage`] - The join/filter/map pipeline between triggers and effects
//! - [`RuleSet`] - Validated, immutable synchronization rules
//! - [`Engine`] - Breadth-first cascade dispatch with hard limits

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cascade;
pub mod contract;
pub mod flow;
pub mod frame;
pub mod pattern;
pub mod rule;

pub use cascade::{CascadeReport, CascadeTrace, Engine, EngineLimits, FiringRecord};
pub use contract::{
    ActionFn, OpRef, Occurrence, OperationContract, OperationKind, OperationOutput, QueryFn,
    Registry,
};
pub use flow::{ArgSource, FilterFn, FlowStage, FlowStep, MapFn, QueryStep};
pub use frame::{Frame, FrameSet};
pub use pattern::{FieldPattern, OutcomePattern, PartialMatch, TriggerPattern};
pub use rule::{EffectTemplate, RuleSet, Synchronization};
