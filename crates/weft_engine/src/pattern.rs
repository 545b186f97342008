//! Trigger patterns and conjunction tracking.
//!
//! A trigger pattern describes the occurrences a rule reacts to: an exact
//! operation identity plus templates over the occurrence's input and output
//! fields. Matching an occurrence against a pattern extends a frame with the
//! pattern's variable bindings, or produces nothing at all.
//!
//! Rules with several trigger clauses complete gradually: a [`PartialMatch`]
//! records which clauses an in-progress candidate has satisfied so far, and
//! advances one clause at a time as occurrences arrive within a dispatch
//! cycle.

use std::sync::Arc;

use weft_foundation::Value;

use crate::contract::{Occurrence, OpRef};
use crate::frame::Frame;

// =============================================================================
// Field Patterns
// =============================================================================

/// A template over a single occurrence field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldPattern {
    /// Bind the field's value to a named variable (or unify with an
    /// existing binding of that name).
    Var(Arc<str>),
    /// Match only when the field equals this value exactly.
    Literal(Value),
    /// Match any value without binding it.
    Any,
}

impl FieldPattern {
    /// A variable pattern.
    #[must_use]
    pub fn var(name: impl Into<Arc<str>>) -> Self {
        Self::Var(name.into())
    }

    /// A literal pattern.
    #[must_use]
    pub fn lit(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Applies the pattern to a concrete value, extending the frame.
    ///
    /// Returns `None` on a literal mismatch or a conflicting rebind.
    #[must_use]
    fn apply(&self, value: &Value, frame: &Frame) -> Option<Frame> {
        match self {
            Self::Var(name) => frame.bind(Arc::clone(name), value.clone()),
            Self::Literal(expected) => (value == expected).then(|| frame.clone()),
            Self::Any => Some(frame.clone()),
        }
    }
}

// =============================================================================
// Outcome Selection
// =============================================================================

/// Which occurrence outcomes a trigger clause accepts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutcomePattern {
    /// Success outputs only (the default).
    #[default]
    Success,
    /// Failure outputs only; the `error` output field carries the message.
    Failure,
    /// Both outcomes.
    Either,
}

impl OutcomePattern {
    #[must_use]
    fn accepts(self, occurrence: &Occurrence) -> bool {
        match self {
            Self::Success => !occurrence.is_failure(),
            Self::Failure => occurrence.is_failure(),
            Self::Either => true,
        }
    }
}

// =============================================================================
// Trigger Patterns
// =============================================================================

/// One trigger clause of a rule: the operation to watch for, field
/// templates over its inputs and outputs, and an outcome selector.
#[derive(Clone, Debug)]
pub struct TriggerPattern {
    op: OpRef,
    inputs: Vec<(Arc<str>, FieldPattern)>,
    outputs: Vec<(Arc<str>, FieldPattern)>,
    outcome: OutcomePattern,
}

impl TriggerPattern {
    /// Starts a pattern watching the given operation, accepting success
    /// outcomes.
    #[must_use]
    pub fn on(op: OpRef) -> Self {
        Self {
            op,
            inputs: Vec::new(),
            outputs: Vec::new(),
            outcome: OutcomePattern::default(),
        }
    }

    /// Adds an input field template.
    #[must_use]
    pub fn input(mut self, field: impl Into<Arc<str>>, pattern: FieldPattern) -> Self {
        self.inputs.push((field.into(), pattern));
        self
    }

    /// Adds an output field template.
    #[must_use]
    pub fn output(mut self, field: impl Into<Arc<str>>, pattern: FieldPattern) -> Self {
        self.outputs.push((field.into(), pattern));
        self
    }

    /// Accepts failure outcomes only.
    #[must_use]
    pub fn on_failure(mut self) -> Self {
        self.outcome = OutcomePattern::Failure;
        self
    }

    /// Accepts both outcomes.
    #[must_use]
    pub fn any_outcome(mut self) -> Self {
        self.outcome = OutcomePattern::Either;
        self
    }

    /// The watched operation.
    #[must_use]
    pub fn op(&self) -> &OpRef {
        &self.op
    }

    /// The outcome selector.
    #[must_use]
    pub fn outcome(&self) -> OutcomePattern {
        self.outcome
    }

    /// Input field templates in declaration order.
    #[must_use]
    pub fn inputs(&self) -> &[(Arc<str>, FieldPattern)] {
        &self.inputs
    }

    /// Output field templates in declaration order.
    #[must_use]
    pub fn outputs(&self) -> &[(Arc<str>, FieldPattern)] {
        &self.outputs
    }

    /// Variable names this clause binds when it matches.
    pub fn bound_variables(&self) -> impl Iterator<Item = &Arc<str>> {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .filter_map(|(_, pattern)| match pattern {
                FieldPattern::Var(name) => Some(name),
                FieldPattern::Literal(_) | FieldPattern::Any => None,
            })
    }

    /// Matches the clause against a concrete occurrence, extending the base
    /// frame with the clause's bindings.
    ///
    /// A non-match is `None`, never an error: wrong operation, rejected
    /// outcome, absent field, literal mismatch, or a binding conflict with
    /// the base frame all fall through silently.
    #[must_use]
    pub fn matches(&self, occurrence: &Occurrence, base: &Frame) -> Option<Frame> {
        if occurrence.op != self.op || !self.outcome.accepts(occurrence) {
            return None;
        }
        let mut frame = base.clone();
        for (field, pattern) in &self.inputs {
            let value = occurrence.input_field(field)?;
            frame = pattern.apply(value, &frame)?;
        }
        for (field, pattern) in &self.outputs {
            let value = occurrence.output_field(field)?;
            frame = pattern.apply(&value, &frame)?;
        }
        Some(frame)
    }
}

// =============================================================================
// Partial Matches
// =============================================================================

/// An in-progress candidate match for a multi-clause rule.
///
/// Lives only within one dispatch cycle: the engine clears every rule's
/// partial-match store when the cycle ends, so clauses never pair
/// occurrences from different requests.
#[derive(Clone, Debug)]
pub struct PartialMatch {
    satisfied: Vec<bool>,
    frame: Frame,
}

impl PartialMatch {
    /// A fresh candidate with no clauses satisfied.
    #[must_use]
    pub fn empty(clause_count: usize) -> Self {
        Self {
            satisfied: vec![false; clause_count],
            frame: Frame::new(),
        }
    }

    /// Returns true once every clause is satisfied.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.satisfied.iter().all(|s| *s)
    }

    /// The accumulated bindings.
    #[must_use]
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Attempts to extend this candidate with one occurrence.
    ///
    /// One concrete occurrence satisfies at most one clause slot per
    /// candidate, so each still-unsatisfied clause the occurrence matches
    /// yields its own successor candidate; the receiver stays live for
    /// other occurrences.
    #[must_use]
    pub fn advance(&self, clauses: &[TriggerPattern], occurrence: &Occurrence) -> Vec<Self> {
        let mut successors = Vec::new();
        for (index, clause) in clauses.iter().enumerate() {
            if self.satisfied[index] {
                continue;
            }
            if let Some(frame) = clause.matches(occurrence, &self.frame) {
                let mut satisfied = self.satisfied.clone();
                satisfied[index] = true;
                successors.push(Self { satisfied, frame });
            }
        }
        successors
    }
}

// =============================================================================
// Tests
// =============================================================================
