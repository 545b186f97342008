//! The declarative flow stage between a rule's triggers and its effects.
//!
//! Once a rule's trigger clauses complete, the matched frame passes through
//! an ordered pipeline of flow steps: queries fan frames out across result
//! rows (an inner join), filters narrow the set, and maps derive new
//! bindings. Steps are pure with respect to frames; only queries touch
//! module state, and only to read it.

use std::fmt;
use std::sync::Arc;

use weft_foundation::{Error, Record, Result, Value};

use crate::contract::{OpRef, Registry};
use crate::frame::{Frame, FrameSet};

// =============================================================================
// Argument Sources
// =============================================================================

/// How a query argument or effect field is filled from a frame.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgSource {
    /// Take the value bound to this variable.
    Var(Arc<str>),
    /// Use this value as-is.
    Literal(Value),
}

impl ArgSource {
    /// A variable source.
    #[must_use]
    pub fn var(name: impl Into<Arc<str>>) -> Self {
        Self::Var(name.into())
    }

    /// A literal source.
    #[must_use]
    pub fn lit(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// The variable name this source reads, if any.
    #[must_use]
    pub fn variable(&self) -> Option<&Arc<str>> {
        match self {
            Self::Var(name) => Some(name),
            Self::Literal(_) => None,
        }
    }

    /// Resolves the source against a frame.
    ///
    /// An unbound variable here means rule validation was circumvented or a
    /// map step under-delivered its declared bindings.
    #[must_use]
    pub fn resolve(&self, frame: &Frame) -> Option<Value> {
        match self {
            Self::Var(name) => frame.get(name).cloned(),
            Self::Literal(value) => Some(value.clone()),
        }
    }
}

// =============================================================================
// Flow Steps
// =============================================================================

/// Predicate over a frame; `false` drops the frame.
pub type FilterFn = Arc<dyn Fn(&Frame) -> bool + Send + Sync>;

/// Derives new bindings from a frame.
pub type MapFn = Arc<dyn Fn(&Frame) -> Vec<(Arc<str>, Value)> + Send + Sync>;

/// A query step: invoke a registry query per frame and join its rows in.
#[derive(Clone, Debug)]
pub struct QueryStep {
    op: OpRef,
    args: Vec<(Arc<str>, ArgSource)>,
    bind: Vec<(Arc<str>, Arc<str>)>,
}

impl QueryStep {
    /// Starts a query step against the given operation.
    #[must_use]
    pub fn new(op: OpRef) -> Self {
        Self {
            op,
            args: Vec::new(),
            bind: Vec::new(),
        }
    }

    /// Supplies a query argument.
    #[must_use]
    pub fn arg(mut self, field: impl Into<Arc<str>>, source: ArgSource) -> Self {
        self.args.push((field.into(), source));
        self
    }

    /// Binds a result-row field to a frame variable.
    #[must_use]
    pub fn bind(mut self, field: impl Into<Arc<str>>, variable: impl Into<Arc<str>>) -> Self {
        self.bind.push((field.into(), variable.into()));
        self
    }

    /// The queried operation.
    #[must_use]
    pub fn op(&self) -> &OpRef {
        &self.op
    }

    /// Argument templates in declaration order.
    #[must_use]
    pub fn args(&self) -> &[(Arc<str>, ArgSource)] {
        &self.args
    }

    /// Row-field-to-variable bindings.
    #[must_use]
    pub fn bindings(&self) -> &[(Arc<str>, Arc<str>)] {
        &self.bind
    }
}

/// One step of a rule's flow pipeline, run strictly in declared order.
#[derive(Clone)]
pub enum FlowStep {
    /// Fan each frame out across the rows of a read-only query (inner join:
    /// zero rows drops the frame).
    Query(QueryStep),
    /// Keep only frames satisfying a pure predicate.
    Filter {
        /// Diagnostic label for traces and errors.
        name: Arc<str>,
        /// The predicate.
        predicate: FilterFn,
    },
    /// Derive new bindings from each frame. Never drops a frame, except
    /// that deriving a name already bound to a different value is a
    /// unification failure for that frame.
    Map {
        /// Diagnostic label for traces and errors.
        name: Arc<str>,
        /// Binding names the derivation promises to produce; declared
        /// up-front so rule validation can check data flow past the
        /// opaque closure.
        provides: Vec<Arc<str>>,
        /// The derivation.
        derive: MapFn,
    },
}

impl FlowStep {
    /// A filter step.
    #[must_use]
    pub fn filter<F>(name: impl Into<Arc<str>>, predicate: F) -> Self
    where
        F: Fn(&Frame) -> bool + Send + Sync + 'static,
    {
        Self::Filter {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// A map step declaring the binding names it produces.
    #[must_use]
    pub fn map<F>(name: impl Into<Arc<str>>, provides: &[&str], derive: F) -> Self
    where
        F: Fn(&Frame) -> Vec<(Arc<str>, Value)> + Send + Sync + 'static,
    {
        Self::Map {
            name: name.into(),
            provides: provides.iter().map(|p| Arc::from(*p)).collect(),
            derive: Arc::new(derive),
        }
    }

    /// Binding names this step introduces into later steps and effects.
    pub fn provided_variables(&self) -> Vec<Arc<str>> {
        match self {
            Self::Query(query) => query.bind.iter().map(|(_, var)| Arc::clone(var)).collect(),
            Self::Filter { .. } => Vec::new(),
            Self::Map { provides, .. } => provides.clone(),
        }
    }
}

impl From<QueryStep> for FlowStep {
    fn from(step: QueryStep) -> Self {
        Self::Query(step)
    }
}

impl fmt::Debug for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query(query) => f.debug_tuple("Query").field(query).finish(),
            Self::Filter { name, .. } => f.debug_struct("Filter").field("name", name).finish(),
            Self::Map { name, provides, .. } => f
                .debug_struct("Map")
                .field("name", name)
                .field("provides", provides)
                .finish(),
        }
    }
}

// =============================================================================
// Flow Stage
// =============================================================================

/// Runs a rule's flow pipeline over a frame set.
pub struct FlowStage<'a> {
    rule: &'a str,
    registry: &'a Registry,
}

impl<'a> FlowStage<'a> {
    /// Creates a stage for one rule evaluation.
    #[must_use]
    pub fn new(rule: &'a str, registry: &'a Registry) -> Self {
        Self { rule, registry }
    }

    /// Runs the steps strictly in order.
    ///
    /// An empty frame set short-circuits: remaining steps see no frames and
    /// the rule fires nothing.
    ///
    /// # Errors
    /// Returns an error if a query argument reads an unbound variable or
    /// the queried operation fails to execute.
    pub fn run(&self, steps: &[FlowStep], frames: FrameSet) -> Result<FrameSet> {
        let mut frames = frames;
        for step in steps {
            if frames.is_empty() {
                break;
            }
            frames = match step {
                FlowStep::Query(query) => self.run_query(query, &frames)?,
                FlowStep::Filter { predicate, .. } => frames.retain(|frame| predicate(frame)),
                FlowStep::Map { derive, .. } => frames.expand(|frame| {
                    let mut current = frame.clone();
                    for (name, value) in derive(frame) {
                        match current.bind(name, value) {
                            Some(extended) => current = extended,
                            None => return vec![],
                        }
                    }
                    vec![current]
                }),
            };
        }
        Ok(frames)
    }

    fn run_query(&self, query: &QueryStep, frames: &FrameSet) -> Result<FrameSet> {
        let mut out = FrameSet::new();
        for frame in frames.iter() {
            let mut input = Record::new();
            for (field, source) in &query.args {
                let value = source.resolve(frame).ok_or_else(|| {
                    source.variable().map_or_else(
                        || Error::internal("literal argument failed to resolve"),
                        |var| Error::unbound_variable(self.rule, var.to_string()),
                    )
                })?;
                input = input.insert(Arc::clone(field), value);
            }
            for row in self.registry.query(&query.op, input)? {
                // Rename row fields to their binding names; a row missing a
                // declared field does not join.
                let mut renamed = Some(Record::new());
                for (field, variable) in &query.bind {
                    renamed = match (renamed, row.get(field)) {
                        (Some(current), Some(value)) => {
                            Some(current.insert(Arc::clone(variable), value.clone()))
                        }
                        _ => None,
                    };
                }
                let joined = renamed.and_then(|renamed| frame.merge_record(&renamed));
                if let Some(joined) = joined {
                    out.push(joined);
                }
            }
        }
        Ok(out)
    }
}

// =============================================================================
// Tests
// =============================================================================
