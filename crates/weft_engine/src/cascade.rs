//! The reactive dispatch loop.
//!
//! The engine is the only component that sees occurrences. Submitting one
//! starts a cascade: the occurrence is matched against every rule, completed
//! matches run their flow and effects, and each effect invocation yields a
//! new occurrence enqueued for the next generation. Dispatch is
//! breadth-first and single-threaded; a generation is one full drain of the
//! work queue.
//!
//! Runaway cascades are cut off by hard limits rather than detected: the
//! engine aborts the cycle with an error, leaving already-applied effects in
//! place, and the host carries on.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use weft_foundation::{CascadeLimit, Error, ErrorContext, Record, Result};

use crate::contract::{Occurrence, OpRef, Registry};
use crate::flow::FlowStage;
use crate::frame::FrameSet;
use crate::pattern::PartialMatch;
use crate::rule::RuleSet;

// =============================================================================
// Limits
// =============================================================================

/// Hard ceilings on a single cascade.
#[derive(Clone, Copy, Debug)]
pub struct EngineLimits {
    /// Maximum queue-drain passes per cascade.
    pub max_generations: u32,
    /// Maximum occurrences dispatched per cascade.
    pub max_occurrences: usize,
    /// Maximum frames a single rule firing may fan out to.
    pub max_frames: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_generations: 16,
            max_occurrences: 10_000,
            max_frames: 10_000,
        }
    }
}

impl EngineLimits {
    /// Overrides the generation ceiling.
    #[must_use]
    pub fn with_max_generations(mut self, limit: u32) -> Self {
        self.max_generations = limit;
        self
    }

    /// Overrides the occurrence ceiling.
    #[must_use]
    pub fn with_max_occurrences(mut self, limit: usize) -> Self {
        self.max_occurrences = limit;
        self
    }

    /// Overrides the per-firing frame ceiling.
    #[must_use]
    pub fn with_max_frames(mut self, limit: usize) -> Self {
        self.max_frames = limit;
        self
    }
}

// =============================================================================
// Reports
// =============================================================================

/// One rule firing within a cascade.
#[derive(Clone, Debug)]
pub struct FiringRecord {
    /// The rule that fired.
    pub rule: Arc<str>,
    /// The generation it fired in (1-based).
    pub generation: u32,
    /// Frames that survived the flow stage.
    pub frames: usize,
    /// Effect invocations performed.
    pub effects: usize,
}

/// The ordered trace of rule firings in one cascade.
#[derive(Clone, Debug, Default)]
pub struct CascadeTrace {
    firings: Vec<FiringRecord>,
}

impl CascadeTrace {
    /// The firings in dispatch order.
    #[must_use]
    pub fn firings(&self) -> &[FiringRecord] {
        &self.firings
    }

    /// Number of rule firings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.firings.len()
    }

    /// Returns true if no rule fired.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.firings.is_empty()
    }

    fn push(&mut self, record: FiringRecord) {
        self.firings.push(record);
    }
}

impl fmt::Display for CascadeTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for firing in &self.firings {
            writeln!(
                f,
                "gen {}: {} ({} frame(s), {} effect(s))",
                firing.generation, firing.rule, firing.frames, firing.effects
            )?;
        }
        Ok(())
    }
}

/// Summary of one completed cascade.
#[derive(Clone, Debug)]
pub struct CascadeReport {
    /// Occurrences dispatched, the submitted one included.
    pub occurrences: usize,
    /// Generations used.
    pub generations: u32,
    /// The firing trace.
    pub trace: CascadeTrace,
}

// =============================================================================
// Engine
// =============================================================================

/// An occurrence waiting for dispatch, tagged with the rule whose effect
/// enqueued it. The submitted occurrence has no source.
#[derive(Debug)]
struct Pending {
    occurrence: Occurrence,
    source: Option<Arc<str>>,
}

impl Pending {
    fn limit_context(&self, generation: u32) -> ErrorContext {
        let context = ErrorContext::new().with_generation(generation);
        match &self.source {
            Some(rule) => context.with_rule(&**rule),
            None => context,
        }
    }
}

/// The reactive engine: registry, compiled rules, and limits.
#[derive(Debug)]
pub struct Engine {
    registry: Registry,
    rules: RuleSet,
    limits: EngineLimits,
}

impl Engine {
    /// Creates an engine with default limits.
    #[must_use]
    pub fn new(registry: Registry, rules: RuleSet) -> Self {
        Self {
            registry,
            rules,
            limits: EngineLimits::default(),
        }
    }

    /// Overrides the cascade limits.
    #[must_use]
    pub fn with_limits(mut self, limits: EngineLimits) -> Self {
        self.limits = limits;
        self
    }

    /// The operation registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The compiled rules.
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Invokes an action through the registry and cascades from its
    /// occurrence.
    ///
    /// # Errors
    /// Returns an error if the invocation itself fails or the cascade trips
    /// a limit.
    pub fn apply(&self, op: &OpRef, input: Record) -> Result<(Occurrence, CascadeReport)> {
        let occurrence = self.registry.invoke(op, input)?;
        let report = self.submit(occurrence.clone())?;
        Ok((occurrence, report))
    }

    /// Dispatches an occurrence and runs the cascade to quiescence.
    ///
    /// Partial multi-clause matches live exactly as long as this call:
    /// clauses may pair occurrences across generations of one cascade, never
    /// across cascades.
    ///
    /// # Errors
    /// Returns `LimitExceeded` when a ceiling is hit (effects already
    /// applied stay applied), or whatever error an effect invocation or
    /// flow query produced.
    pub fn submit(&self, occurrence: Occurrence) -> Result<CascadeReport> {
        let mut queue: VecDeque<Pending> = VecDeque::new();
        queue.push_back(Pending {
            occurrence,
            source: None,
        });

        let mut partials: Vec<Vec<PartialMatch>> =
            self.rules.rules().iter().map(|_| Vec::new()).collect();
        let mut trace = CascadeTrace::default();
        let mut generation: u32 = 0;
        let mut dispatched: usize = 0;

        while !queue.is_empty() {
            generation += 1;
            if generation > self.limits.max_generations {
                // Blame the rule that fed the generation past the ceiling.
                let context = queue
                    .front()
                    .map_or_else(ErrorContext::new, |p| p.limit_context(generation));
                return Err(Error::limit_exceeded(CascadeLimit::MaxGenerations {
                    limit: self.limits.max_generations,
                })
                .with_context(context));
            }

            let batch: Vec<Pending> = queue.drain(..).collect();
            for pending in batch {
                dispatched += 1;
                if dispatched > self.limits.max_occurrences {
                    return Err(Error::limit_exceeded(CascadeLimit::MaxOccurrences {
                        limit: self.limits.max_occurrences,
                    })
                    .with_context(pending.limit_context(generation)));
                }
                self.dispatch(
                    &pending.occurrence,
                    generation,
                    &mut partials,
                    &mut queue,
                    &mut trace,
                )?;
            }
        }

        Ok(CascadeReport {
            occurrences: dispatched,
            generations: generation,
            trace,
        })
    }

    /// Matches one occurrence against every rule, firing completed matches.
    fn dispatch(
        &self,
        occurrence: &Occurrence,
        generation: u32,
        partials: &mut [Vec<PartialMatch>],
        queue: &mut VecDeque<Pending>,
        trace: &mut CascadeTrace,
    ) -> Result<()> {
        for (rule, store) in self.rules.rules().iter().zip(partials.iter_mut()) {
            let clauses = rule.triggers();
            let fresh = PartialMatch::empty(clauses.len());

            let mut completed = Vec::new();
            let mut extended = Vec::new();
            for candidate in store.iter().chain(std::iter::once(&fresh)) {
                for successor in candidate.advance(clauses, occurrence) {
                    if successor.is_complete() {
                        completed.push(successor);
                    } else {
                        extended.push(successor);
                    }
                }
            }
            store.extend(extended);

            for matched in completed {
                self.fire(rule, matched, generation, queue, trace)?;
            }
        }
        Ok(())
    }

    /// Runs one completed match: flow stage, then effects in declared order
    /// per frame.
    fn fire(
        &self,
        rule: &crate::rule::Synchronization,
        matched: PartialMatch,
        generation: u32,
        queue: &mut VecDeque<Pending>,
        trace: &mut CascadeTrace,
    ) -> Result<()> {
        let rule_name: Arc<str> = Arc::from(rule.name());
        let context = || {
            ErrorContext::new()
                .with_rule(rule.name())
                .with_generation(generation)
        };

        let stage = FlowStage::new(rule.name(), &self.registry);
        let frames = stage
            .run(rule.flow(), FrameSet::from_frame(matched.frame().clone()))
            .map_err(|e| e.with_context(context()))?;
        if frames.len() > self.limits.max_frames {
            return Err(Error::limit_exceeded(CascadeLimit::MaxFrames {
                limit: self.limits.max_frames,
            })
            .with_context(context()));
        }
        // A flow that dropped every frame annihilates the firing entirely.
        if frames.is_empty() {
            return Ok(());
        }

        let mut effects = 0;
        for frame in frames.iter() {
            for effect in rule.effects() {
                let input = effect
                    .build_input(rule.name(), frame)
                    .map_err(|e| e.with_context(context()))?;
                let produced = self
                    .registry
                    .invoke(effect.op(), input)
                    .map_err(|e| e.with_context(context()))?;
                queue.push_back(Pending {
                    occurrence: produced,
                    source: Some(Arc::clone(&rule_name)),
                });
                effects += 1;
            }
        }

        trace.push(FiringRecord {
            rule: rule_name,
            generation,
            frames: frames.len(),
            effects,
        });
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
