//! Synchronization rules and registration-time validation.
//!
//! A synchronization is declarative glue between modules that never call
//! each other: *when* these operations occur, *where* these additional
//! facts hold, *then* invoke these operations. Rules are compiled into an
//! immutable [`RuleSet`] once at startup; malformed rules fail loudly then,
//! not at dispatch time.

use std::collections::HashSet;
use std::sync::Arc;

use weft_foundation::{Error, Record, Result};

use crate::contract::{OpRef, OperationKind, Registry};
use crate::flow::{ArgSource, FlowStep};
use crate::frame::Frame;
use crate::pattern::{OutcomePattern, TriggerPattern};

// =============================================================================
// Effect Templates
// =============================================================================

/// A consequent operation invocation: which action to fire and how to fill
/// its input from the matched frame.
#[derive(Clone, Debug)]
pub struct EffectTemplate {
    op: OpRef,
    fields: Vec<(Arc<str>, ArgSource)>,
}

impl EffectTemplate {
    /// Starts a template invoking the given operation.
    #[must_use]
    pub fn invoke(op: OpRef) -> Self {
        Self {
            op,
            fields: Vec::new(),
        }
    }

    /// Fills an input field from a frame variable or literal.
    #[must_use]
    pub fn field(mut self, name: impl Into<Arc<str>>, source: ArgSource) -> Self {
        self.fields.push((name.into(), source));
        self
    }

    /// The invoked operation.
    #[must_use]
    pub fn op(&self) -> &OpRef {
        &self.op
    }

    /// Input field templates in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[(Arc<str>, ArgSource)] {
        &self.fields
    }

    /// Materializes the input record for one frame.
    ///
    /// # Errors
    /// Returns an error if a field reads a variable the frame never bound.
    pub fn build_input(&self, rule: &str, frame: &Frame) -> Result<Record> {
        let mut input = Record::new();
        for (name, source) in &self.fields {
            let value = source.resolve(frame).ok_or_else(|| {
                source.variable().map_or_else(
                    || Error::internal("literal effect field failed to resolve"),
                    |var| Error::unbound_variable(rule, var.to_string()),
                )
            })?;
            input = input.insert(Arc::clone(name), value);
        }
        Ok(input)
    }
}

// =============================================================================
// Synchronizations
// =============================================================================

/// One declarative rule: name, trigger clauses, flow steps, and effects.
#[derive(Clone, Debug)]
pub struct Synchronization {
    name: Arc<str>,
    when: Vec<TriggerPattern>,
    steps: Vec<FlowStep>,
    then: Vec<EffectTemplate>,
}

impl Synchronization {
    /// Starts a rule with the given diagnostic name.
    #[must_use]
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            when: Vec::new(),
            steps: Vec::new(),
            then: Vec::new(),
        }
    }

    /// Adds a trigger clause; all clauses must complete before the rule
    /// fires.
    #[must_use]
    pub fn when(mut self, pattern: TriggerPattern) -> Self {
        self.when.push(pattern);
        self
    }

    /// Appends a flow step.
    #[must_use]
    pub fn step(mut self, step: impl Into<FlowStep>) -> Self {
        self.steps.push(step.into());
        self
    }

    /// Appends a consequent effect.
    #[must_use]
    pub fn then(mut self, effect: EffectTemplate) -> Self {
        self.then.push(effect);
        self
    }

    /// The rule's diagnostic name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Trigger clauses in declaration order.
    #[must_use]
    pub fn triggers(&self) -> &[TriggerPattern] {
        &self.when
    }

    /// Flow steps in declaration order.
    #[must_use]
    pub fn flow(&self) -> &[FlowStep] {
        &self.steps
    }

    /// Effect templates in declaration order.
    #[must_use]
    pub fn effects(&self) -> &[EffectTemplate] {
        &self.then
    }
}

// =============================================================================
// Rule Sets
// =============================================================================

/// The compiled, validated set of rules for one engine.
///
/// Immutable for the process lifetime.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    rules: Vec<Synchronization>,
}

impl RuleSet {
    /// Validates rules against the registry's contracts and freezes them.
    ///
    /// Checks, per rule: shape (at least one trigger, at least one effect,
    /// a unique name); every referenced operation is registered and of the
    /// right kind (triggers and effects name actions, flow queries name
    /// queries); every template field appears in the named contract; and
    /// every variable a query argument or effect reads is bound by an
    /// earlier trigger clause, query bind, or map step. The data-flow check
    /// is best-effort: map closures are opaque, so their declared
    /// `provides` lists stand in for what they compute.
    ///
    /// # Errors
    /// Returns `MalformedRule`, `UnknownOperation`, `MissingField`, or
    /// `UnboundVariable` describing the first offending rule.
    pub fn compile(rules: Vec<Synchronization>, registry: &Registry) -> Result<Self> {
        let mut names = HashSet::new();
        for rule in &rules {
            if !names.insert(rule.name().to_string()) {
                return Err(Error::malformed_rule(rule.name(), "duplicate rule name"));
            }
            Self::check_rule(rule, registry)?;
        }
        Ok(Self { rules })
    }

    /// The rules in registration order.
    #[must_use]
    pub fn rules(&self) -> &[Synchronization] {
        &self.rules
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rules are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn check_rule(rule: &Synchronization, registry: &Registry) -> Result<()> {
        if rule.triggers().is_empty() {
            return Err(Error::malformed_rule(rule.name(), "no trigger clauses"));
        }
        if rule.effects().is_empty() {
            return Err(Error::malformed_rule(rule.name(), "no effects"));
        }

        let mut bound: HashSet<Arc<str>> = HashSet::new();
        for clause in rule.triggers() {
            Self::check_trigger(rule.name(), clause, registry)?;
            bound.extend(clause.bound_variables().cloned());
        }
        for step in rule.flow() {
            Self::check_step(rule.name(), step, &bound, registry)?;
            bound.extend(step.provided_variables());
        }
        for effect in rule.effects() {
            Self::check_effect(rule.name(), effect, &bound, registry)?;
        }
        Ok(())
    }

    fn check_trigger(rule: &str, clause: &TriggerPattern, registry: &Registry) -> Result<()> {
        let contract = registry
            .contract(clause.op())
            .ok_or_else(|| Error::unknown_operation(clause.op().to_string()))?;
        if contract.kind() != OperationKind::Action {
            return Err(Error::malformed_rule(
                rule,
                format!("trigger {} names a query; queries never occur", clause.op()),
            ));
        }
        for (field, _) in clause.inputs() {
            if !contract.declares_input(field) {
                return Err(Error::missing_field(clause.op().to_string(), field.to_string()));
            }
        }
        for (field, _) in clause.outputs() {
            let failure_field = &**field == crate::contract::OperationOutput::ERROR_FIELD;
            let allowed = match clause.outcome() {
                OutcomePattern::Success => contract.declares_output(field),
                OutcomePattern::Failure => failure_field,
                OutcomePattern::Either => failure_field || contract.declares_output(field),
            };
            if !allowed {
                return Err(Error::missing_field(clause.op().to_string(), field.to_string()));
            }
        }
        Ok(())
    }

    fn check_step(
        rule: &str,
        step: &FlowStep,
        bound: &HashSet<Arc<str>>,
        registry: &Registry,
    ) -> Result<()> {
        let FlowStep::Query(query) = step else {
            return Ok(());
        };
        let contract = registry
            .contract(query.op())
            .ok_or_else(|| Error::unknown_operation(query.op().to_string()))?;
        if contract.kind() != OperationKind::Query {
            return Err(Error::malformed_rule(
                rule,
                format!("flow step {} names an action, not a query", query.op()),
            ));
        }
        for (field, source) in query.args() {
            if !contract.declares_input(field) {
                return Err(Error::missing_field(query.op().to_string(), field.to_string()));
            }
            if let Some(var) = source.variable() {
                if !bound.contains(var) {
                    return Err(Error::unbound_variable(rule, var.to_string()));
                }
            }
        }
        for (field, _) in query.bindings() {
            if !contract.declares_output(field) {
                return Err(Error::missing_field(query.op().to_string(), field.to_string()));
            }
        }
        Ok(())
    }

    fn check_effect(
        rule: &str,
        effect: &EffectTemplate,
        bound: &HashSet<Arc<str>>,
        registry: &Registry,
    ) -> Result<()> {
        let contract = registry
            .contract(effect.op())
            .ok_or_else(|| Error::unknown_operation(effect.op().to_string()))?;
        if contract.kind() != OperationKind::Action {
            return Err(Error::malformed_rule(
                rule,
                format!("effect {} names a query, not an action", effect.op()),
            ));
        }
        for (field, source) in effect.fields() {
            if !contract.declares_input(field) {
                return Err(Error::missing_field(effect.op().to_string(), field.to_string()));
            }
            if let Some(var) = source.variable() {
                if !bound.contains(var) {
                    return Err(Error::unbound_variable(rule, var.to_string()));
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
