//! Session wiring: concepts, boundary, rules, and the engine.
//!
//! A session is the whole application in one value. It builds the registry
//! from the concept modules and the request boundary, compiles the
//! application's synchronization rules against it, and owns the engine.
//! Requests and timer ticks enter through here and nowhere else.

use std::sync::Arc;

use weft_concepts::{
    AccountConcept, MappingConcept, ScoreConcept, SummaryConcept, TrackerConcept, shared_minter,
};
use weft_engine::{
    ArgSource, CascadeReport, EffectTemplate, Engine, EngineLimits, FieldPattern, FlowStep, OpRef,
    QueryStep, Registry, RuleSet, Synchronization, TriggerPattern,
};
use weft_foundation::{Record, Result, Value};

use crate::boundary::{Boundary, Response, ResponseBuffer, ops};

/// Payload fields the request boundary accepts, across all routes.
const PAYLOAD_FIELDS: [&str; 6] = ["name", "map", "region", "level", "tracker", "entry"];

// =============================================================================
// Configuration
// =============================================================================

/// Session construction parameters.
#[derive(Clone, Copy, Debug)]
pub struct SessionConfig {
    /// Seed for deterministic identifier minting.
    pub seed: u64,
    /// Cascade limits for the engine.
    pub limits: EngineLimits,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            limits: EngineLimits::default(),
        }
    }
}

impl SessionConfig {
    /// Overrides the minting seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Overrides the cascade limits.
    #[must_use]
    pub fn with_limits(mut self, limits: EngineLimits) -> Self {
        self.limits = limits;
        self
    }
}

// =============================================================================
// Request Outcomes
// =============================================================================

/// What one handled request produced.
#[derive(Debug)]
pub struct RequestOutcome {
    /// The minted request identifier.
    pub request: Arc<str>,
    /// The buffered response, if any rule responded.
    pub response: Option<Response>,
    /// The cascade the request caused.
    pub report: CascadeReport,
}

// =============================================================================
// Session
// =============================================================================

/// One running application instance.
#[derive(Debug)]
pub struct Session {
    engine: Engine,
    buffer: ResponseBuffer,
    minter: weft_concepts::SharedMinter,
}

impl Session {
    /// Builds the registry, compiles the application rules, and starts the
    /// engine.
    ///
    /// # Errors
    /// Returns an error if installation collides on an operation name or a
    /// rule fails validation. Both indicate a wiring bug, so callers treat
    /// this as fatal.
    pub fn new(config: SessionConfig) -> Result<Self> {
        let minter = shared_minter(config.seed);
        let boundary = Boundary::new();

        let mut registry = Registry::new();
        AccountConcept::new(Arc::clone(&minter)).install(&mut registry)?;
        MappingConcept::new(Arc::clone(&minter)).install(&mut registry)?;
        ScoreConcept::new(Arc::clone(&minter)).install(&mut registry)?;
        TrackerConcept::new(Arc::clone(&minter)).install(&mut registry)?;
        SummaryConcept::new(Arc::clone(&minter)).install(&mut registry)?;
        boundary.install(&mut registry, &PAYLOAD_FIELDS)?;

        let rules = RuleSet::compile(application_rules(), &registry)?;
        let buffer = boundary.buffer();
        let engine = Engine::new(registry, rules).with_limits(config.limits);
        Ok(Self {
            engine,
            buffer,
            minter,
        })
    }

    /// The engine, for direct queries in tests and tooling.
    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Handles one request: mints a request id, submits the arrival
    /// occurrence, and reads back the buffered response.
    ///
    /// No response means no rule answered the request; the caller decides
    /// what that maps to at its own edge.
    ///
    /// # Errors
    /// Returns an error if the cascade trips a limit or an operation breaks
    /// its contract.
    pub fn handle_request(&self, path: &str, payload: Record) -> Result<RequestOutcome> {
        let request = crate::lock(&self.minter)?.mint("request");
        let report = self
            .engine
            .submit(Boundary::arrival(path, &request, &payload))?;
        let response = self.buffer.take(&request)?;
        Ok(RequestOutcome {
            request,
            response,
            report,
        })
    }

    /// Fires a scheduled job.
    ///
    /// # Errors
    /// Returns an error if the cascade trips a limit or an operation breaks
    /// its contract.
    pub fn fire_timer(&self, job: &str) -> Result<CascadeReport> {
        self.engine.submit(Boundary::timer(job))
    }
}

// =============================================================================
// Application Rules
// =============================================================================

/// The application's synchronizations: route handling, provisioning, and
/// the scheduled summary.
#[must_use]
pub fn application_rules() -> Vec<Synchronization> {
    let mut rules = Vec::new();

    // A new account gets a body map and a tracker, in one cascade.
    rules.push(
        Synchronization::named("provision-on-register")
            .when(
                TriggerPattern::on(OpRef::new("account", "register"))
                    .output("user", FieldPattern::var("user")),
            )
            .then(
                EffectTemplate::invoke(OpRef::new("mapping", "generate"))
                    .field("owner", ArgSource::var("user")),
            )
            .then(
                EffectTemplate::invoke(OpRef::new("tracker", "track"))
                    .field("owner", ArgSource::var("user")),
            ),
    );

    // Routes: each path triggers its concept operation, then a two-clause
    // rule pairs the arrival with the operation's outcome to answer.
    rules.extend(route(
        "/register",
        OpRef::new("account", "register"),
        &[("name", "name")],
        "user",
    ));
    rules.extend(route(
        "/scores",
        OpRef::new("score", "assign"),
        &[("map", "map"), ("region", "region"), ("level", "level")],
        "score",
    ));
    rules.extend(route(
        "/events",
        OpRef::new("tracker", "log"),
        &[("tracker", "tracker"), ("entry", "entry")],
        "event",
    ));

    // Daily summary: enumerate trackers, count each one's events, compose a
    // snapshot per active owner.
    rules.push(
        Synchronization::named("daily-summary")
            .when(
                TriggerPattern::on(ops::timer_fire())
                    .input("job", FieldPattern::lit("daily-summary")),
            )
            .step(
                QueryStep::new(OpRef::new("tracker", "roster"))
                    .bind("tracker", "tracker")
                    .bind("owner", "owner"),
            )
            .step(
                QueryStep::new(OpRef::new("tracker", "event_count"))
                    .arg("tracker", ArgSource::var("tracker"))
                    .bind("count", "count"),
            )
            .step(FlowStep::filter("active-only", |frame| {
                frame.get("count").and_then(Value::as_int).unwrap_or(0) > 0
            }))
            .step(FlowStep::map("compose-body", &["body"], |frame| {
                let count = frame.get("count").and_then(Value::as_int).unwrap_or(0);
                vec![(
                    Arc::from("body"),
                    Value::from(format!("{count} event(s) logged")),
                )]
            }))
            .then(
                EffectTemplate::invoke(OpRef::new("summary", "compose"))
                    .field("owner", ArgSource::var("owner"))
                    .field("body", ArgSource::var("body")),
            ),
    );

    rules
}

/// Builds the three rules every route shares: trigger the operation from
/// the arrival, respond on its success, reject on its failure.
fn route(
    path: &str,
    op: OpRef,
    fields: &[(&str, &str)],
    result_field: &str,
) -> Vec<Synchronization> {
    let slug = path.trim_start_matches('/');

    let mut arrival = TriggerPattern::on(ops::request_arrive())
        .input("path", FieldPattern::lit(path))
        .input("request", FieldPattern::var("request"));
    let mut invoke = EffectTemplate::invoke(op.clone());
    for (input_field, payload_field) in fields {
        arrival = arrival.input(*payload_field, FieldPattern::var(*payload_field));
        invoke = invoke.field(*input_field, ArgSource::var(*payload_field));
    }

    let dispatch = Synchronization::named(format!("{slug}-dispatch"))
        .when(arrival.clone())
        .then(invoke);

    let respond = Synchronization::named(format!("{slug}-respond"))
        .when(
            TriggerPattern::on(ops::request_arrive())
                .input("path", FieldPattern::lit(path))
                .input("request", FieldPattern::var("request")),
        )
        .when(TriggerPattern::on(op.clone()).output(result_field, FieldPattern::var("result")))
        .then(
            EffectTemplate::invoke(ops::request_respond())
                .field("request", ArgSource::var("request"))
                .field("body", ArgSource::var("result")),
        );

    let reject = Synchronization::named(format!("{slug}-reject"))
        .when(
            TriggerPattern::on(ops::request_arrive())
                .input("path", FieldPattern::lit(path))
                .input("request", FieldPattern::var("request")),
        )
        .when(
            TriggerPattern::on(op)
                .on_failure()
                .output("error", FieldPattern::var("reason")),
        )
        .then(
            EffectTemplate::invoke(ops::request_reject())
                .field("request", ArgSource::var("request"))
                .field("error", ArgSource::var("reason")),
        );

    vec![dispatch, respond, reject]
}
