//! The request/response boundary, expressed as operations.
//!
//! Inbound traffic never calls a concept directly. An arriving request is an
//! occurrence of the synthetic `request.arrive` operation; rules decide what
//! it causes. Responding is itself an operation (`request.respond` /
//! `request.reject`) whose handler records the outcome in a buffer the
//! caller reads back once the cascade settles. `timer.fire` plays the same
//! synthetic role for scheduled triggers.

use std::sync::{Arc, Mutex};

use weft_engine::{Occurrence, OperationContract, OperationOutput, Registry};
use weft_foundation::{Record, Result, Value, record};

use crate::lock;

/// Operation identities the boundary owns.
pub mod ops {
    use weft_engine::OpRef;

    /// `request.arrive` — synthetic; occurrences built by the session.
    #[must_use]
    pub fn request_arrive() -> OpRef {
        OpRef::new("request", "arrive")
    }

    /// `request.respond` — records a successful response.
    #[must_use]
    pub fn request_respond() -> OpRef {
        OpRef::new("request", "respond")
    }

    /// `request.reject` — records a failed response.
    #[must_use]
    pub fn request_reject() -> OpRef {
        OpRef::new("request", "reject")
    }

    /// `timer.fire` — synthetic; occurrences built by the session.
    #[must_use]
    pub fn timer_fire() -> OpRef {
        OpRef::new("timer", "fire")
    }
}

// =============================================================================
// Responses
// =============================================================================

/// One recorded response to a request.
#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    /// The request was answered.
    Accepted {
        /// The request identifier.
        request: Arc<str>,
        /// The response payload.
        body: Value,
    },
    /// The request was turned down.
    Rejected {
        /// The request identifier.
        request: Arc<str>,
        /// The rejection reason.
        error: Value,
    },
}

impl Response {
    /// The request this response answers.
    #[must_use]
    pub fn request(&self) -> &str {
        match self {
            Self::Accepted { request, .. } | Self::Rejected { request, .. } => request,
        }
    }

    /// Returns true for rejections.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Shared buffer the respond/reject handlers write into.
#[derive(Clone, Debug, Default)]
pub struct ResponseBuffer {
    inner: Arc<Mutex<Vec<Response>>>,
}

impl ResponseBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, response: Response) -> Result<()> {
        lock(&self.inner)?.push(response);
        Ok(())
    }

    /// Removes and returns the first response for the given request id.
    ///
    /// # Errors
    /// Returns an error if the buffer lock is poisoned.
    pub fn take(&self, request: &str) -> Result<Option<Response>> {
        let mut responses = lock(&self.inner)?;
        let index = responses.iter().position(|r| r.request() == request);
        Ok(index.map(|i| responses.remove(i)))
    }

    /// Removes and returns every buffered response.
    ///
    /// # Errors
    /// Returns an error if the buffer lock is poisoned.
    pub fn drain(&self) -> Result<Vec<Response>> {
        Ok(lock(&self.inner)?.drain(..).collect())
    }
}

// =============================================================================
// Boundary
// =============================================================================

/// Installs the boundary operations and owns the response buffer.
#[derive(Clone, Debug, Default)]
pub struct Boundary {
    buffer: ResponseBuffer,
}

impl Boundary {
    /// Creates a boundary with an empty response buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared response buffer.
    #[must_use]
    pub fn buffer(&self) -> ResponseBuffer {
        self.buffer.clone()
    }

    /// Installs boundary contracts into the registry.
    ///
    /// `request.arrive` is declared with `path` and `request` plus the
    /// application's payload fields, so rules matching on those fields
    /// validate against the contract. It carries no handler; the session
    /// constructs its occurrences.
    ///
    /// # Errors
    /// Returns an error if any operation name is already taken.
    pub fn install(&self, registry: &mut Registry, payload_fields: &[&str]) -> Result<()> {
        let mut arrive = OperationContract::action("request", "arrive")
            .with_input("path")
            .with_input("request");
        for field in payload_fields {
            arrive = arrive.with_input(*field);
        }
        registry.declare(arrive)?;
        registry.declare(OperationContract::action("timer", "fire").with_input("job"))?;

        let buffer = self.buffer.clone();
        registry.register_action(
            OperationContract::action("request", "respond")
                .with_input("request")
                .with_input("body"),
            move |input| {
                let Some(request) = input.get("request").and_then(Value::as_str) else {
                    return Ok(OperationOutput::failure("request must be a string"));
                };
                buffer.push(Response::Accepted {
                    request: Arc::from(request),
                    body: input.get("body").cloned().unwrap_or(Value::Nil),
                })?;
                Ok(OperationOutput::Success(Record::new()))
            },
        )?;

        let buffer = self.buffer.clone();
        registry.register_action(
            OperationContract::action("request", "reject")
                .with_input("request")
                .with_input("error"),
            move |input| {
                let Some(request) = input.get("request").and_then(Value::as_str) else {
                    return Ok(OperationOutput::failure("request must be a string"));
                };
                buffer.push(Response::Rejected {
                    request: Arc::from(request),
                    error: input.get("error").cloned().unwrap_or(Value::Nil),
                })?;
                Ok(OperationOutput::Success(Record::new()))
            },
        )
    }

    /// Builds a `request.arrive` occurrence from a payload.
    #[must_use]
    pub fn arrival(path: &str, request: &str, payload: &Record) -> Occurrence {
        let mut input = payload.clone();
        input = input.insert(Arc::from("path"), Value::from(path));
        input = input.insert(Arc::from("request"), Value::from(request));
        Occurrence::new(
            ops::request_arrive(),
            input,
            OperationOutput::Success(Record::new()),
        )
    }

    /// Builds a `timer.fire` occurrence for a scheduled job.
    #[must_use]
    pub fn timer(job: &str) -> Occurrence {
        Occurrence::new(
            ops::timer_fire(),
            record(&[("job", Value::from(job))]),
            OperationOutput::Success(Record::new()),
        )
    }
}
