//! Error types for the Weft system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//!
//! Two classes of failure are deliberately NOT errors: a pattern that does
//! not match, and a frame dropped by unification or filtering. Those are
//! expected control flow of rule evaluation. Errors here are operator-visible
//! diagnostics: malformed rules, unknown operations, and tripped cascade
//! guards.

use std::fmt;

use thiserror::Error;

/// The main error type for Weft operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates an unknown operation error.
    #[must_use]
    pub fn unknown_operation(op: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownOperation(op.into()))
    }

    /// Creates a missing handler error.
    #[must_use]
    pub fn missing_handler(op: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingHandler(op.into()))
    }

    /// Creates a duplicate operation error.
    #[must_use]
    pub fn duplicate_operation(op: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateOperation(op.into()))
    }

    /// Creates a wrong-kind error for an operation invoked as an action.
    #[must_use]
    pub fn not_an_action(op: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAnAction(op.into()))
    }

    /// Creates a wrong-kind error for an operation invoked as a query.
    #[must_use]
    pub fn not_a_query(op: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAQuery(op.into()))
    }

    /// Creates a malformed rule error.
    #[must_use]
    pub fn malformed_rule(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedRule {
            rule: rule.into(),
            reason: reason.into(),
        })
    }

    /// Creates a missing field error.
    #[must_use]
    pub fn missing_field(op: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingField {
            op: op.into(),
            field: field.into(),
        })
    }

    /// Creates an unbound variable error.
    #[must_use]
    pub fn unbound_variable(rule: impl Into<String>, variable: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnboundVariable {
            rule: rule.into(),
            variable: variable.into(),
        })
    }

    /// Creates a cascade limit exceeded error.
    #[must_use]
    pub fn limit_exceeded(limit: CascadeLimit) -> Self {
        Self::new(ErrorKind::LimitExceeded(limit))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(msg.into()))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Operation is not registered.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// Operation was declared but has no installed handler.
    #[error("no handler installed for operation: {0}")]
    MissingHandler(String),

    /// Operation registered twice.
    #[error("operation registered twice: {0}")]
    DuplicateOperation(String),

    /// A query was used where an action is required.
    #[error("operation is a query, not an action: {0}")]
    NotAnAction(String),

    /// An action was used where a query is required.
    #[error("operation is an action, not a query: {0}")]
    NotAQuery(String),

    /// A rule declaration failed validation.
    #[error("malformed rule {rule}: {reason}")]
    MalformedRule {
        /// The rule that failed validation.
        rule: String,
        /// Why the rule is malformed.
        reason: String,
    },

    /// A record is missing a field its contract declares.
    #[error("operation {op} is missing declared field: {field}")]
    MissingField {
        /// The operation whose contract was violated.
        op: String,
        /// The missing field name.
        field: String,
    },

    /// A template referenced a variable no frame binding supplies.
    #[error("rule {rule} references unbound variable: {variable}")]
    UnboundVariable {
        /// The rule containing the reference.
        rule: String,
        /// The unbound variable name.
        variable: String,
    },

    /// Cascade guard exceeded (kill switch triggered).
    #[error("limit exceeded: {0}")]
    LimitExceeded(CascadeLimit),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Cascade guards (kill switches) that can be exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeLimit {
    /// Maximum cascade generations per dispatch cycle exceeded.
    MaxGenerations {
        /// The configured limit.
        limit: u32,
    },
    /// Maximum occurrences processed per dispatch cycle exceeded.
    MaxOccurrences {
        /// The configured limit.
        limit: usize,
    },
    /// Maximum frames produced by a single rule firing exceeded.
    MaxFrames {
        /// The configured limit.
        limit: usize,
    },
}

impl fmt::Display for CascadeLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxGenerations { limit } => {
                write!(f, "max cascade generations ({limit}) exceeded")
            }
            Self::MaxOccurrences { limit } => {
                write!(f, "max occurrences per cycle ({limit}) exceeded")
            }
            Self::MaxFrames { limit } => {
                write!(f, "max frames per firing ({limit}) exceeded")
            }
        }
    }
}

/// Context about where an error occurred during rule evaluation.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The rule under evaluation, if any.
    pub rule: Option<String>,
    /// The cascade generation at the point of failure.
    pub generation: Option<u32>,
    /// Stack of rule/step names leading to the error.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rule name.
    #[must_use]
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    /// Sets the cascade generation.
    #[must_use]
    pub fn with_generation(mut self, generation: u32) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(rule) = &self.rule {
            write!(f, "in rule {rule}")?;
        }
        if let Some(generation) = self.generation {
            if self.rule.is_some() {
                write!(f, ", ")?;
            }
            write!(f, "generation {generation}")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}
