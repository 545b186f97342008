//! Operation contracts, the registry, and occurrences.
//!
//! A contract is pure metadata: which module and operation, whether it is a
//! state-mutating action or a read-only query, and which input/output fields
//! it declares. The registry maps contracts to callables and passes
//! invocations through without inspecting module internals.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use weft_foundation::{Error, Record, Result, Value};

// =============================================================================
// Operation Identity
// =============================================================================

/// Identity of an operation: a `(module, operation)` pair.
///
/// Cheap to clone and compare; used as the registry key and in trigger
/// patterns and effect templates.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct OpRef {
    module: Arc<str>,
    name: Arc<str>,
}

impl OpRef {
    /// Creates an operation reference.
    #[must_use]
    pub fn new(module: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }

    /// The owning module.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// The operation name within the module.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for OpRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.name)
    }
}

impl fmt::Display for OpRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.name)
    }
}

// =============================================================================
// Contracts
// =============================================================================

/// Whether an operation mutates module state or only reads it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationKind {
    /// State-mutating operation; each invocation produces an [`Occurrence`].
    Action,
    /// Read-only operation returning zero or more records; never observed
    /// as an occurrence.
    Query,
}

/// The declared shape of an operation.
///
/// Contracts are immutable once registered. The engine checks field names
/// for presence only; values are opaque and never type-checked.
#[derive(Clone, Debug)]
pub struct OperationContract {
    op: OpRef,
    kind: OperationKind,
    inputs: Vec<Arc<str>>,
    outputs: Vec<Arc<str>>,
}

impl OperationContract {
    /// Declares an action contract.
    #[must_use]
    pub fn action(module: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Self {
            op: OpRef::new(module, name),
            kind: OperationKind::Action,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Declares a query contract.
    #[must_use]
    pub fn query(module: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Self {
            op: OpRef::new(module, name),
            kind: OperationKind::Query,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Adds a declared input field.
    #[must_use]
    pub fn with_input(mut self, field: impl Into<Arc<str>>) -> Self {
        self.inputs.push(field.into());
        self
    }

    /// Adds a declared output field (success payload for actions, result
    /// row shape for queries).
    #[must_use]
    pub fn with_output(mut self, field: impl Into<Arc<str>>) -> Self {
        self.outputs.push(field.into());
        self
    }

    /// The operation identity.
    #[must_use]
    pub fn op(&self) -> &OpRef {
        &self.op
    }

    /// The operation kind.
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Declared input field names.
    #[must_use]
    pub fn inputs(&self) -> &[Arc<str>] {
        &self.inputs
    }

    /// Declared output field names.
    #[must_use]
    pub fn outputs(&self) -> &[Arc<str>] {
        &self.outputs
    }

    /// Returns true if the contract declares this input field.
    #[must_use]
    pub fn declares_input(&self, field: &str) -> bool {
        self.inputs.iter().any(|f| &**f == field)
    }

    /// Returns true if the contract declares this output field.
    #[must_use]
    pub fn declares_output(&self, field: &str) -> bool {
        self.outputs.iter().any(|f| &**f == field)
    }
}

// =============================================================================
// Outputs and Occurrences
// =============================================================================

/// The output of an action: exactly one of a success payload or a failure
/// message, never both.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationOutput {
    /// The operation succeeded with the declared payload fields.
    Success(Record),
    /// The operation failed with a human-readable error.
    Failure(Arc<str>),
}

impl OperationOutput {
    /// The field name failure payloads expose.
    pub const ERROR_FIELD: &'static str = "error";

    /// Creates a failure output.
    #[must_use]
    pub fn failure(message: impl Into<Arc<str>>) -> Self {
        Self::Failure(message.into())
    }

    /// Returns true if this is a failure output.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Looks up an output field by name.
    ///
    /// Failure outputs expose a single `error` field carrying the message.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Value> {
        match self {
            Self::Success(record) => record.get(name).cloned(),
            Self::Failure(message) => {
                (name == Self::ERROR_FIELD).then(|| Value::String(Arc::clone(message)))
            }
        }
    }
}

/// One concrete firing of an operation: the contract identity, the concrete
/// inputs supplied, and the output produced.
///
/// Occurrences are ephemeral. The engine creates them as operations
/// complete, matches rules against them within the current dispatch cycle,
/// and discards them; they carry no identity across time.
#[derive(Clone, Debug)]
pub struct Occurrence {
    /// The operation that fired.
    pub op: OpRef,
    /// Concrete input values supplied to the operation.
    pub input: Record,
    /// The output the operation produced.
    pub output: OperationOutput,
}

impl Occurrence {
    /// Creates an occurrence.
    #[must_use]
    pub fn new(op: OpRef, input: Record, output: OperationOutput) -> Self {
        Self { op, input, output }
    }

    /// Returns true if the output is failure-shaped.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.output.is_failure()
    }

    /// Looks up a concrete input field.
    #[must_use]
    pub fn input_field(&self, name: &str) -> Option<&Value> {
        self.input.get(name)
    }

    /// Looks up a concrete output field.
    #[must_use]
    pub fn output_field(&self, name: &str) -> Option<Value> {
        self.output.field(name)
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Callable for a state-mutating action.
pub type ActionFn = Arc<dyn Fn(&Record) -> Result<OperationOutput> + Send + Sync>;

/// Callable for a read-only query.
pub type QueryFn = Arc<dyn Fn(&Record) -> Result<Vec<Record>> + Send + Sync>;

enum Handler {
    /// Contract only: occurrences are constructed externally (request
    /// boundary, timer). Invoking is an error.
    None,
    Action(ActionFn),
    Query(QueryFn),
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "<declared>"),
            Self::Action(_) => write!(f, "<action handler>"),
            Self::Query(_) => write!(f, "<query handler>"),
        }
    }
}

#[derive(Debug)]
struct Registered {
    contract: OperationContract,
    handler: Handler,
}

/// Catalog mapping operation identities to contracts and callables.
///
/// Built once at startup, then read-only for the process lifetime.
#[derive(Debug, Default)]
pub struct Registry {
    ops: HashMap<OpRef, Registered>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the contract for an operation, if registered.
    #[must_use]
    pub fn contract(&self, op: &OpRef) -> Option<&OperationContract> {
        self.ops.get(op).map(|r| &r.contract)
    }

    /// Number of registered operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if no operations are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Declares a contract without a handler.
    ///
    /// Used for operations whose occurrences are constructed by external
    /// collaborators (request boundary, timer) rather than invoked through
    /// the registry.
    ///
    /// # Errors
    /// Returns an error if the operation is already registered.
    pub fn declare(&mut self, contract: OperationContract) -> Result<()> {
        self.add(contract, Handler::None)
    }

    /// Registers an action contract with its handler.
    ///
    /// # Errors
    /// Returns an error if the operation is already registered or the
    /// contract is not action-shaped.
    pub fn register_action<F>(&mut self, contract: OperationContract, handler: F) -> Result<()>
    where
        F: Fn(&Record) -> Result<OperationOutput> + Send + Sync + 'static,
    {
        if contract.kind() != OperationKind::Action {
            return Err(Error::not_an_action(contract.op().to_string()));
        }
        self.add(contract, Handler::Action(Arc::new(handler)))
    }

    /// Registers a query contract with its handler.
    ///
    /// # Errors
    /// Returns an error if the operation is already registered or the
    /// contract is not query-shaped.
    pub fn register_query<F>(&mut self, contract: OperationContract, handler: F) -> Result<()>
    where
        F: Fn(&Record) -> Result<Vec<Record>> + Send + Sync + 'static,
    {
        if contract.kind() != OperationKind::Query {
            return Err(Error::not_a_query(contract.op().to_string()));
        }
        self.add(contract, Handler::Query(Arc::new(handler)))
    }

    fn add(&mut self, contract: OperationContract, handler: Handler) -> Result<()> {
        let op = contract.op().clone();
        if self.ops.contains_key(&op) {
            return Err(Error::duplicate_operation(op.to_string()));
        }
        self.ops.insert(op, Registered { contract, handler });
        Ok(())
    }

    /// Invokes an action, producing an occurrence of its firing.
    ///
    /// A failure-shaped output is NOT an `Err`: it is a normal occurrence
    /// other rules may react to. `Err` here means the module itself broke
    /// its contract or the operation cannot be invoked at all.
    ///
    /// # Errors
    /// Returns an error if the operation is unknown, has no handler, is not
    /// an action, or its handler fails internally.
    pub fn invoke(&self, op: &OpRef, input: Record) -> Result<Occurrence> {
        let registered = self
            .ops
            .get(op)
            .ok_or_else(|| Error::unknown_operation(op.to_string()))?;
        match &registered.handler {
            Handler::Action(f) => {
                let output = f(&input)?;
                Ok(Occurrence::new(op.clone(), input, output))
            }
            Handler::Query(_) => Err(Error::not_an_action(op.to_string())),
            Handler::None => Err(Error::missing_handler(op.to_string())),
        }
    }

    /// Invokes a read-only query, returning its result rows.
    ///
    /// Queries must not mutate module state; the engine trusts this
    /// contract but cannot enforce it.
    ///
    /// # Errors
    /// Returns an error if the operation is unknown, has no handler, is not
    /// a query, or its handler fails internally.
    pub fn query(&self, op: &OpRef, input: Record) -> Result<Vec<Record>> {
        let registered = self
            .ops
            .get(op)
            .ok_or_else(|| Error::unknown_operation(op.to_string()))?;
        match &registered.handler {
            Handler::Query(f) => f(&input),
            Handler::Action(_) => Err(Error::not_a_query(op.to_string())),
            Handler::None => Err(Error::missing_handler(op.to_string())),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
