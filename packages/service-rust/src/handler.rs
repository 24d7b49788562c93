//! The pluggable business-logic seam behind the dispatcher.

use millrun_core::{ParameterSet, ParameterValue, Value};

use crate::dispatch::ProcessError;
use crate::session::{SessionError, SessionId, SessionStore};

/// Result of one handler invocation.
#[derive(Debug)]
pub enum HandlerOutcome {
    /// Successful processing. The value becomes the operation's declared
    /// output parameter; an absent input may legitimately produce an absent
    /// output.
    Output(Option<String>),
    /// Business-level failure: processing ran but did not succeed. Becomes
    /// a failure report carrying the given outputs; the call itself still
    /// succeeds at the protocol level.
    Failure(Vec<ParameterValue>),
}

/// Read/write access to the caller's session, scoped to the current call.
///
/// Handlers never hold a session across calls; every access goes through
/// the store by id, so a destroyed session is immediately unreachable.
pub struct SessionScope<'a> {
    store: &'a SessionStore,
    id: &'a SessionId,
}

impl<'a> SessionScope<'a> {
    pub(crate) fn new(store: &'a SessionStore, id: &'a SessionId) -> Self {
        Self { store, id }
    }

    /// The session this call runs under.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        self.id
    }

    /// Reads one session attribute; absent when the session or the key does
    /// not exist.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.store.get(self.id, key)
    }

    /// Writes one session attribute.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] when the session has been
    /// destroyed.
    pub fn set(&self, key: impl Into<String>, value: Value) -> Result<(), SessionError> {
        self.store.set(self.id, key, value)
    }
}

/// Per-call context handed to handlers.
pub struct CallContext<'a> {
    operation: &'a str,
    session: Option<SessionScope<'a>>,
}

impl<'a> CallContext<'a> {
    pub(crate) fn new(operation: &'a str, session: Option<SessionScope<'a>>) -> Self {
        Self { operation, session }
    }

    /// Name of the operation being invoked.
    #[must_use]
    pub fn operation(&self) -> &str {
        self.operation
    }

    /// The caller's session, when the request carried a session id.
    #[must_use]
    pub fn session(&self) -> Option<&SessionScope<'a>> {
        self.session.as_ref()
    }
}

/// Business logic bound to one operation name.
///
/// Implementations are strategy objects registered alongside their
/// operation declaration at startup. The contract: a total function from
/// validated typed inputs to typed outputs. Business failures are
/// signalled through [`HandlerOutcome::Failure`], never by panicking.
/// Returning an error aborts the call without a report and is reserved for
/// protocol-level problems (undecodable input, writes to a destroyed
/// session).
///
/// Handlers see the full parameter set: the dispatcher has already checked
/// that every required input is present exactly once, while optional
/// inputs are the handler's own to validate.
pub trait OperationHandler: Send + Sync {
    fn invoke(
        &self,
        ctx: &CallContext<'_>,
        inputs: &ParameterSet,
    ) -> Result<HandlerOutcome, ProcessError>;
}
