//! Operation dispatch: validates a request against the registry, invokes
//! the bound handler, and wraps the result into a report.

use std::sync::Arc;

use millrun_core::{CodecError, EmbeddingKind, ParameterSet, ParameterValue, Report};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::handler::{CallContext, HandlerOutcome, SessionScope};
use crate::registry::OperationRegistry;
use crate::session::{SessionError, SessionId, SessionStore};

/// One logical invoke request, independent of wire encoding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessRequest {
    /// Requested operation name. Absent or empty is a protocol error.
    pub operation: Option<String>,
    /// Caller-supplied input parameters, unordered.
    pub inputs: ParameterSet,
    /// Session to run under, when the caller opted into one.
    pub session_id: Option<SessionId>,
}

impl ProcessRequest {
    /// Builds a request for the given operation and inputs.
    #[must_use]
    pub fn new(operation: impl Into<String>, inputs: ParameterSet) -> Self {
        Self {
            operation: Some(operation.into()),
            inputs,
            session_id: None,
        }
    }

    /// Attaches a session id to the request.
    #[must_use]
    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }
}

/// Caller-visible errors that abort an invoke call.
///
/// These are protocol and validation failures ("you called me wrong"),
/// deliberately distinct from a failure report, which means "the
/// processing ran and did not succeed".
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("no processing operation provided")]
    MissingOperation,
    #[error("unexpected operation [{name}]; supported operations are [{supported}]")]
    UnknownOperation { name: String, supported: String },
    #[error(
        "required input [{name}] for operation [{operation}] must be provided exactly once, found {found}"
    )]
    RequiredInputMultiplicity {
        operation: String,
        name: String,
        found: usize,
    },
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Validates and dispatches invoke calls against the operation registry.
pub struct OperationDispatcher {
    registry: Arc<OperationRegistry>,
    sessions: Arc<SessionStore>,
}

impl OperationDispatcher {
    /// Creates a dispatcher over the given registry and session store.
    #[must_use]
    pub fn new(registry: Arc<OperationRegistry>, sessions: Arc<SessionStore>) -> Self {
        Self { registry, sessions }
    }

    /// Executes one invoke call.
    ///
    /// Validation order: operation presence, operation existence, then
    /// exactly-once multiplicity for every declared required input.
    /// Optional inputs pass through unchecked for the handler to judge.
    ///
    /// # Errors
    ///
    /// Returns a [`ProcessError`] for protocol and validation failures;
    /// business-level failures come back as a failure [`Report`] instead.
    pub fn process(&self, request: &ProcessRequest) -> Result<Report, ProcessError> {
        let operation = match request.operation.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => {
                debug!("Rejected call without an operation name");
                return Err(ProcessError::MissingOperation);
            }
        };

        let Some((spec, handler)) = self.registry.lookup(operation) else {
            debug!("Rejected call for unregistered operation [{operation}]");
            return Err(ProcessError::UnknownOperation {
                name: operation.to_string(),
                supported: self.registry.operation_names().join(", "),
            });
        };

        for input in spec.required_inputs() {
            let found = request.inputs.count_of(&input.name);
            if found != 1 {
                debug!(
                    "Rejected [{operation}] call: required input [{}] found {found} times",
                    input.name
                );
                return Err(ProcessError::RequiredInputMultiplicity {
                    operation: operation.to_string(),
                    name: input.name.clone(),
                    found,
                });
            }
        }

        let scope = request
            .session_id
            .as_ref()
            .map(|id| SessionScope::new(&self.sessions, id));
        let ctx = CallContext::new(operation, scope);

        match handler.invoke(&ctx, &request.inputs)? {
            HandlerOutcome::Output(value) => {
                let outputs = spec
                    .outputs()
                    .first()
                    .map(|out| {
                        vec![ParameterValue {
                            name: out.name.clone(),
                            kind: EmbeddingKind::String,
                            value,
                        }]
                    })
                    .unwrap_or_default();
                info!("Completed operation [{operation}]");
                Ok(Report::success(outputs))
            }
            HandlerOutcome::Failure(outputs) => {
                warn!("Operation [{operation}] reported a processing failure");
                Ok(Report::failure(outputs))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use millrun_core::{codec, OperationSpec, Outcome, ParameterSpec, Value};

    use super::*;
    use crate::case::{self, INPUT_TEXT, OUTPUT_TEXT};
    use crate::handler::OperationHandler;

    /// Stores its input under a session attribute and echoes whatever the
    /// previous call stored.
    struct RecallHandler;

    impl OperationHandler for RecallHandler {
        fn invoke(
            &self,
            ctx: &CallContext<'_>,
            inputs: &ParameterSet,
        ) -> Result<HandlerOutcome, ProcessError> {
            let scope = ctx.session().expect("test always supplies a session");
            let previous = scope.get("last").and_then(|v| v.as_str().map(String::from));
            if let Some(text) = inputs.scalar(INPUT_TEXT) {
                scope.set("last", Value::from(text))?;
            }
            Ok(HandlerOutcome::Output(previous))
        }
    }

    /// Fails as business logic whenever the input is "reject".
    struct PickyHandler;

    impl OperationHandler for PickyHandler {
        fn invoke(
            &self,
            _ctx: &CallContext<'_>,
            inputs: &ParameterSet,
        ) -> Result<HandlerOutcome, ProcessError> {
            match inputs.scalar(INPUT_TEXT) {
                Some("reject") => Ok(HandlerOutcome::Failure(vec![ParameterValue::text(
                    "reason", "input was rejected",
                )])),
                other => Ok(HandlerOutcome::Output(other.map(str::to_string))),
            }
        }
    }

    fn one_in_one_out(name: &str) -> OperationSpec {
        OperationSpec::new(
            name,
            vec![ParameterSpec::required(INPUT_TEXT, "string", "in")],
            vec![ParameterSpec::required(OUTPUT_TEXT, "string", "out")],
        )
        .unwrap()
    }

    fn case_dispatcher() -> (OperationDispatcher, Arc<SessionStore>) {
        let mut registry = OperationRegistry::new();
        case::register_case_operations(&mut registry).unwrap();
        let sessions = Arc::new(SessionStore::new());
        (
            OperationDispatcher::new(Arc::new(registry), Arc::clone(&sessions)),
            sessions,
        )
    }

    fn text_request(operation: &str, value: &str) -> ProcessRequest {
        ProcessRequest::new(
            operation,
            ParameterSet::new(vec![ParameterValue::text(INPUT_TEXT, value)]),
        )
    }

    #[test]
    fn uppercase_returns_uppercased_output() {
        let (dispatcher, _) = case_dispatcher();
        let report = dispatcher.process(&text_request("uppercase", "Hello")).unwrap();
        assert_eq!(report.outcome, Outcome::Success);
        assert_eq!(
            report.output(OUTPUT_TEXT).and_then(|p| p.value.as_deref()),
            Some("HELLO")
        );
    }

    #[test]
    fn lowercase_returns_lowercased_output() {
        let (dispatcher, _) = case_dispatcher();
        let report = dispatcher.process(&text_request("lowercase", "Hello")).unwrap();
        assert_eq!(report.outcome, Outcome::Success);
        assert_eq!(
            report.output(OUTPUT_TEXT).and_then(|p| p.value.as_deref()),
            Some("hello")
        );
    }

    #[test]
    fn missing_operation_aborts_the_call() {
        let (dispatcher, _) = case_dispatcher();
        let request = ProcessRequest {
            operation: None,
            inputs: ParameterSet::empty(),
            session_id: None,
        };
        assert!(matches!(
            dispatcher.process(&request).unwrap_err(),
            ProcessError::MissingOperation
        ));
    }

    #[test]
    fn empty_operation_name_counts_as_missing() {
        let (dispatcher, _) = case_dispatcher();
        let request = ProcessRequest::new("", ParameterSet::empty());
        assert!(matches!(
            dispatcher.process(&request).unwrap_err(),
            ProcessError::MissingOperation
        ));
    }

    #[test]
    fn unknown_operation_names_offender_and_supported_set() {
        let (dispatcher, _) = case_dispatcher();
        let err = dispatcher
            .process(&text_request("reverse", "x"))
            .unwrap_err();
        match err {
            ProcessError::UnknownOperation { name, supported } => {
                assert_eq!(name, "reverse");
                assert_eq!(supported, "uppercase, lowercase");
            }
            other => panic!("expected UnknownOperation, got {other:?}"),
        }
    }

    #[test]
    fn absent_required_input_aborts_without_report() {
        let (dispatcher, _) = case_dispatcher();
        let request = ProcessRequest::new("uppercase", ParameterSet::empty());
        let err = dispatcher.process(&request).unwrap_err();
        assert!(matches!(
            err,
            ProcessError::RequiredInputMultiplicity { name, found: 0, .. } if name == INPUT_TEXT
        ));
    }

    #[test]
    fn duplicated_required_input_is_rejected() {
        let (dispatcher, _) = case_dispatcher();
        let request = ProcessRequest::new(
            "uppercase",
            ParameterSet::new(vec![
                ParameterValue::text(INPUT_TEXT, "a"),
                ParameterValue::text(INPUT_TEXT, "b"),
            ]),
        );
        let err = dispatcher.process(&request).unwrap_err();
        assert!(matches!(
            err,
            ProcessError::RequiredInputMultiplicity { found: 2, .. }
        ));
    }

    #[test]
    fn absent_input_value_produces_absent_output_value() {
        let (dispatcher, _) = case_dispatcher();
        let request = ProcessRequest::new(
            "uppercase",
            ParameterSet::new(vec![ParameterValue::absent(INPUT_TEXT)]),
        );
        let report = dispatcher.process(&request).unwrap();
        assert_eq!(report.outcome, Outcome::Success);
        let output = report.output(OUTPUT_TEXT).unwrap();
        assert!(output.value.is_none());
    }

    #[test]
    fn base64_embedded_input_is_decoded_before_processing() {
        let (dispatcher, _) = case_dispatcher();
        let request = ProcessRequest::new(
            "uppercase",
            ParameterSet::new(vec![codec::base64_parameter(INPUT_TEXT, b"Hello")]),
        );
        let report = dispatcher.process(&request).unwrap();
        assert_eq!(
            report.output(OUTPUT_TEXT).and_then(|p| p.value.as_deref()),
            Some("HELLO")
        );
    }

    #[test]
    fn undecodable_input_aborts_the_call() {
        let (dispatcher, _) = case_dispatcher();
        let request = ProcessRequest::new(
            "uppercase",
            ParameterSet::new(vec![ParameterValue {
                name: INPUT_TEXT.to_string(),
                kind: millrun_core::EmbeddingKind::Base64,
                value: Some("!!!not-base64!!!".to_string()),
            }]),
        );
        assert!(matches!(
            dispatcher.process(&request).unwrap_err(),
            ProcessError::Codec(_)
        ));
    }

    #[test]
    fn handler_business_failure_becomes_failure_report() {
        let mut registry = OperationRegistry::new();
        registry
            .register(one_in_one_out("filter"), Arc::new(PickyHandler))
            .unwrap();
        let dispatcher =
            OperationDispatcher::new(Arc::new(registry), Arc::new(SessionStore::new()));

        let report = dispatcher.process(&text_request("filter", "reject")).unwrap();
        assert_eq!(report.outcome, Outcome::Failure);
        assert_eq!(
            report.output("reason").and_then(|p| p.value.as_deref()),
            Some("input was rejected")
        );

        // A non-rejected input still succeeds through the same handler.
        let report = dispatcher.process(&text_request("filter", "accept")).unwrap();
        assert_eq!(report.outcome, Outcome::Success);
    }

    #[test]
    fn stateful_handler_carries_values_across_calls_in_one_session() {
        let mut registry = OperationRegistry::new();
        registry
            .register(one_in_one_out("recall"), Arc::new(RecallHandler))
            .unwrap();
        let sessions = Arc::new(SessionStore::new());
        let dispatcher = OperationDispatcher::new(Arc::new(registry), Arc::clone(&sessions));

        let session = sessions.create();

        let first = dispatcher
            .process(&text_request("recall", "one").with_session(session.clone()))
            .unwrap();
        assert!(first.output(OUTPUT_TEXT).unwrap().value.is_none());

        let second = dispatcher
            .process(&text_request("recall", "two").with_session(session.clone()))
            .unwrap();
        assert_eq!(
            second.output(OUTPUT_TEXT).and_then(|p| p.value.as_deref()),
            Some("one")
        );

        // Separate sessions do not observe each other's state.
        let other = sessions.create();
        let elsewhere = dispatcher
            .process(&text_request("recall", "three").with_session(other))
            .unwrap();
        assert!(elsewhere.output(OUTPUT_TEXT).unwrap().value.is_none());
    }

    #[test]
    fn handler_write_to_destroyed_session_fails_the_call() {
        let mut registry = OperationRegistry::new();
        registry
            .register(one_in_one_out("recall"), Arc::new(RecallHandler))
            .unwrap();
        let sessions = Arc::new(SessionStore::new());
        let dispatcher = OperationDispatcher::new(Arc::new(registry), Arc::clone(&sessions));

        let session = sessions.create();
        sessions.destroy(&session);

        let err = dispatcher
            .process(&text_request("recall", "late").with_session(session.clone()))
            .unwrap_err();
        assert!(matches!(
            err,
            ProcessError::Session(SessionError::NotFound(id)) if id == session
        ));
    }
}
