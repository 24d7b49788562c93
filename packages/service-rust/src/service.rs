//! Top-level service facade embedded by the transport layer.

use std::sync::Arc;

use anyhow::Context as _;
use millrun_core::{ModuleDescriptor, ParameterValue, Report, Value};
use tracing::info;

use crate::case;
use crate::config::ServiceConfig;
use crate::dispatch::{OperationDispatcher, ProcessError, ProcessRequest};
use crate::registry::OperationRegistry;
use crate::session::{SessionId, SessionStore};

/// The processing service: discovery, dispatch, and session lifecycle in
/// one object.
///
/// Owns the operation registry, the session store, and the module
/// descriptor. The descriptor is built once at construction, so discovery
/// is deterministic and allocation-free for the process lifetime. All
/// methods take `&self` and are safe to call from concurrent transport
/// workers.
pub struct ProcessingService {
    descriptor: Arc<ModuleDescriptor>,
    dispatcher: OperationDispatcher,
    sessions: Arc<SessionStore>,
}

impl ProcessingService {
    /// Assembles a service from a validated configuration and a populated
    /// registry.
    #[must_use]
    pub fn new(config: &ServiceConfig, registry: OperationRegistry) -> Self {
        let descriptor = Arc::new(registry.descriptor(config));
        let registry = Arc::new(registry);
        let sessions = Arc::new(SessionStore::new());
        info!(
            "Assembled processing service [{}] version [{}] with operations [{}]",
            descriptor.id,
            descriptor.version,
            registry.operation_names().join(", ")
        );
        Self {
            descriptor,
            dispatcher: OperationDispatcher::new(registry, Arc::clone(&sessions)),
            sessions,
        }
    }

    /// Assembles a service exposing the reference case-conversion
    /// operations.
    ///
    /// # Errors
    ///
    /// Returns an error when the registry cannot be assembled.
    pub fn with_case_operations(config: &ServiceConfig) -> anyhow::Result<Self> {
        let mut registry = OperationRegistry::new();
        case::register_case_operations(&mut registry)
            .context("failed to register case operations")?;
        Ok(Self::new(config, registry))
    }

    /// Reads configuration from the environment and assembles the service
    /// with the reference operations.
    ///
    /// # Errors
    ///
    /// Returns an error when the environment configuration is missing or
    /// empty, or when the registry cannot be assembled. Startup-fatal: the
    /// caller must not start serving on failure.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = ServiceConfig::from_env().context("invalid service configuration")?;
        Self::with_case_operations(&config)
    }

    /// The module definition advertised to discovery callers.
    ///
    /// Repeated calls return the same shared descriptor for the process
    /// lifetime.
    #[must_use]
    pub fn describe(&self) -> Arc<ModuleDescriptor> {
        Arc::clone(&self.descriptor)
    }

    /// Begins a processing session, seeding its attributes from the given
    /// configuration parameters (name → value; absent values seed
    /// [`Value::Null`]).
    pub fn begin_session(&self, config: &[ParameterValue]) -> SessionId {
        let seed = config.iter().map(|p| {
            let value = p
                .value
                .as_ref()
                .map_or(Value::Null, |v| Value::String(v.clone()));
            (p.name.clone(), value)
        });
        let id = self.sessions.create_with(seed);
        info!("Starting processing session [{id}]");
        id
    }

    /// Ends a processing session and discards its state.
    ///
    /// Idempotent: ending an unknown or already-ended session is a no-op.
    pub fn end_session(&self, id: &SessionId) {
        info!("Ending processing session [{id}]");
        self.sessions.destroy(id);
    }

    /// Executes one operation invocation.
    ///
    /// # Errors
    ///
    /// Returns a [`ProcessError`] for protocol and validation failures;
    /// business-level failures come back as a failure [`Report`].
    pub fn invoke(&self, request: &ProcessRequest) -> Result<Report, ProcessError> {
        self.dispatcher.process(request)
    }

    /// The session store, for diagnostics (active-session counts and
    /// snapshots).
    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}
