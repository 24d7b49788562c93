//! Static registry of supported operations and their handlers.

use std::collections::HashMap;
use std::sync::Arc;

use millrun_core::{ModuleDescriptor, OperationSpec};
use tracing::debug;

use crate::config::ServiceConfig;
use crate::handler::OperationHandler;

/// Errors raised while assembling the registry. Startup-fatal.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("operation [{name}] is registered more than once")]
    DuplicateOperation { name: String },
    #[error(transparent)]
    Spec(#[from] millrun_core::SpecError),
}

struct RegisteredOperation {
    spec: OperationSpec,
    handler: Arc<dyn OperationHandler>,
}

/// Supported operations: each name maps to its declaration and the handler
/// strategy invoked for it.
///
/// Assembled once at startup and read-only afterwards, so discovery and
/// dispatch share it without locking. Adding an operation is a registration
/// call, not a new dispatch branch.
#[derive(Default)]
pub struct OperationRegistry {
    order: Vec<String>,
    operations: HashMap<String, RegisteredOperation>,
}

impl OperationRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an operation declaration together with its handler.
    ///
    /// Registration order is preserved in the module descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateOperation`] when the name is
    /// already registered.
    pub fn register(
        &mut self,
        spec: OperationSpec,
        handler: Arc<dyn OperationHandler>,
    ) -> Result<(), RegistryError> {
        let name = spec.name().to_string();
        if self.operations.contains_key(&name) {
            return Err(RegistryError::DuplicateOperation { name });
        }
        debug!("Registered operation [{name}]");
        self.order.push(name.clone());
        self.operations
            .insert(name, RegisteredOperation { spec, handler });
        Ok(())
    }

    /// Looks up an operation's declaration and handler together.
    ///
    /// The two are registered as one entry, so a known name always yields
    /// both.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<(&OperationSpec, &dyn OperationHandler)> {
        self.operations
            .get(name)
            .map(|op| (&op.spec, op.handler.as_ref()))
    }

    /// Looks up an operation's declaration by name.
    #[must_use]
    pub fn spec(&self, name: &str) -> Option<&OperationSpec> {
        self.operations.get(name).map(|op| &op.spec)
    }

    /// Registered operation names, in registration order.
    #[must_use]
    pub fn operation_names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// Builds the module descriptor advertised through discovery.
    ///
    /// Pure and deterministic: the same registry and configuration always
    /// produce the same descriptor.
    #[must_use]
    pub fn descriptor(&self, config: &ServiceConfig) -> ModuleDescriptor {
        ModuleDescriptor {
            id: config.service_id.clone(),
            name: config.service_id.clone(),
            version: config.service_version.clone(),
            operations: self
                .order
                .iter()
                .map(|name| self.operations[name].spec.clone())
                .collect(),
        }
    }

    /// Number of registered operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no operations are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
