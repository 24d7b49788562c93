//! Module and operation descriptors advertised through discovery.

use serde::{Deserialize, Serialize};

use crate::params::UsageKind;

/// Errors raised while constructing an [`OperationSpec`].
///
/// These surface at startup, while the registry is being assembled; a
/// process with a malformed operation description must not start serving.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("operation name must not be empty")]
    EmptyOperationName,
    #[error("operation [{operation}] declares a parameter with an empty name")]
    EmptyParameterName { operation: String },
    #[error("operation [{operation}] declares parameter [{name}] more than once")]
    DuplicateParameter { operation: String, name: String },
}

/// A declared input or output of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Parameter name, unique within the owning operation's inputs or
    /// outputs.
    pub name: String,
    /// Semantic type tag (e.g. `"string"`), distinct from the embedding
    /// kind a value arrives with.
    pub value_type: String,
    /// Whether the dispatcher requires this parameter.
    pub usage: UsageKind,
    /// Human-readable description shown to discovery callers.
    pub description: String,
}

impl ParameterSpec {
    /// Builds a required parameter declaration.
    #[must_use]
    pub fn required(
        name: impl Into<String>,
        value_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value_type: value_type.into(),
            usage: UsageKind::Required,
            description: description.into(),
        }
    }

    /// Builds an optional parameter declaration.
    #[must_use]
    pub fn optional(
        name: impl Into<String>,
        value_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value_type: value_type.into(),
            usage: UsageKind::Optional,
            description: description.into(),
        }
    }
}

/// A named, independently invocable unit of processing with declared
/// input/output parameters.
///
/// Immutable once constructed; the constructor enforces that the operation
/// name is non-empty and that parameter names are unique within the input
/// list and within the output list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSpec {
    name: String,
    inputs: Vec<ParameterSpec>,
    outputs: Vec<ParameterSpec>,
}

impl OperationSpec {
    /// Builds a validated operation declaration.
    ///
    /// # Errors
    ///
    /// Returns a [`SpecError`] when the operation name is empty, a
    /// parameter name is empty, or a parameter name repeats within the
    /// inputs or within the outputs.
    pub fn new(
        name: impl Into<String>,
        inputs: Vec<ParameterSpec>,
        outputs: Vec<ParameterSpec>,
    ) -> Result<Self, SpecError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SpecError::EmptyOperationName);
        }
        check_unique_names(&name, &inputs)?;
        check_unique_names(&name, &outputs)?;
        Ok(Self {
            name,
            inputs,
            outputs,
        })
    }

    /// The operation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared inputs, in declaration order.
    #[must_use]
    pub fn inputs(&self) -> &[ParameterSpec] {
        &self.inputs
    }

    /// Declared outputs, in declaration order.
    #[must_use]
    pub fn outputs(&self) -> &[ParameterSpec] {
        &self.outputs
    }

    /// Declared inputs the dispatcher must see exactly once.
    pub fn required_inputs(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.inputs
            .iter()
            .filter(|p| p.usage == UsageKind::Required)
    }
}

fn check_unique_names(operation: &str, params: &[ParameterSpec]) -> Result<(), SpecError> {
    for (i, param) in params.iter().enumerate() {
        if param.name.trim().is_empty() {
            return Err(SpecError::EmptyParameterName {
                operation: operation.to_string(),
            });
        }
        if params[..i].iter().any(|p| p.name == param.name) {
            return Err(SpecError::DuplicateParameter {
                operation: operation.to_string(),
                name: param.name.clone(),
            });
        }
    }
    Ok(())
}

/// Description of a processing module: identity, version, and supported
/// operations.
///
/// Built once at startup from configuration values and the operation
/// registry, then shared read-only across concurrent discovery calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    /// Module identifier, taken verbatim from configuration.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Module version, taken verbatim from configuration.
    pub version: String,
    /// Supported operations, in registration order.
    pub operations: Vec<OperationSpec>,
}

impl ModuleDescriptor {
    /// Looks up an operation declaration by name.
    #[must_use]
    pub fn operation(&self, name: &str) -> Option<&OperationSpec> {
        self.operations.iter().find(|op| op.name() == name)
    }
}
