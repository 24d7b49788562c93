//! Reference processing strategies: string case conversion.
//!
//! Deliberately trivial; the point is the shape. Real deployments replace
//! these with their own strategies, registered the same way.

use std::sync::Arc;

use millrun_core::{codec, OperationSpec, ParameterSet, ParameterSpec};

use crate::dispatch::ProcessError;
use crate::handler::{CallContext, HandlerOutcome, OperationHandler};
use crate::registry::{OperationRegistry, RegistryError};

/// Name of the uppercase operation.
pub const OPERATION_UPPERCASE: &str = "uppercase";
/// Name of the lowercase operation.
pub const OPERATION_LOWERCASE: &str = "lowercase";
/// Name of the text input treated by each operation.
pub const INPUT_TEXT: &str = "input";
/// Name of the output carrying the processing result.
pub const OUTPUT_TEXT: &str = "output";

/// Uppercases the text input using Unicode case mapping.
///
/// An absent input value maps to an absent output value; the handler is
/// total and never fails for valid types.
pub struct Uppercase;

impl OperationHandler for Uppercase {
    fn invoke(
        &self,
        _ctx: &CallContext<'_>,
        inputs: &ParameterSet,
    ) -> Result<HandlerOutcome, ProcessError> {
        let text = decoded_input(inputs)?;
        Ok(HandlerOutcome::Output(text.map(|t| t.to_uppercase())))
    }
}

/// Lowercases the text input using Unicode case mapping.
pub struct Lowercase;

impl OperationHandler for Lowercase {
    fn invoke(
        &self,
        _ctx: &CallContext<'_>,
        inputs: &ParameterSet,
    ) -> Result<HandlerOutcome, ProcessError> {
        let text = decoded_input(inputs)?;
        Ok(HandlerOutcome::Output(text.map(|t| t.to_lowercase())))
    }
}

fn decoded_input(inputs: &ParameterSet) -> Result<Option<String>, ProcessError> {
    match inputs.first(INPUT_TEXT) {
        Some(param) => Ok(codec::decoded_text(param)?.map(Into::into)),
        None => Ok(None),
    }
}

fn case_spec(name: &str) -> Result<OperationSpec, RegistryError> {
    Ok(OperationSpec::new(
        name,
        vec![ParameterSpec::required(
            INPUT_TEXT,
            "string",
            "The text to process",
        )],
        vec![ParameterSpec::required(
            OUTPUT_TEXT,
            "string",
            "The processing result",
        )],
    )?)
}

/// Registers the two reference operations on the given registry.
///
/// # Errors
///
/// Returns a [`RegistryError`] when either name is already taken.
pub fn register_case_operations(registry: &mut OperationRegistry) -> Result<(), RegistryError> {
    registry.register(case_spec(OPERATION_UPPERCASE)?, Arc::new(Uppercase))?;
    registry.register(case_spec(OPERATION_LOWERCASE)?, Arc::new(Lowercase))?;
    Ok(())
}
