//! Invocation reports returned to callers.

use serde::{Deserialize, Serialize};

use crate::params::ParameterValue;

/// Outcome of one operation invocation.
///
/// `Failure` is reserved for business-level failures signalled by the
/// handler itself; protocol and validation problems abort the call instead
/// of producing a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Success,
    Failure,
}

/// The success/failure outcome plus output parameters produced by one
/// operation invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Whether the processing itself succeeded.
    pub outcome: Outcome,
    /// Output parameters, named per the operation's declared outputs.
    pub outputs: Vec<ParameterValue>,
}

impl Report {
    /// Builds a success report carrying the given outputs.
    #[must_use]
    pub fn success(outputs: Vec<ParameterValue>) -> Self {
        Self {
            outcome: Outcome::Success,
            outputs,
        }
    }

    /// Builds a failure report carrying the given outputs.
    #[must_use]
    pub fn failure(outputs: Vec<ParameterValue>) -> Self {
        Self {
            outcome: Outcome::Failure,
            outputs,
        }
    }

    /// Whether the outcome is [`Outcome::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    /// First output parameter with the given name, if any.
    #[must_use]
    pub fn output(&self, name: &str) -> Option<&ParameterValue> {
        self.outputs.iter().find(|p| p.name == name)
    }
}
