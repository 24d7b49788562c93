//! Typed name/value parameters as they appear in requests and reports.

use serde::{Deserialize, Serialize};

/// Representation format of a parameter's value on the wire, as opposed to
/// its semantic type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbeddingKind {
    /// Plain UTF-8 text carried inline.
    String,
    /// Binary content carried inline as base64 text.
    Base64,
    /// A URI referencing content hosted elsewhere.
    Uri,
}

/// Whether a declared parameter must be supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UsageKind {
    /// The dispatcher rejects calls that do not supply this parameter
    /// exactly once.
    Required,
    /// Presence is checked by the handler, not the dispatcher.
    Optional,
}

/// A single named value carried in a request or a report.
///
/// The raw value is an explicit `Option`: an absent value is part of the
/// contract (handlers map absent input to absent output) and is never
/// smuggled through as an empty or sentinel string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterValue {
    /// Parameter name, matched against declared input/output specs.
    pub name: String,
    /// How the raw value is embedded.
    pub kind: EmbeddingKind,
    /// The raw value, or `None` when explicitly absent.
    pub value: Option<String>,
}

impl ParameterValue {
    /// Builds a STRING-embedded parameter with the given text value.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EmbeddingKind::String,
            value: Some(value.into()),
        }
    }

    /// Builds a STRING-embedded parameter with an absent value.
    #[must_use]
    pub fn absent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EmbeddingKind::String,
            value: None,
        }
    }
}

/// The unordered parameter list carried by one request.
///
/// A given name may appear any number of times here; multiplicity rules for
/// required inputs are enforced by the dispatcher, not by this container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSet {
    values: Vec<ParameterValue>,
}

impl ParameterSet {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wraps an existing list of parameters.
    #[must_use]
    pub fn new(values: Vec<ParameterValue>) -> Self {
        Self { values }
    }

    /// All parameters in request order.
    #[must_use]
    pub fn values(&self) -> &[ParameterValue] {
        &self.values
    }

    /// All parameters matching `name`, in request order.
    pub fn values_for<'a, 'b>(
        &'a self,
        name: &'b str,
    ) -> impl Iterator<Item = &'a ParameterValue> + 'b
    where
        'a: 'b,
    {
        self.values.iter().filter(move |p| p.name == name)
    }

    /// Number of parameters matching `name`.
    #[must_use]
    pub fn count_of(&self, name: &str) -> usize {
        self.values_for(name).count()
    }

    /// First parameter matching `name`, if any.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&ParameterValue> {
        self.values_for(name).next()
    }

    /// Raw value of the first parameter matching `name`.
    ///
    /// Returns `None` both when no parameter matches and when the matching
    /// parameter carries an absent value; use [`first`](Self::first) to
    /// distinguish the two.
    #[must_use]
    pub fn scalar(&self, name: &str) -> Option<&str> {
        self.first(name).and_then(|p| p.value.as_deref())
    }

    /// Appends a parameter.
    pub fn push(&mut self, value: ParameterValue) {
        self.values.push(value);
    }

    /// Number of parameters in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the set carries no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<ParameterValue>> for ParameterSet {
    fn from(values: Vec<ParameterValue>) -> Self {
        Self::new(values)
    }
}

impl FromIterator<ParameterValue> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = ParameterValue>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
