//! Conversion between wire-embedded parameter values and the primitive
//! values business logic consumes.

use std::borrow::Cow;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::params::{EmbeddingKind, ParameterValue};

/// Errors raised while decoding a parameter's embedded value.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("parameter [{name}] carries malformed base64 content")]
    InvalidBase64 {
        name: String,
        #[source]
        source: base64::DecodeError,
    },
    #[error("parameter [{name}] decodes to content that is not valid UTF-8")]
    NotText { name: String },
}

/// Decodes a parameter's raw value to text according to its embedding kind.
///
/// STRING and URI values pass through unchanged (for a URI the reference
/// itself is the value; fetching the referenced content is the caller's
/// concern). BASE64 values are decoded and must yield valid UTF-8. An
/// absent raw value decodes to `None` for every kind.
///
/// # Errors
///
/// Returns a [`CodecError`] when a BASE64 value is malformed or decodes to
/// non-UTF-8 bytes.
pub fn decoded_text(param: &ParameterValue) -> Result<Option<Cow<'_, str>>, CodecError> {
    let Some(raw) = param.value.as_deref() else {
        return Ok(None);
    };
    match param.kind {
        EmbeddingKind::String | EmbeddingKind::Uri => Ok(Some(Cow::Borrowed(raw))),
        EmbeddingKind::Base64 => {
            let bytes = STANDARD
                .decode(raw)
                .map_err(|source| CodecError::InvalidBase64 {
                    name: param.name.clone(),
                    source,
                })?;
            let text = String::from_utf8(bytes).map_err(|_| CodecError::NotText {
                name: param.name.clone(),
            })?;
            Ok(Some(Cow::Owned(text)))
        }
    }
}

/// Encodes raw bytes into a BASE64-embedded parameter.
#[must_use]
pub fn base64_parameter(name: impl Into<String>, bytes: &[u8]) -> ParameterValue {
    ParameterValue {
        name: name.into(),
        kind: EmbeddingKind::Base64,
        value: Some(STANDARD.encode(bytes)),
    }
}
