//! millrun Core — parameter model, module descriptors, reports, and the
//! parameter codec shared by the service layer and its transports.

pub mod codec;
pub mod module;
pub mod params;
pub mod report;
pub mod types;

pub use codec::CodecError;
pub use module::{ModuleDescriptor, OperationSpec, ParameterSpec, SpecError};
pub use params::{EmbeddingKind, ParameterSet, ParameterValue, UsageKind};
pub use report::{Outcome, Report};
pub use types::Value;
