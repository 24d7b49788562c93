//! millrun Service — operation discovery, typed dispatch, and concurrent
//! session state behind a transport-agnostic facade.
//!
//! A transport (SOAP, HTTP, anything) embeds [`ProcessingService`] and maps
//! its four calls onto the wire:
//!
//! 1. **Discovery** (`describe`): the supported operations and their typed
//!    input/output parameters.
//! 2. **Dispatch** (`invoke`): validate, run the bound handler strategy,
//!    return a report.
//! 3. **Sessions** (`begin_session`/`end_session`): opt-in server-side
//!    state shared across a caller's sequence of invocations.

pub mod case;
pub mod config;
pub mod dispatch;
pub mod handler;
pub mod registry;
pub mod service;
pub mod session;
pub mod telemetry;

pub use config::{ConfigError, ServiceConfig};
pub use dispatch::{OperationDispatcher, ProcessError, ProcessRequest};
pub use handler::{CallContext, HandlerOutcome, OperationHandler, SessionScope};
pub use registry::{OperationRegistry, RegistryError};
pub use service::ProcessingService;
pub use session::{SessionError, SessionId, SessionStore};
