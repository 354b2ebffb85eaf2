//! Authentication module
//!
//! Supports: Datadog API/application keys, XTM-Basic token, Basic token,
//! custom headers.
//!
//! The `Authenticator` writes credential headers into the outgoing header
//! map. The executor applies them after caller headers so credentials
//! always win.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::AuthConfig;
