//! Logging setup.
//!
//! Library code only talks to the `log` facade; this module is what hosts
//! call to install `env_logger` behind it. Diagnostics are emitted under the
//! `glint` target (see [`LogDiagnostics`](crate::diag::LogDiagnostics)).

mod init;

pub use init::{init_logging, LoggingConfig};
