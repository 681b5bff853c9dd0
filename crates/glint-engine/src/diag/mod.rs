//! Failure reporting.
//!
//! Helpers never panic or return error payloads: they hand a [`Diagnostic`] to
//! an injected [`Diagnostics`] sink and return a sentinel. [`ErrorTracker`]
//! polls the device for asynchronous errors and reports each unresolved fault
//! once.

mod diagnostic;
mod tracker;

pub use diagnostic::{Diagnostic, DiagnosticLog, Diagnostics, LogDiagnostics};
pub use tracker::ErrorTracker;
