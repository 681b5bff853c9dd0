use std::fmt;

use crate::device::DeviceError;

/// A locally diagnosed failure.
///
/// Every helper in this crate reports at most one of these per failure and
/// then returns a sentinel (`None`) or proceeds best-effort; nothing panics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Source length is not a multiple of the element size (non-fatal).
    ShapeMismatch { len: usize, item_size: usize },
    /// The script resolver has nothing under this id.
    ScriptNotFound { script_id: String },
    /// The script's declared type is neither shader-stage marker.
    IllegalShaderType { script_id: String, mime: String },
    /// The device returned no shader object.
    ShaderAllocationFailed { script_id: String },
    /// Compilation failed; `log` is the device info log.
    CompileFailed { script_id: String, log: String },
    /// The device returned no program object.
    ProgramAllocationFailed { vertex_id: String, fragment_id: String },
    /// A stage failed to load and the build was abandoned before linking.
    ProgramAborted { vertex_id: String, fragment_id: String },
    /// Linking failed; `log` is the program info log.
    LinkFailed { vertex_id: String, fragment_id: String, log: String },
    /// Asynchronous device error found by polling.
    Device(DeviceError),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch { len, item_size } => write!(
                f,
                "data_src.length[{len}] should be multiply of item_size[{item_size}]"
            ),
            Self::ScriptNotFound { script_id } => {
                write!(f, "cannot find script id[{script_id}].")
            }
            Self::IllegalShaderType { script_id, mime } => {
                write!(f, "illegal shader type[{mime}] of script id[{script_id}].")
            }
            Self::ShaderAllocationFailed { script_id } => {
                write!(f, "unable to create shader from script id[{script_id}].")
            }
            Self::CompileFailed { script_id, log } => {
                write!(f, "compile shader script id[{script_id}] failed ->\n{log}")
            }
            Self::ProgramAllocationFailed { vertex_id, fragment_id } => write!(
                f,
                "unable to create program for script id[{vertex_id}] and [{fragment_id}]."
            ),
            Self::ProgramAborted { vertex_id, fragment_id } => write!(
                f,
                "build of script id[{vertex_id}] and [{fragment_id}] abandoned: a stage failed to load"
            ),
            Self::LinkFailed { vertex_id, fragment_id, log } => write!(
                f,
                "link shader script id[{vertex_id}] and [{fragment_id}] failed ->\n{log}"
            ),
            Self::Device(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Diagnostic {}

/// Sink for diagnostics (the host's console).
pub trait Diagnostics {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl<T: Diagnostics + ?Sized> Diagnostics for &mut T {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}

/// Forwards diagnostics to the `log` facade at `error` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl LogDiagnostics {
    /// Message logged for `diagnostic`; severity is carried by the log level.
    fn message(diagnostic: &Diagnostic) -> String {
        diagnostic.to_string()
    }
}

impl Diagnostics for LogDiagnostics {
    fn report(&mut self, diagnostic: Diagnostic) {
        log::error!(target: "glint", "{}", Self::message(&diagnostic));
    }
}

/// Records diagnostics in report order.
///
/// Hosts that surface build errors in their own UI drain this after each
/// call; with `echo` enabled every entry is also logged.
#[derive(Debug, Default, Clone)]
pub struct DiagnosticLog {
    entries: Vec<Diagnostic>,
    echo: bool,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A log that also forwards each entry to [`LogDiagnostics`].
    pub fn echoing() -> Self {
        Self {
            entries: Vec::new(),
            echo: true,
        }
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Takes all recorded entries, leaving the log empty.
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }
}

impl Diagnostics for DiagnosticLog {
    fn report(&mut self, diagnostic: Diagnostic) {
        if self.echo {
            LogDiagnostics.report(diagnostic.clone());
        }
        self.entries.push(diagnostic);
    }
}
