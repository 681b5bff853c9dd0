//! Helpers over a GL-style graphics device.
//!
//! - [`buffer`]: typed vertex and index buffers, attribute binding
//! - [`mesh`]: the fixed icosahedron mesh
//! - [`shader`]: script lookup and the compile / link pipeline
//! - [`diag`]: diagnostics sink and device error polling
//! - [`device`]: the device trait with headless and `glow` implementations
//!
//! Nothing here panics on bad input. Failures are reported to a
//! [`Diagnostics`] sink and surface as `None`.

pub mod buffer;
pub mod device;
pub mod diag;
pub mod logging;
pub mod mesh;
pub mod shader;

pub use buffer::{bind_vertex_buffer, create_buffer, TypedBuffer};
pub use device::{Device, HeadlessDevice};
pub use diag::{Diagnostic, DiagnosticLog, Diagnostics, ErrorTracker, LogDiagnostics};
pub use mesh::{create_icosahedron_buffer_set, BufferSet};
pub use shader::{create_shader_program, load_shader, ScriptLibrary, ScriptSource, ShaderProgram};
