//! Shader source resolution and the program build pipeline.
//!
//! This module is responsible for:
//! - resolving script ids to typed source ([`ScriptSource`], [`ScriptLibrary`])
//! - reading `<script>` shaders out of an HTML host page
//! - compiling stages ([`load_shader`]) and linking programs
//!   ([`create_shader_program`]) with cleanup of everything a failed build
//!   created

mod document;
mod program;
mod source;
mod stage;

pub use document::DocumentError;
pub use program::{
    create_shader_program, create_shader_program_with, ProgramOptions, ShaderProgram, StagePolicy,
};
pub use source::{
    ScriptLibrary, ScriptSource, ShaderScript, FRAGMENT_SCRIPT_TYPE, VERTEX_SCRIPT_TYPE,
};
pub use stage::{load_shader, ShaderStage};
