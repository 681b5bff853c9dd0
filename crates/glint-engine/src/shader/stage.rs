use crate::device::{Device, ShaderId, ShaderKind};
use crate::diag::{Diagnostic, Diagnostics};

use super::ScriptSource;

/// A successfully compiled shader object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderStage {
    id: ShaderId,
    kind: ShaderKind,
    script_id: String,
}

impl ShaderStage {
    pub fn id(&self) -> ShaderId {
        self.id
    }

    pub fn kind(&self) -> ShaderKind {
        self.kind
    }

    /// Identifier the source was resolved from.
    pub fn script_id(&self) -> &str {
        &self.script_id
    }

    /// Deletes the shader object.
    pub fn release<D: Device + ?Sized>(self, device: &mut D) {
        device.delete_shader(self.id);
    }
}

/// Resolves, classifies, allocates and compiles the script `script_id`.
///
/// Each failure reports one diagnostic and returns `None`; a shader object
/// that fails to compile is deleted before returning.
pub fn load_shader<D, S>(
    device: &mut D,
    diagnostics: &mut dyn Diagnostics,
    sources: &S,
    script_id: &str,
) -> Option<ShaderStage>
where
    D: Device + ?Sized,
    S: ScriptSource + ?Sized,
{
    let Some(script) = sources.resolve(script_id) else {
        diagnostics.report(Diagnostic::ScriptNotFound {
            script_id: script_id.to_owned(),
        });
        return None;
    };

    let Some(kind) = script.kind() else {
        diagnostics.report(Diagnostic::IllegalShaderType {
            script_id: script_id.to_owned(),
            mime: script.mime.to_owned(),
        });
        return None;
    };

    let Some(id) = device.create_shader(kind) else {
        diagnostics.report(Diagnostic::ShaderAllocationFailed {
            script_id: script_id.to_owned(),
        });
        return None;
    };

    device.shader_source(id, script.text);
    device.compile_shader(id);
    if !device.shader_compile_status(id) {
        let log = device.shader_info_log(id);
        diagnostics.report(Diagnostic::CompileFailed {
            script_id: script_id.to_owned(),
            log,
        });
        device.delete_shader(id);
        return None;
    }

    log::debug!("compiled {kind} shader from script id[{script_id}]");
    Some(ShaderStage {
        id,
        kind,
        script_id: script_id.to_owned(),
    })
}
