use crate::device::{Device, ProgramId};
use crate::diag::{Diagnostic, Diagnostics};

use super::{load_shader, ScriptSource, ShaderStage};

/// What to do when a stage fails to load.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StagePolicy {
    /// Link anyway with whatever loaded; the missing stage surfaces as a link
    /// failure.
    #[default]
    Lenient,
    /// Abandon the build before a program object is allocated.
    FailFast,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProgramOptions {
    pub stage_policy: StagePolicy,
}

/// A linked program together with the stages it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderProgram {
    id: ProgramId,
    vertex: ShaderStage,
    fragment: ShaderStage,
}

impl ShaderProgram {
    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn vertex(&self) -> &ShaderStage {
        &self.vertex
    }

    pub fn fragment(&self) -> &ShaderStage {
        &self.fragment
    }

    /// Location of the named vertex input, if the program has one.
    pub fn attribute_location<D: Device + ?Sized>(&self, device: &D, name: &str) -> Option<u32> {
        device.attribute_location(self.id, name)
    }

    /// Deletes the program and both of its stages.
    pub fn release<D: Device + ?Sized>(self, device: &mut D) {
        device.delete_program(self.id);
        self.vertex.release(device);
        self.fragment.release(device);
    }
}

/// Builds a program from two scripts with [`ProgramOptions::default`].
pub fn create_shader_program<D, S>(
    device: &mut D,
    diagnostics: &mut dyn Diagnostics,
    sources: &S,
    vertex_id: &str,
    fragment_id: &str,
) -> Option<ShaderProgram>
where
    D: Device + ?Sized,
    S: ScriptSource + ?Sized,
{
    create_shader_program_with(
        device,
        diagnostics,
        sources,
        vertex_id,
        fragment_id,
        ProgramOptions::default(),
    )
}

/// Loads both stages, links them and returns the program.
///
/// On link failure the info log is reported together with both script ids,
/// and the program plus every loaded stage are deleted. Nothing created here
/// outlives a `None` return.
pub fn create_shader_program_with<D, S>(
    device: &mut D,
    diagnostics: &mut dyn Diagnostics,
    sources: &S,
    vertex_id: &str,
    fragment_id: &str,
    options: ProgramOptions,
) -> Option<ShaderProgram>
where
    D: Device + ?Sized,
    S: ScriptSource + ?Sized,
{
    let vertex = load_shader(device, diagnostics, sources, vertex_id);
    let fragment = load_shader(device, diagnostics, sources, fragment_id);

    let missing_stage = vertex.is_none() || fragment.is_none();
    if missing_stage && options.stage_policy == StagePolicy::FailFast {
        diagnostics.report(Diagnostic::ProgramAborted {
            vertex_id: vertex_id.to_owned(),
            fragment_id: fragment_id.to_owned(),
        });
        release_stages(device, vertex, fragment);
        return None;
    }

    let Some(program) = device.create_program() else {
        diagnostics.report(Diagnostic::ProgramAllocationFailed {
            vertex_id: vertex_id.to_owned(),
            fragment_id: fragment_id.to_owned(),
        });
        release_stages(device, vertex, fragment);
        return None;
    };

    for stage in [&vertex, &fragment].into_iter().flatten() {
        device.attach_shader(program, stage.id());
    }
    device.link_program(program);

    match (vertex, fragment) {
        (Some(vertex), Some(fragment)) if device.program_link_status(program) => {
            log::debug!("linked program {program:?} from script id[{vertex_id}] and [{fragment_id}]");
            Some(ShaderProgram {
                id: program,
                vertex,
                fragment,
            })
        }
        (vertex, fragment) => {
            let log = device.program_info_log(program);
            diagnostics.report(Diagnostic::LinkFailed {
                vertex_id: vertex_id.to_owned(),
                fragment_id: fragment_id.to_owned(),
                log,
            });
            device.delete_program(program);
            release_stages(device, vertex, fragment);
            None
        }
    }
}

fn release_stages<D: Device + ?Sized>(
    device: &mut D,
    vertex: Option<ShaderStage>,
    fragment: Option<ShaderStage>,
) {
    for stage in [vertex, fragment].into_iter().flatten() {
        stage.release(device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{HeadlessDevice, HeadlessLimits};
    use crate::diag::DiagnosticLog;
    use crate::shader::{ScriptLibrary, FRAGMENT_SCRIPT_TYPE, VERTEX_SCRIPT_TYPE};

    const BROKEN_VERTEX: &str = "attribute vec5 aPosition;\nvoid main() {}";

    fn library_with_broken_vertex() -> ScriptLibrary {
        let mut lib = ScriptLibrary::builtin();
        lib.insert("broken-vs", VERTEX_SCRIPT_TYPE, BROKEN_VERTEX);
        lib
    }

    // ── success ───────────────────────────────────────────────────────────

    #[test]
    fn builtin_pair_links_without_diagnostics() {
        let mut dev = HeadlessDevice::new();
        let mut log = DiagnosticLog::new();
        let lib = ScriptLibrary::builtin();

        let program =
            create_shader_program(&mut dev, &mut log, &lib, "shader-vs", "shader-fs").unwrap();

        assert!(log.is_empty(), "{:?}", log.entries());
        assert!(dev.program_link_status(program.id()));
        assert_eq!(program.vertex().script_id(), "shader-vs");
        assert_eq!(program.fragment().script_id(), "shader-fs");
        assert_eq!(program.attribute_location(&dev, "aPosition"), Some(0));
        assert_eq!(program.attribute_location(&dev, "aNormal"), Some(1));
        assert_eq!(program.attribute_location(&dev, "vNormal"), None);
    }

    #[test]
    fn caller_ids_are_used() {
        let mut dev = HeadlessDevice::new();
        let mut log = DiagnosticLog::new();
        let mut lib = ScriptLibrary::new();
        lib.insert("v", VERTEX_SCRIPT_TYPE, "void main() { gl_Position = vec4(0.0); }");
        lib.insert("f", FRAGMENT_SCRIPT_TYPE, "void main() { gl_FragColor = vec4(1.0); }");

        let program = create_shader_program(&mut dev, &mut log, &lib, "v", "f").unwrap();
        assert_eq!(program.vertex().script_id(), "v");
        assert!(log.is_empty());
    }

    #[test]
    fn release_deletes_everything() {
        let mut dev = HeadlessDevice::new();
        let mut log = DiagnosticLog::new();
        let lib = ScriptLibrary::builtin();
        let program =
            create_shader_program(&mut dev, &mut log, &lib, "shader-vs", "shader-fs").unwrap();

        program.release(&mut dev);
        assert_eq!(dev.live_programs(), 0);
        assert_eq!(dev.live_shaders(), 0);
    }

    // ── lenient pass-through ──────────────────────────────────────────────

    #[test]
    fn failed_vertex_stage_still_reaches_link() {
        let mut dev = HeadlessDevice::new();
        let mut log = DiagnosticLog::new();
        let lib = library_with_broken_vertex();

        let program = create_shader_program(&mut dev, &mut log, &lib, "broken-vs", "shader-fs");

        assert!(program.is_none());
        match log.entries() {
            [Diagnostic::CompileFailed { script_id, .. }, Diagnostic::LinkFailed { vertex_id, fragment_id, log }] =>
            {
                assert_eq!(script_id, "broken-vs");
                assert_eq!((vertex_id.as_str(), fragment_id.as_str()), ("broken-vs", "shader-fs"));
                assert!(log.contains("vertex"), "{log}");
            }
            other => panic!("unexpected diagnostics {other:?}"),
        }
        assert_eq!(dev.live_programs(), 0);
        assert_eq!(dev.live_shaders(), 0);
    }

    #[test]
    fn missing_scripts_still_reach_link() {
        let mut dev = HeadlessDevice::new();
        let mut log = DiagnosticLog::new();
        let lib = ScriptLibrary::new();

        assert!(create_shader_program(&mut dev, &mut log, &lib, "a", "b").is_none());
        assert_eq!(log.len(), 3);
        assert!(matches!(log.entries()[2], Diagnostic::LinkFailed { .. }));
        assert_eq!(dev.live_programs(), 0);
    }

    #[test]
    fn incompatible_stages_fail_to_link() {
        let mut dev = HeadlessDevice::new();
        let mut log = DiagnosticLog::new();
        let mut lib = ScriptLibrary::builtin();
        lib.insert(
            "needs-color",
            FRAGMENT_SCRIPT_TYPE,
            "varying vec4 vColor;\nvoid main() { gl_FragColor = vColor; }",
        );

        let program = create_shader_program(&mut dev, &mut log, &lib, "shader-vs", "needs-color");

        assert!(program.is_none());
        assert_eq!(log.len(), 1);
        assert!(log.entries()[0].to_string().contains("vColor"));
        assert_eq!(dev.live_programs(), 0);
        assert_eq!(dev.live_shaders(), 0);
    }

    // ── fail fast ─────────────────────────────────────────────────────────

    #[test]
    fn fail_fast_aborts_before_program_allocation() {
        let mut dev = HeadlessDevice::new();
        let mut log = DiagnosticLog::new();
        let lib = library_with_broken_vertex();
        let options = ProgramOptions {
            stage_policy: StagePolicy::FailFast,
        };

        let program =
            create_shader_program_with(&mut dev, &mut log, &lib, "broken-vs", "shader-fs", options);

        assert!(program.is_none());
        assert!(matches!(log.entries()[0], Diagnostic::CompileFailed { .. }));
        assert_eq!(
            log.entries()[1],
            Diagnostic::ProgramAborted {
                vertex_id: "broken-vs".into(),
                fragment_id: "shader-fs".into(),
            }
        );
        assert_eq!(log.len(), 2);
        assert_eq!(dev.live_shaders(), 0);
        assert_eq!(dev.live_programs(), 0);
    }

    #[test]
    fn fail_fast_matches_lenient_on_success() {
        let mut dev = HeadlessDevice::new();
        let mut log = DiagnosticLog::new();
        let lib = ScriptLibrary::builtin();
        let options = ProgramOptions {
            stage_policy: StagePolicy::FailFast,
        };

        let program =
            create_shader_program_with(&mut dev, &mut log, &lib, "shader-vs", "shader-fs", options);
        assert!(program.is_some());
        assert!(log.is_empty());
    }

    // ── allocation ────────────────────────────────────────────────────────

    #[test]
    fn program_allocation_failure_releases_stages() {
        let mut dev = HeadlessDevice::with_limits(HeadlessLimits {
            max_programs: 0,
            ..Default::default()
        });
        let mut log = DiagnosticLog::new();
        let lib = ScriptLibrary::builtin();

        assert!(create_shader_program(&mut dev, &mut log, &lib, "shader-vs", "shader-fs").is_none());
        assert_eq!(
            log.entries(),
            [Diagnostic::ProgramAllocationFailed {
                vertex_id: "shader-vs".into(),
                fragment_id: "shader-fs".into(),
            }]
        );
        assert_eq!(dev.live_shaders(), 0);
    }
}
