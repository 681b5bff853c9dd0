use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser;
use glint_engine::logging::{init_logging, LoggingConfig};
use glint_engine::shader::{create_shader_program_with, ProgramOptions, ScriptLibrary, StagePolicy};
use glint_engine::{
    bind_vertex_buffer, create_icosahedron_buffer_set, DiagnosticLog, ErrorTracker, HeadlessDevice,
};

/// Builds the icosahedron buffers and a shader program on a headless device.
#[derive(Debug, Parser)]
#[command(name = "glint-probe", version, about)]
struct Args {
    /// HTML page to read `<script>` shaders from (default: builtin shaders).
    #[arg(long, value_name = "FILE")]
    document: Option<PathBuf>,

    /// Script id of the vertex stage.
    #[arg(long, value_name = "ID", default_value = "shader-vs")]
    vertex: String,

    /// Script id of the fragment stage.
    #[arg(long, value_name = "ID", default_value = "shader-fs")]
    fragment: String,

    /// Abandon the build before linking when a stage fails to load.
    #[arg(long)]
    fail_fast: bool,

    /// Log filter in `env_logger` syntax (overrides RUST_LOG).
    #[arg(long = "log", value_name = "FILTER")]
    log_filter: Option<String>,
}

impl Args {
    fn stage_policy(&self) -> StagePolicy {
        if self.fail_fast {
            StagePolicy::FailFast
        } else {
            StagePolicy::Lenient
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    init_logging(LoggingConfig {
        env_filter: args.log_filter.clone(),
        ..LoggingConfig::default()
    });

    let library = match &args.document {
        Some(path) => ScriptLibrary::load_document(path)?,
        None => ScriptLibrary::builtin(),
    };
    log::info!("{} script(s): {}", library.len(), library.ids().collect::<Vec<_>>().join(", "));

    let mut device = HeadlessDevice::new();
    let mut diagnostics = DiagnosticLog::echoing();
    let mut tracker = ErrorTracker::new();

    let buffers = create_icosahedron_buffer_set(&mut device, &mut diagnostics)
        .context("device refused to allocate the icosahedron buffers")?;
    println!(
        "buffers   position {} x vec{}, index {} ({} bytes)",
        buffers.position.item_count(),
        buffers.position.item_size(),
        buffers.index.item_count(),
        buffers.position.byte_len() + buffers.index.byte_len(),
    );

    let options = ProgramOptions {
        stage_policy: args.stage_policy(),
    };
    let program = create_shader_program_with(
        &mut device,
        &mut diagnostics,
        &library,
        &args.vertex,
        &args.fragment,
        options,
    );

    let status = match &program {
        Some(program) => {
            println!("program   {:?} from [{}] and [{}]", program.id(), args.vertex, args.fragment);
            for (name, buffer) in [("aPosition", &buffers.position), ("aNormal", &buffers.normal)] {
                match program.attribute_location(&device, name) {
                    Some(location) => {
                        bind_vertex_buffer(&mut device, location, buffer);
                        println!("attribute {name} -> location {location}");
                    }
                    None => println!("attribute {name} not declared"),
                }
            }
            ExitCode::SUCCESS
        }
        None => {
            println!("program   build of [{}] and [{}] failed", args.vertex, args.fragment);
            ExitCode::FAILURE
        }
    };

    if let Some(error) = tracker.check(&mut device, &mut diagnostics) {
        println!("device    {error}");
    }
    println!("diagnostics {}", diagnostics.len());
    for d in diagnostics.entries() {
        println!("  - {}", d.to_string().replace('\n', "\n    "));
    }

    if let Some(program) = program {
        program.release(&mut device);
    }
    buffers.release(&mut device);
    if device.live_buffers() + device.live_shaders() + device.live_programs() != 0 {
        bail!("device objects leaked after release");
    }

    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_builtin_ids() {
        let args = Args::try_parse_from(["glint-probe"]).unwrap();
        assert_eq!(args.vertex, "shader-vs");
        assert_eq!(args.fragment, "shader-fs");
        assert_eq!(args.stage_policy(), StagePolicy::Lenient);
        assert!(args.document.is_none());
        assert!(args.log_filter.is_none());
    }

    #[test]
    fn flags_are_read() {
        let args = Args::try_parse_from([
            "glint-probe",
            "--document",
            "page.html",
            "--vertex",
            "v",
            "--fragment",
            "f",
            "--fail-fast",
            "--log",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.document, Some(PathBuf::from("page.html")));
        assert_eq!((args.vertex.as_str(), args.fragment.as_str()), ("v", "f"));
        assert_eq!(args.stage_policy(), StagePolicy::FailFast);
        assert_eq!(args.log_filter.as_deref(), Some("debug"));
    }

    #[test]
    fn missing_value_and_unknown_flag_fail() {
        assert!(Args::try_parse_from(["glint-probe", "--vertex"]).is_err());
        assert!(Args::try_parse_from(["glint-probe", "--frobnicate"]).is_err());
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
