//! `iceflow build`: generate the build artifacts and run the IceStorm tools.
//!
//! The project's top file is already flat Verilog, so lowering copies it into
//! the build directory and resolves the configured pin bindings against it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use iceflow_arch::AttributeTable;
use iceflow_config::{PinBinding, ProjectConfig, ResolvedTarget};
use iceflow_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use iceflow_pnr::SignalBinding;
use iceflow_synth::{SourceFile, SourceLanguage};
use iceflow_timing::ConstraintError;
use iceflow_toolchain::{
    translate_attributes, BuildError, BuildRequest, LoweredDesign, Platform, ToolOptions,
    ToolPaths, Toolchain,
};

use crate::pipeline::{render_diagnostics, resolve_project_root};
use crate::{BuildArgs, GlobalArgs};

/// The flat Verilog top file of a project.
#[derive(Debug, Clone)]
pub struct TopFile {
    /// Absolute path of the file.
    pub path: PathBuf,
}

/// A board described by a resolved `iceflow.toml` target.
#[derive(Debug, Clone)]
pub struct ProjectPlatform {
    device: String,
    sources: Vec<SourceFile>,
    include_paths: Vec<String>,
    pins: BTreeMap<String, PinBinding>,
    constraint_commands: Vec<String>,
    constraint_files: Vec<PathBuf>,
}

fn absolute(project_dir: &Path, path: &str) -> PathBuf {
    project_dir.join(path)
}

impl ProjectPlatform {
    /// Builds the platform for `target`. Relative paths are taken from
    /// `project_dir`, which must be absolute.
    pub fn from_config(
        project_dir: &Path,
        config: &ProjectConfig,
        target: &ResolvedTarget,
    ) -> Result<Self> {
        let mut sources = Vec::new();
        for file in &config.sources.files {
            let path = absolute(project_dir, file);
            let Some(language) = SourceLanguage::from_path(&path) else {
                bail!("cannot tell the language of source '{file}' from its extension");
            };
            sources.push(SourceFile::new(path.display().to_string(), language));
        }

        Ok(Self {
            device: target.device.clone(),
            sources,
            include_paths: config
                .sources
                .include
                .iter()
                .map(|p| absolute(project_dir, p).display().to_string())
                .collect(),
            pins: target.pins.clone(),
            constraint_commands: target.constraints.commands.clone(),
            constraint_files: target
                .constraints
                .files
                .iter()
                .map(|f| absolute(project_dir, f))
                .collect(),
        })
    }
}

impl Platform for ProjectPlatform {
    type Design = TopFile;

    fn device(&self) -> &str {
        &self.device
    }

    fn sources(&self) -> &[SourceFile] {
        &self.sources
    }

    fn include_paths(&self) -> &[String] {
        &self.include_paths
    }

    fn lower(
        &self,
        design: &TopFile,
        attributes: &AttributeTable,
        sink: &DiagnosticSink,
    ) -> Result<LoweredDesign, BuildError> {
        let verilog =
            fs::read_to_string(&design.path).map_err(|e| BuildError::io(&design.path, e))?;

        let mut lowered = LoweredDesign {
            verilog,
            ..LoweredDesign::default()
        };
        for (resource, pin) in &self.pins {
            let name = pin.signal.clone().unwrap_or_else(|| resource.clone());
            let mut attrs = translate_attributes(&name, &pin.attributes, attributes, sink);
            if let Some(io_standard) = &pin.io_standard {
                attrs.insert("io_standard".to_string(), io_standard.clone());
            }
            lowered.namespace.insert(resource.clone(), name.clone());
            lowered.signals.push(SignalBinding {
                name,
                pins: pin.pin.clone(),
                attributes: attrs,
                resource: resource.clone(),
            });
        }

        lowered.platform_constraints = self.constraint_commands.clone();
        for file in &self.constraint_files {
            let text = fs::read_to_string(file).map_err(|e| BuildError::io(file, e))?;
            lowered
                .platform_constraints
                .push(text.trim_end().to_string());
        }
        Ok(lowered)
    }
}

/// Creates the toolchain for a project: tool settings, synthesis hooks and
/// clock constraints.
pub fn toolchain_from_config(config: &ProjectConfig) -> Result<Toolchain, BuildError> {
    let tc = &config.toolchain;
    let mut toolchain = Toolchain::new();
    toolchain.options = ToolOptions {
        yosys: tc.yosys_opt.clone(),
        pnr: tc.pnr_opt.clone(),
        icetime: tc.icetime_opt.clone(),
        icepack: tc.icepack_opt.clone(),
    };
    toolchain.tools = ToolPaths {
        yosys: tc.yosys.clone(),
        arachne_pnr: tc.arachne_pnr.clone(),
        icetime: tc.icetime.clone(),
        icepack: tc.icepack.clone(),
    };
    toolchain.pre_synthesis_commands = config.synthesis.pre.clone();
    toolchain.synthesis_commands = config.synthesis.commands.clone();
    toolchain.post_synthesis_commands = config.synthesis.post.clone();

    for (key, clock) in &config.clocks {
        let period = clock.period_ns(key).map_err(|e| {
            log::warn!("{e}");
            ConstraintError::InvalidPeriod {
                clock: clock.identity(key).to_string(),
                period_ns: clock.period.unwrap_or(f64::NAN),
            }
        })?;
        toolchain.add_period_constraint(clock.identity(key), period)?;
    }
    Ok(toolchain)
}

/// Converts a build error into the diagnostic shown to the user.
pub fn error_diagnostic(err: &BuildError) -> Diagnostic {
    let code = match err {
        BuildError::Device(_) => DiagnosticCode::INVALID_DEVICE,
        BuildError::Constraint(ConstraintError::DuplicateConstraint { .. }) => {
            DiagnosticCode::DUPLICATE_CONSTRAINT
        }
        BuildError::Constraint(ConstraintError::InvalidPeriod { .. }) => {
            DiagnosticCode::INVALID_PERIOD
        }
        BuildError::Lowering(_) => DiagnosticCode::LOWERING_FAILURE,
        BuildError::ToolchainFailure { .. } => DiagnosticCode::TOOLCHAIN_FAILURE,
        BuildError::Io { .. } => DiagnosticCode::IO_FAILURE,
    };
    let diag = Diagnostic::error(code, err.to_string());
    match err {
        BuildError::ToolchainFailure { .. } => diag
            .with_note("artifacts and tool reports were left in the build directory")
            .with_help("see <build_name>.rpt and <build_name>.tim for details"),
        BuildError::Constraint(ConstraintError::DuplicateConstraint { clock }) => diag
            .with_subject(format!("clock '{clock}'"))
            .with_help("each clock port may be constrained once"),
        _ => diag,
    }
}

/// Runs the `iceflow build` command.
///
/// Returns exit code 0 on success, 1 on error.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32> {
    let project_dir = resolve_project_root(global)?;
    let config = iceflow_config::load_config(&project_dir)
        .with_context(|| format!("loading {}", project_dir.display()))?;

    if !global.quiet {
        eprintln!("   Building {}", config.project.name);
    }

    let target_name = iceflow_config::select_target(&config, args.target.as_deref())?;
    let resolved = iceflow_config::resolve_target(&config, target_name)?;

    if !global.quiet {
        eprintln!("    Target {} ({})", resolved.name, resolved.device);
    }

    let platform = ProjectPlatform::from_config(&project_dir, &config, &resolved)?;
    let toolchain = match toolchain_from_config(&config) {
        Ok(toolchain) => toolchain,
        Err(e) => {
            render_diagnostics(&[error_diagnostic(&e)], args.message_format, global);
            return Ok(1);
        }
    };

    let build_dir = match &args.build_dir {
        Some(dir) => std::path::absolute(dir)?,
        None => project_dir.join(&config.project.build_dir),
    };
    let request = BuildRequest {
        build_dir,
        build_name: args
            .build_name
            .clone()
            .unwrap_or_else(|| config.project.build_name.clone()),
        run: !args.no_run,
    };
    let design = TopFile {
        path: absolute(&project_dir, &config.project.top),
    };

    let sink = DiagnosticSink::new();
    let result = toolchain.build(&platform, &design, &request, &sink);
    render_diagnostics(&sink.take_all(), args.message_format, global);

    match result {
        Ok(outcome) => {
            if !global.quiet {
                eprintln!();
                for path in &outcome.artifacts {
                    eprintln!("     Wrote {}", path.display());
                }
                if request.run {
                    let bitstream = request.build_dir.join(format!(
                        "{}{}",
                        request.build_name,
                        Toolchain::BITSTREAM_EXTENSION
                    ));
                    eprintln!(" Generated {}", bitstream.display());
                }
                eprintln!("   Build complete ({}).", outcome.stage);
            }
            Ok(0)
        }
        Err(e) => {
            log::debug!("build failed: {e:?}");
            render_diagnostics(&[error_diagnostic(&e)], args.message_format, global);
            Ok(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iceflow_config::load_config_from_str;
    use tempfile::TempDir;

    const PROJECT: &str = r#"
[project]
name = "blinky"
top = "src/top.v"

[sources]
files = ["src/uart.v"]
include = ["src/include"]

[pins.clk]
pin = "21"

[pins.user_led]
pins = ["99", "98"]
signal = "led"
io_standard = "SB_LVCMOS"
attributes = ["keep", "async_reg", "pullup"]

[clocks.sys]
port = "clk"
frequency = "12MHz"

[constraints]
commands = ["set_io --warn-no-port unused 1"]
files = ["constraints/extra.pcf"]

[synthesis]
post = ["stat"]

[toolchain]
icetime_opt = "-m"

[targets.icestick]
device = "ice40-hx1k-tq144"
"#;

    fn project() -> (TempDir, ProjectConfig) {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        fs::create_dir_all(tmp.path().join("constraints")).unwrap();
        fs::write(
            tmp.path().join("src/top.v"),
            "module top(input clk, output [1:0] led);\nendmodule\n",
        )
        .unwrap();
        fs::write(
            tmp.path().join("constraints/extra.pcf"),
            "set_io spare 44\n\n",
        )
        .unwrap();
        (tmp, load_config_from_str(PROJECT).unwrap())
    }

    #[test]
    fn platform_from_config_uses_absolute_paths() {
        let (tmp, config) = project();
        let target = iceflow_config::resolve_target(&config, "icestick").unwrap();
        let platform = ProjectPlatform::from_config(tmp.path(), &config, &target).unwrap();
        assert_eq!(platform.device(), "ice40-hx1k-tq144");
        assert_eq!(
            platform.sources()[0].path,
            tmp.path().join("src/uart.v").display().to_string()
        );
        assert_eq!(platform.sources()[0].language, SourceLanguage::Verilog);
        assert_eq!(
            platform.include_paths(),
            [tmp.path().join("src/include").display().to_string()]
        );
    }

    #[test]
    fn unknown_source_extension_errors() {
        let (tmp, mut config) = project();
        config.sources.files.push("notes.txt".to_string());
        let target = iceflow_config::resolve_target(&config, "icestick").unwrap();
        let err = ProjectPlatform::from_config(tmp.path(), &config, &target).unwrap_err();
        assert!(err.to_string().contains("notes.txt"));
    }

    #[test]
    fn lowering_resolves_pins_and_constraints() {
        let (tmp, config) = project();
        let target = iceflow_config::resolve_target(&config, "icestick").unwrap();
        let platform = ProjectPlatform::from_config(tmp.path(), &config, &target).unwrap();
        let sink = DiagnosticSink::new();
        let lowered = platform
            .lower(
                &TopFile {
                    path: tmp.path().join("src/top.v"),
                },
                &AttributeTable::icestorm(),
                &sink,
            )
            .unwrap();

        assert!(lowered.verilog.starts_with("module top"));
        assert_eq!(lowered.namespace["user_led"], "led");
        assert_eq!(lowered.namespace["clk"], "clk");

        let led = &lowered.signals[1];
        assert_eq!(led.name, "led");
        assert_eq!(led.resource, "user_led");
        assert_eq!(led.pins, vec!["99", "98"]);
        assert_eq!(led.attributes["keep"], "true");
        assert_eq!(led.attributes["io_standard"], "SB_LVCMOS");
        assert!(!led.attributes.contains_key("async_reg"));

        assert_eq!(
            lowered.platform_constraints,
            vec!["set_io --warn-no-port unused 1", "set_io spare 44"]
        );

        let codes: Vec<_> = sink.take_all().into_iter().map(|d| d.code).collect();
        assert_eq!(
            codes,
            vec![
                DiagnosticCode::UNSUPPORTED_ATTRIBUTE,
                DiagnosticCode::UNKNOWN_ATTRIBUTE
            ]
        );
    }

    #[test]
    fn missing_top_is_io_error() {
        let (tmp, config) = project();
        let target = iceflow_config::resolve_target(&config, "icestick").unwrap();
        let platform = ProjectPlatform::from_config(tmp.path(), &config, &target).unwrap();
        let err = platform
            .lower(
                &TopFile {
                    path: tmp.path().join("src/missing.v"),
                },
                &AttributeTable::icestorm(),
                &DiagnosticSink::new(),
            )
            .unwrap_err();
        assert!(matches!(err, BuildError::Io { .. }));
    }

    #[test]
    fn toolchain_takes_settings_from_config() {
        let (_tmp, config) = project();
        let toolchain = toolchain_from_config(&config).unwrap();
        assert_eq!(toolchain.options.icetime, "-m");
        assert_eq!(toolchain.options.yosys, "-q");
        assert_eq!(toolchain.post_synthesis_commands, vec!["stat"]);
        let clk = toolchain.constraints().get("clk").unwrap();
        assert_eq!(clk.mhz, 1000.0 / (1000.0 / 12.0));
    }

    #[test]
    fn two_clocks_on_one_port_are_rejected() {
        let toml = r#"
[project]
name = "t"
top = "top.v"

[clocks.a]
port = "clk"
period = 10.0

[clocks.b]
port = "clk"
period = 20.0
"#;
        let config = load_config_from_str(toml).unwrap();
        let err = toolchain_from_config(&config).unwrap_err();
        let diag = error_diagnostic(&err);
        assert_eq!(diag.code, DiagnosticCode::DUPLICATE_CONSTRAINT);
        assert_eq!(diag.subject.as_deref(), Some("clock 'clk'"));
    }

    #[test]
    fn bad_clock_reports_invalid_period() {
        let mut config = load_config_from_str(
            "[project]\nname = \"t\"\ntop = \"top.v\"\n\n[clocks.sys]\nport = \"clk\"\nperiod = 10.0\n",
        )
        .unwrap();
        config.clocks.get_mut("sys").unwrap().period = Some(-5.0);
        let err = toolchain_from_config(&config).unwrap_err();
        assert!(matches!(
            err,
            BuildError::Constraint(ConstraintError::InvalidPeriod { ref clock, period_ns })
                if clock == "clk" && period_ns == -5.0
        ));
        assert_eq!(error_diagnostic(&err).code, DiagnosticCode::INVALID_PERIOD);

        config.clocks.get_mut("sys").unwrap().frequency = Some("12MHz".to_string());
        let err = toolchain_from_config(&config).unwrap_err();
        assert_eq!(error_diagnostic(&err).code, DiagnosticCode::INVALID_PERIOD);
    }

    #[test]
    fn pcf_lists_bindings_by_resource_name() {
        let toml = r#"
[project]
name = "t"
top = "src/top.v"

[pins.zeta]
pin = "1"

[pins.alpha]
pin = "2"

[targets.board]
device = "ice40-hx1k-tq144"
"#;
        let (tmp, _) = project();
        let config = load_config_from_str(toml).unwrap();
        let target = iceflow_config::resolve_target(&config, "board").unwrap();
        let platform = ProjectPlatform::from_config(tmp.path(), &config, &target).unwrap();
        let lowered = platform
            .lower(
                &TopFile {
                    path: tmp.path().join("src/top.v"),
                },
                &AttributeTable::icestorm(),
                &DiagnosticSink::new(),
            )
            .unwrap();
        assert_eq!(
            iceflow_pnr::compile_pcf(&lowered.signals, &lowered.platform_constraints),
            "set_io alpha 2\nset_io zeta 1\n"
        );
    }

    #[test]
    fn error_codes() {
        let device = BuildError::Device(iceflow_arch::DeviceError::InvalidFamily(
            "ecp5".to_string(),
        ));
        assert_eq!(
            error_diagnostic(&device).code,
            DiagnosticCode::INVALID_DEVICE
        );
        let failed = BuildError::ToolchainFailure {
            script: PathBuf::from("build_top.sh"),
            code: 1,
        };
        let diag = error_diagnostic(&failed);
        assert_eq!(diag.code, DiagnosticCode::TOOLCHAIN_FAILURE);
        assert!(!diag.notes.is_empty());
    }
}
