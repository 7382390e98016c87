//! The IceStorm build: from a platform design to a packed bitstream.
//!
//! [`Toolchain::build`] runs in the build directory and moves through
//! [`BuildStage`]s:
//!
//! 1. enter the build directory and lower the design ([`BuildStage::DesignLowered`])
//! 2. write `<b>.v`, `<b>.pcf` and `<b>.ys` ([`BuildStage::ArtifactsWritten`])
//! 3. if requested, validate the device, write `build_<b>.sh`/`.bat` and run
//!    it ([`BuildStage::ToolchainInvoked`])
//! 4. return to the previous directory ([`BuildStage::Done`])
//!
//! Any error ends the build early. The previous working directory is restored
//! on every path, and whatever was already written stays on disk.

#![warn(missing_docs)]

pub mod error;
pub mod platform;
pub mod programmer;
pub mod script;
pub mod tools;
pub mod workdir;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use iceflow_arch::{AttributeTable, DeviceDescriptor, Family};
use iceflow_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use iceflow_pnr::compile_pcf;
use iceflow_synth::{SourceFile, SourceLanguage, SynthesisScript};
use iceflow_timing::{ConstraintError, PeriodConstraints};

pub use error::{BuildError, ErrorKind, ProgrammerError};
pub use platform::{translate_attributes, LoweredDesign, Platform};
pub use programmer::{
    IceBurnProgrammer, IceStormProgrammer, Programmer, TinyFpgaBProgrammer,
    TINYFPGA_B_USER_ADDRESS,
};
pub use script::{
    render_build_script, stage_commands, ScriptFlavor, TargetOs, ToolOptions, ToolPaths,
};
pub use tools::{run_script, write_to_file, LineEnding};
pub use workdir::WorkdirGuard;

/// Progress of a build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildStage {
    /// Nothing done yet.
    Init,
    /// The design is lowered and its signals resolved.
    DesignLowered,
    /// Verilog, PCF and synthesis script are on disk.
    ArtifactsWritten,
    /// The build script ran successfully.
    ToolchainInvoked,
    /// The working directory is restored.
    Done,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStage::Init => "init",
            BuildStage::DesignLowered => "design lowered",
            BuildStage::ArtifactsWritten => "artifacts written",
            BuildStage::ToolchainInvoked => "toolchain invoked",
            BuildStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Where and how to build.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Build directory; created if missing.
    pub build_dir: PathBuf,
    /// Base name of every artifact.
    pub build_name: String,
    /// Run the external tools after writing the artifacts.
    pub run: bool,
}

impl BuildRequest {
    /// A request that builds `top` in `build_dir` and runs the tools.
    pub fn new(build_dir: impl Into<PathBuf>) -> Self {
        Self {
            build_dir: build_dir.into(),
            build_name: "top".to_string(),
            run: true,
        }
    }
}

/// The result of a successful build.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// Resource name to signal name in the lowered design.
    pub namespace: BTreeMap<String, String>,
    /// Absolute paths of the files written, in write order.
    pub artifacts: Vec<PathBuf>,
    /// Absolute path of the build script, if the tools were run.
    pub script: Option<PathBuf>,
    /// The last stage reached.
    pub stage: BuildStage,
}

/// An IceStorm toolchain instance.
///
/// Holds everything that is configured once and reused across builds: tool
/// options and paths, synthesis hooks, the attribute table, and the period
/// constraints.
#[derive(Debug, Clone)]
pub struct Toolchain {
    /// User options per tool.
    pub options: ToolOptions,
    /// Executable per tool.
    pub tools: ToolPaths,
    /// yosys commands run before synthesis.
    pub pre_synthesis_commands: Vec<String>,
    /// Replacement for the default synthesis command.
    pub synthesis_commands: Vec<String>,
    /// yosys commands run after synthesis.
    pub post_synthesis_commands: Vec<String>,
    /// Attribute translations handed to the platform's lowering.
    pub attributes: AttributeTable,
    /// OS the build script is generated for.
    pub target_os: TargetOs,
    constraints: PeriodConstraints,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Toolchain {
    /// Extension of the final bitstream.
    pub const BITSTREAM_EXTENSION: &'static str = ".bin";

    /// Creates a toolchain with default options for the host OS.
    pub fn new() -> Self {
        Self {
            options: ToolOptions::default(),
            tools: ToolPaths::default(),
            pre_synthesis_commands: Vec::new(),
            synthesis_commands: Vec::new(),
            post_synthesis_commands: Vec::new(),
            attributes: AttributeTable::icestorm(),
            target_os: TargetOs::host(),
            constraints: PeriodConstraints::new(),
        }
    }

    /// Requires `clock` to close timing at `period_ns` nanoseconds.
    pub fn add_period_constraint(
        &mut self,
        clock: impl Into<String>,
        period_ns: f64,
    ) -> Result<(), ConstraintError> {
        self.constraints.add_period_constraint(clock, period_ns)
    }

    /// Returns the registered period constraints.
    pub fn constraints(&self) -> &PeriodConstraints {
        &self.constraints
    }

    /// Builds `design` for `platform`.
    pub fn build<P: Platform>(
        &self,
        platform: &P,
        design: &P::Design,
        request: &BuildRequest,
        sink: &DiagnosticSink,
    ) -> Result<BuildOutcome, BuildError> {
        let guard = WorkdirGuard::enter(&request.build_dir)
            .map_err(|e| BuildError::io(&request.build_dir, e))?;
        let mut outcome = self.build_in(guard.path(), platform, design, request, sink)?;
        drop(guard);
        outcome.stage = BuildStage::Done;
        log::debug!("build stage: {}", outcome.stage);
        Ok(outcome)
    }

    fn build_in<P: Platform>(
        &self,
        dir: &Path,
        platform: &P,
        design: &P::Design,
        request: &BuildRequest,
        sink: &DiagnosticSink,
    ) -> Result<BuildOutcome, BuildError> {
        let b = request.build_name.as_str();
        let line_ending = LineEnding::for_os(self.target_os);

        let lowered = platform.lower(design, &self.attributes, sink)?;
        let mut outcome = BuildOutcome {
            namespace: lowered.namespace.clone(),
            artifacts: Vec::new(),
            script: None,
            stage: BuildStage::DesignLowered,
        };
        log::debug!("build stage: {}", outcome.stage);

        let verilog_name = format!("{b}.v");
        outcome.write_artifact(dir, &verilog_name, &lowered.verilog, line_ending)?;

        let pcf = compile_pcf(&lowered.signals, &lowered.platform_constraints);
        outcome.write_artifact(dir, &format!("{b}.pcf"), &pcf, line_ending)?;

        let mut sources: Vec<SourceFile> = platform.sources().to_vec();
        sources.push(SourceFile::new(verilog_name, SourceLanguage::Verilog));
        let synthesis = SynthesisScript {
            family: Family::Ice40,
            sources: &sources,
            include_paths: platform.include_paths(),
            build_name: b,
            pre_synthesis: &self.pre_synthesis_commands,
            synthesis_override: &self.synthesis_commands,
            post_synthesis: &self.post_synthesis_commands,
        };
        let ys = synthesis.render();
        for (command, key) in &ys.unrecognized {
            sink.emit(
                Diagnostic::warning(
                    DiagnosticCode::UNRECOGNIZED_PLACEHOLDER,
                    format!("unrecognized placeholder '{{{key}}}' left as written"),
                )
                .with_subject(command.clone())
                .with_note("the only recognized placeholder is {build_name}"),
            );
        }
        outcome.write_artifact(dir, &synthesis.file_name(), &ys.text(), line_ending)?;

        outcome.stage = BuildStage::ArtifactsWritten;
        log::debug!("build stage: {}", outcome.stage);
        if !request.run {
            return Ok(outcome);
        }

        let device = DeviceDescriptor::parse(platform.device())?;
        let max_freq = self.constraints.worst_case_frequency();
        log::info!("device {device}, timing target {max_freq} MHz");
        let commands = stage_commands(b, &device, max_freq, &self.tools, &self.options);

        let flavor = ScriptFlavor::for_os(self.target_os);
        let script_name = flavor.script_name(b);
        let script = outcome.write_artifact(
            dir,
            &script_name,
            &render_build_script(&flavor, &commands),
            line_ending,
        )?;
        outcome.script = Some(script.clone());

        let code = run_script(flavor.shell, Path::new(&script_name))
            .map_err(|e| BuildError::io(&script, e))?;
        if code != 0 {
            return Err(BuildError::ToolchainFailure { script, code });
        }

        outcome.stage = BuildStage::ToolchainInvoked;
        log::debug!("build stage: {}", outcome.stage);
        Ok(outcome)
    }
}

impl BuildOutcome {
    /// Writes `name` in the working directory and records it under `dir`.
    fn write_artifact(
        &mut self,
        dir: &Path,
        name: &str,
        content: &str,
        line_ending: LineEnding,
    ) -> Result<PathBuf, BuildError> {
        let path = dir.join(name);
        write_to_file(Path::new(name), content, line_ending)
            .map_err(|e| BuildError::io(&path, e))?;
        self.artifacts.push(path.clone());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workdir::CWD_LOCK;
    use iceflow_pnr::SignalBinding;
    use std::fs;

    struct Board {
        device: String,
        constraints: Vec<String>,
    }

    struct Blinky {
        pins: Vec<(&'static str, Vec<&'static str>)>,
    }

    impl Platform for Board {
        type Design = Blinky;

        fn device(&self) -> &str {
            &self.device
        }

        fn lower(
            &self,
            design: &Blinky,
            _attributes: &AttributeTable,
            _sink: &DiagnosticSink,
        ) -> Result<LoweredDesign, BuildError> {
            let signals: Vec<SignalBinding> = design
                .pins
                .iter()
                .map(|(name, pins)| {
                    SignalBinding::new(*name, pins.iter().map(|p| p.to_string()).collect())
                })
                .collect();
            Ok(LoweredDesign {
                verilog: "module top(input clk, output led);\nendmodule\n".to_string(),
                namespace: signals
                    .iter()
                    .map(|s| (s.resource.clone(), s.name.clone()))
                    .collect(),
                signals,
                platform_constraints: self.constraints.clone(),
            })
        }
    }

    fn board(device: &str) -> Board {
        Board {
            device: device.to_string(),
            constraints: Vec::new(),
        }
    }

    fn lock() -> std::sync::MutexGuard<'static, ()> {
        CWD_LOCK.lock().unwrap_or_else(|p| p.into_inner())
    }

    #[test]
    fn artifacts_only_build() {
        let _lock = lock();
        let tmp = tempfile::tempdir().unwrap();
        let build_dir = tmp.path().join("build");
        let before = std::env::current_dir().unwrap();

        let mut toolchain = Toolchain::new();
        toolchain.target_os = TargetOs::Posix;
        toolchain.add_period_constraint("clk", 10.0).unwrap();

        let design = Blinky {
            pins: vec![("led", vec!["P1"])],
        };
        let request = BuildRequest {
            build_dir: build_dir.clone(),
            build_name: "top".to_string(),
            run: false,
        };
        let sink = DiagnosticSink::new();
        let outcome = toolchain
            .build(&board("ice40-hx1k-tq144"), &design, &request, &sink)
            .unwrap();

        assert_eq!(std::env::current_dir().unwrap(), before);
        assert_eq!(outcome.stage, BuildStage::Done);
        assert!(outcome.script.is_none());
        assert_eq!(outcome.namespace["led"], "led");

        let mut names: Vec<String> = fs::read_dir(&build_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["top.pcf", "top.v", "top.ys"]);
        assert_eq!(
            fs::read_to_string(build_dir.join("top.pcf")).unwrap(),
            "set_io led P1\n"
        );
        assert_eq!(
            outcome.artifacts,
            vec![
                build_dir.join("top.v"),
                build_dir.join("top.pcf"),
                build_dir.join("top.ys"),
            ]
        );
    }

    #[test]
    fn device_not_checked_without_run() {
        let _lock = lock();
        let tmp = tempfile::tempdir().unwrap();
        let request = BuildRequest {
            run: false,
            ..BuildRequest::new(tmp.path().join("b"))
        };
        let outcome = Toolchain::new()
            .build(
                &board("ice40-hx1k-qn84"),
                &Blinky { pins: vec![] },
                &request,
                &DiagnosticSink::new(),
            )
            .unwrap();
        assert_eq!(outcome.artifacts.len(), 3);
    }

    #[test]
    fn invalid_device_fails_before_script() {
        let _lock = lock();
        let tmp = tempfile::tempdir().unwrap();
        let before = std::env::current_dir().unwrap();
        let build_dir = tmp.path().join("b");
        let err = Toolchain::new()
            .build(
                &board("ice40-hx1k-qn84"),
                &Blinky { pins: vec![] },
                &BuildRequest::new(&build_dir),
                &DiagnosticSink::new(),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            BuildError::Device(iceflow_arch::DeviceError::InvalidPackage { .. })
        ));
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(std::env::current_dir().unwrap(), before);
        assert!(build_dir.join("top.ys").exists());
        assert!(!build_dir.join("build_top.sh").exists());
    }

    #[test]
    fn synthesis_script_reads_lowered_verilog_last() {
        let _lock = lock();
        let tmp = tempfile::tempdir().unwrap();
        let build_dir = tmp.path().join("b");

        struct WithSources(Board, Vec<SourceFile>, Vec<String>);
        impl Platform for WithSources {
            type Design = Blinky;
            fn device(&self) -> &str {
                self.0.device()
            }
            fn sources(&self) -> &[SourceFile] {
                &self.1
            }
            fn include_paths(&self) -> &[String] {
                &self.2
            }
            fn lower(
                &self,
                design: &Blinky,
                attributes: &AttributeTable,
                sink: &DiagnosticSink,
            ) -> Result<LoweredDesign, BuildError> {
                self.0.lower(design, attributes, sink)
            }
        }

        let platform = WithSources(
            board("ice40-lp8k-cm81"),
            vec![SourceFile::new("/ip/uart.v", SourceLanguage::Verilog)],
            vec!["/ip/include".to_string()],
        );
        let mut toolchain = Toolchain::new();
        toolchain.post_synthesis_commands = vec!["write_json {netlist}.json".to_string()];
        let sink = DiagnosticSink::new();
        let request = BuildRequest {
            build_dir: build_dir.clone(),
            build_name: "soc".to_string(),
            run: false,
        };
        toolchain
            .build(&platform, &Blinky { pins: vec![] }, &request, &sink)
            .unwrap();

        let ys = fs::read_to_string(build_dir.join("soc.ys")).unwrap();
        let lines: Vec<&str> = ys.lines().collect();
        assert_eq!(lines[0], "read_verilog -I/ip/include /ip/uart.v");
        assert_eq!(lines[1], "read_verilog -I/ip/include soc.v");
        assert_eq!(lines[3], "synth_ice40 -top top -blif soc.blif");
        assert_eq!(lines[4], "write_json {netlist}.json");

        let diags = sink.take_all();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::UNRECOGNIZED_PLACEHOLDER);
    }

    #[test]
    fn platform_constraints_reach_pcf() {
        let _lock = lock();
        let tmp = tempfile::tempdir().unwrap();
        let build_dir = tmp.path().join("b");
        let mut platform = board("ice40-hx8k-ct256");
        platform.constraints = vec!["set_io a 1".to_string(), "set_io b 2".to_string()];
        let design = Blinky {
            pins: vec![("led", vec!["B5", "B4"])],
        };
        let request = BuildRequest {
            run: false,
            ..BuildRequest::new(&build_dir)
        };
        Toolchain::new()
            .build(&platform, &design, &request, &DiagnosticSink::new())
            .unwrap();
        assert_eq!(
            fs::read_to_string(build_dir.join("top.pcf")).unwrap(),
            "set_io led[0] B5\nset_io led[1] B4\n\nset_io a 1\n\nset_io b 2"
        );
    }

    #[test]
    fn windows_artifacts_use_crlf() {
        let _lock = lock();
        let tmp = tempfile::tempdir().unwrap();
        let build_dir = tmp.path().join("b");
        let mut toolchain = Toolchain::new();
        toolchain.target_os = TargetOs::Windows;
        let request = BuildRequest {
            run: false,
            ..BuildRequest::new(&build_dir)
        };
        toolchain
            .build(
                &board("ice40-hx1k-tq144"),
                &Blinky {
                    pins: vec![("led", vec!["99"])],
                },
                &request,
                &DiagnosticSink::new(),
            )
            .unwrap();
        assert_eq!(
            fs::read_to_string(build_dir.join("top.pcf")).unwrap(),
            "set_io led 99\r\n"
        );
    }

    #[test]
    fn duplicate_clock_is_rejected() {
        let mut toolchain = Toolchain::new();
        toolchain.add_period_constraint("clk", 10.0).unwrap();
        assert!(matches!(
            toolchain.add_period_constraint("clk", 20.0),
            Err(ConstraintError::DuplicateConstraint { .. })
        ));
        assert_eq!(toolchain.constraints().worst_case_frequency(), 100.0);
    }

    #[test]
    fn bitstream_extension() {
        assert_eq!(Toolchain::BITSTREAM_EXTENSION, ".bin");
    }
}
