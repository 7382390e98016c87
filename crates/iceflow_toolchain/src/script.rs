//! Build script generation.
//!
//! The build script chains the four IceStorm stages. Each stage reads the
//! previous stage's output file by name:
//!
//! ```text
//! <b>.ys ──yosys──▶ <b>.blif ──arachne-pnr──▶ <b>.txt ──icetime──▶ <b>.tim
//!                                                     └─icepack──▶ <b>.bin
//! ```
//!
//! What differs between host systems is captured by [`ScriptFlavor`], which
//! is pure data so both variants can be rendered and checked anywhere.

use std::fmt;

use iceflow_arch::DeviceDescriptor;
use iceflow_common::format_mhz;

/// Operating system the build script is generated for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetOs {
    /// Linux, macOS and other Unix-likes.
    Posix,
    /// Windows.
    Windows,
}

impl TargetOs {
    /// Returns the OS this binary was compiled for.
    pub fn host() -> Self {
        if cfg!(windows) {
            TargetOs::Windows
        } else {
            TargetOs::Posix
        }
    }
}

impl fmt::Display for TargetOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetOs::Posix => f.write_str("posix"),
            TargetOs::Windows => f.write_str("windows"),
        }
    }
}

/// The OS-specific parts of a build script.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScriptFlavor {
    /// Script file extension, without the dot.
    pub extension: &'static str,
    /// Interpreter argv the script path is appended to.
    pub shell: &'static [&'static str],
    /// Text placed before the stage commands.
    pub header: &'static str,
    /// Appended to every stage command to stop on failure.
    pub fail_suffix: &'static str,
}

const POSIX: ScriptFlavor = ScriptFlavor {
    extension: "sh",
    shell: &["bash"],
    header: "# Autogenerated by iceflow\nset -e\n",
    fail_suffix: "",
};

const WINDOWS: ScriptFlavor = ScriptFlavor {
    extension: "bat",
    shell: &["cmd", "/c"],
    header: "@echo off\nrem Autogenerated by iceflow\n",
    fail_suffix: " || exit /b",
};

impl ScriptFlavor {
    /// Returns the flavor for `os`.
    pub fn for_os(os: TargetOs) -> Self {
        match os {
            TargetOs::Posix => POSIX,
            TargetOs::Windows => WINDOWS,
        }
    }

    /// Returns the script file name for a build, `build_<b>.<ext>`.
    pub fn script_name(&self, build_name: &str) -> String {
        format!("build_{build_name}.{}", self.extension)
    }
}

/// Executables for the four stages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolPaths {
    /// Synthesis.
    pub yosys: String,
    /// Place and route.
    pub arachne_pnr: String,
    /// Static timing analysis.
    pub icetime: String,
    /// Bitstream packing.
    pub icepack: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            yosys: "yosys".to_string(),
            arachne_pnr: "arachne-pnr".to_string(),
            icetime: "icetime".to_string(),
            icepack: "icepack".to_string(),
        }
    }
}

/// User options for each stage, placed before the derived ones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolOptions {
    /// Options for yosys.
    pub yosys: String,
    /// Options for arachne-pnr.
    pub pnr: String,
    /// Options for icetime.
    pub icetime: String,
    /// Options for icepack.
    pub icepack: String,
}

impl Default for ToolOptions {
    fn default() -> Self {
        Self {
            yosys: "-q".to_string(),
            pnr: "-q".to_string(),
            icetime: String::new(),
            icepack: String::new(),
        }
    }
}

/// Joins non-empty tokens with single spaces.
fn join_tokens(tokens: &[&str]) -> String {
    tokens
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns the four stage commands of a build, in execution order.
///
/// `max_freq_mhz` is the single timing target given to icetime.
pub fn stage_commands(
    build_name: &str,
    device: &DeviceDescriptor,
    max_freq_mhz: f64,
    tools: &ToolPaths,
    options: &ToolOptions,
) -> [String; 4] {
    let b = build_name;
    let size = device.size();
    let package = device.package();
    let mhz = format_mhz(max_freq_mhz);
    let file = |ext: &str| format!("{b}.{ext}");
    let (ys, rpt, blif, pcf, txt, tim, bin) = (
        file("ys"),
        file("rpt"),
        file("blif"),
        file("pcf"),
        file("txt"),
        file("tim"),
        file("bin"),
    );

    let pnr_opt = join_tokens(&[options.pnr.as_str(), "-d", size.size_code(), "-P", package]);
    let icetime_opt = join_tokens(&[
        options.icetime.as_str(),
        "-P",
        package,
        "-d",
        size.as_str(),
        "-c",
        mhz.as_str(),
    ]);
    log::debug!("arachne-pnr options: {pnr_opt}");
    log::debug!("icetime options: {icetime_opt}");

    [
        join_tokens(&[
            tools.yosys.as_str(),
            options.yosys.as_str(),
            "-l",
            rpt.as_str(),
            ys.as_str(),
        ]),
        join_tokens(&[
            tools.arachne_pnr.as_str(),
            pnr_opt.as_str(),
            "-p",
            pcf.as_str(),
            blif.as_str(),
            "-o",
            txt.as_str(),
        ]),
        join_tokens(&[
            tools.icetime.as_str(),
            icetime_opt.as_str(),
            "-t",
            "-p",
            pcf.as_str(),
            "-r",
            tim.as_str(),
            txt.as_str(),
        ]),
        join_tokens(&[
            tools.icepack.as_str(),
            options.icepack.as_str(),
            txt.as_str(),
            bin.as_str(),
        ]),
    ]
}

/// Renders a build script: header, a blank line, then one line per command.
pub fn render_build_script(flavor: &ScriptFlavor, commands: &[String]) -> String {
    let mut out = String::from(flavor.header);
    out.push('\n');
    for command in commands {
        out.push_str(command);
        out.push_str(flavor.fail_suffix);
        out.push('\n');
    }
    out
}
