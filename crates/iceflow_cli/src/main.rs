//! iceflow CLI: builds and programs iCE40 designs with the IceStorm tools.
//!
//! Provides `iceflow init` for project scaffolding, `iceflow build` for
//! generating the build artifacts and running yosys, arachne-pnr, icetime and
//! icepack, and `iceflow program` for loading or flashing the bitstream.

#![warn(missing_docs)]

mod build;
mod init;
mod pipeline;
mod program;

use std::io::IsTerminal;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

/// iceflow: an iCE40 build orchestrator for the IceStorm tools.
#[derive(Parser, Debug)]
#[command(name = "iceflow", version, about = "iCE40 IceStorm build orchestrator")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `iceflow.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new iceflow project.
    Init {
        /// Project name (creates a subdirectory). If omitted, initializes in
        /// the current directory.
        name: Option<String>,

        /// Device string for the default target.
        #[arg(short, long, default_value = init::DEFAULT_DEVICE)]
        device: String,
    },
    /// Generate the build artifacts and run the toolchain.
    Build(BuildArgs),
    /// Load or flash a bitstream onto a board.
    Program(ProgramArgs),
}

/// Arguments for the `iceflow build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Target name to select from `iceflow.toml`.
    #[arg(short, long)]
    pub target: Option<String>,

    /// Write the artifacts without running the external tools.
    #[arg(long)]
    pub no_run: bool,

    /// Build directory (default: `project.build_dir`).
    #[arg(long)]
    pub build_dir: Option<String>,

    /// Base name of the artifacts (default: `project.build_name`).
    #[arg(long)]
    pub build_name: Option<String>,

    /// Output format for diagnostics.
    #[arg(long, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,
}

/// Arguments for the `iceflow program` subcommand.
#[derive(Parser, Debug)]
pub struct ProgramArgs {
    /// Bitstream to program (default: `<build_dir>/<build_name>.bin`).
    pub bitstream: Option<String>,

    /// Programmer to use.
    #[arg(short, long, value_enum, default_value_t = ProgrammerKind::Iceprog)]
    pub programmer: ProgrammerKind,

    /// Write to SPI flash at this address instead of loading into SRAM.
    #[arg(long, value_name = "ADDRESS")]
    pub flash: Option<String>,

    /// Path to the iCEburn script.
    #[arg(long, default_value = "iCEburn.py")]
    pub iceburn_path: String,
}

/// Board programmer selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProgrammerKind {
    /// `iceprog` (iCEstick, HX8K breakout).
    Iceprog,
    /// `iCEburn` (iCE40-HX8K breakout).
    Iceburn,
    /// `tinyfpgab` (TinyFPGA B2).
    Tinyfpgab,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    /// Human-readable terminal output.
    Human,
    /// One JSON object per line.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

impl GlobalArgs {
    /// Returns the log level selected by `--quiet`/`--verbose`.
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Error
        } else if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        }
    }
}

fn init_logging(global: &GlobalArgs) {
    env_logger::Builder::new()
        .filter_level(global.log_level())
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };
    init_logging(&global);

    let result = match cli.command {
        Command::Init { name, device } => init::run(name, &device, &global),
        Command::Build(ref args) => build::run(args, &global),
        Command::Program(ref args) => program::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    }
}
