//! `iceflow init`: project scaffolding command.
//!
//! Creates a project directory with `src/`, `constraints/`, an
//! `iceflow.toml` with one target, and a blinking-LED top module.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use iceflow_arch::DeviceDescriptor;
use iceflow_config::CONFIG_FILE_NAME;

use crate::GlobalArgs;

/// Device of the iCEstick evaluation board.
pub const DEFAULT_DEVICE: &str = "ice40-hx1k-tq144";

/// Runs the `iceflow init` command.
///
/// If `name` is `Some`, creates a new subdirectory with that name.
/// Otherwise initializes in the current working directory.
pub fn run(name: Option<String>, device: &str, global: &GlobalArgs) -> Result<i32> {
    let device = DeviceDescriptor::parse(device)?;

    let project_dir = match &name {
        Some(n) => {
            let dir = PathBuf::from(n);
            if dir.exists() {
                bail!("directory '{n}' already exists");
            }
            fs::create_dir_all(&dir)?;
            dir
        }
        None => std::env::current_dir()?,
    };
    if project_dir.join(CONFIG_FILE_NAME).exists() {
        bail!(
            "{} already contains {CONFIG_FILE_NAME}",
            project_dir.display()
        );
    }

    let project_name = project_dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("blinky");

    if !global.quiet {
        eprintln!("  Creating new iceflow project `{project_name}`");
    }

    for dir in ["src", "constraints"] {
        fs::create_dir_all(project_dir.join(dir))?;
    }
    write_config(&project_dir, project_name, &device)?;
    write_top_file(&project_dir)?;

    if !global.quiet {
        eprintln!(
            "     Created {}",
            project_dir.join(CONFIG_FILE_NAME).display()
        );
        eprintln!(
            "     Created {}",
            project_dir.join("src").join("top.v").display()
        );
    }
    Ok(0)
}

/// Writes `iceflow.toml`. Pin numbers are those of the iCEstick.
fn write_config(root: &Path, name: &str, device: &DeviceDescriptor) -> io::Result<()> {
    let content = format!(
        r#"[project]
name = "{name}"
top = "src/top.v"

[pins.clk]
pin = "21"

[pins.led]
pin = "99"

[clocks.sys]
port = "clk"
frequency = "12MHz"

[targets.default]
device = "{device}"
"#
    );
    fs::write(root.join(CONFIG_FILE_NAME), content)
}

/// Writes a template top module.
fn write_top_file(root: &Path) -> io::Result<()> {
    let content = r#"module top (
    input  clk,
    output led
);

    reg [23:0] counter = 0;

    always @(posedge clk)
        counter <= counter + 1;

    assign led = counter[23];

endmodule
"#;
    fs::write(root.join("src").join("top.v"), content)
}
