//! `iceflow program`: load or flash a bitstream.

use std::path::PathBuf;

use anyhow::{Context, Result};
use iceflow_toolchain::{
    IceBurnProgrammer, IceStormProgrammer, Programmer, TinyFpgaBProgrammer, Toolchain,
    TINYFPGA_B_USER_ADDRESS,
};

use crate::pipeline::resolve_project_root;
use crate::{GlobalArgs, ProgramArgs, ProgrammerKind};

/// Parses a flash address: decimal, or hexadecimal with a `0x` prefix.
pub fn parse_address(text: &str) -> Result<u32> {
    let text = text.trim();
    let parsed = match text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.with_context(|| format!("invalid flash address '{text}'"))
}

fn programmer(args: &ProgramArgs) -> Box<dyn Programmer> {
    match args.programmer {
        ProgrammerKind::Iceprog => Box::new(IceStormProgrammer),
        ProgrammerKind::Iceburn => Box::new(IceBurnProgrammer::new(args.iceburn_path.clone())),
        ProgrammerKind::Tinyfpgab => Box::new(TinyFpgaBProgrammer),
    }
}

/// Returns the flash address to use, if the bitstream should be flashed.
///
/// TinyFPGA B boards can only be flashed, so they default to the user image
/// address.
fn flash_address(args: &ProgramArgs) -> Result<Option<u32>> {
    match (&args.flash, args.programmer) {
        (Some(addr), _) => parse_address(addr).map(Some),
        (None, ProgrammerKind::Tinyfpgab) => Ok(Some(TINYFPGA_B_USER_ADDRESS)),
        (None, _) => Ok(None),
    }
}

fn default_bitstream(global: &GlobalArgs) -> Result<PathBuf> {
    let project_dir = resolve_project_root(global)?;
    let config = iceflow_config::load_config(&project_dir)?;
    Ok(project_dir
        .join(&config.project.build_dir)
        .join(format!(
            "{}{}",
            config.project.build_name,
            Toolchain::BITSTREAM_EXTENSION
        )))
}

/// Runs the `iceflow program` command.
pub fn run(args: &ProgramArgs, global: &GlobalArgs) -> Result<i32> {
    let bitstream = match &args.bitstream {
        Some(path) => PathBuf::from(path),
        None => default_bitstream(global)?,
    };
    let programmer = programmer(args);
    let address = flash_address(args)?;

    if !global.quiet {
        match address {
            Some(addr) => eprintln!(
                "  Flashing {} at {addr:#x} ({})",
                bitstream.display(),
                programmer.name()
            ),
            None => eprintln!(
                "   Loading {} ({})",
                bitstream.display(),
                programmer.name()
            ),
        }
    }

    match address {
        Some(addr) => programmer.flash(addr, &bitstream)?,
        None => programmer.load_bitstream(&bitstream)?,
    }
    Ok(0)
}
