//! Board programmers for finished bitstreams.
//!
//! A programmer either loads a bitstream straight into the FPGA's
//! configuration memory (lost on power cycle) or writes it to the board's
//! SPI flash at some address.

use std::path::Path;
use std::process::Command;

use crate::error::ProgrammerError;

/// Flash address TinyFPGA B-series boards boot user designs from.
pub const TINYFPGA_B_USER_ADDRESS: u32 = 0x30000;

/// A tool that transfers a bitstream to a board.
pub trait Programmer {
    /// Short name used in messages.
    fn name(&self) -> &'static str;

    /// Returns the argv that loads `bitstream` into configuration memory.
    fn load_command(&self, bitstream: &Path) -> Result<Vec<String>, ProgrammerError>;

    /// Returns the argv that writes `bitstream` to flash at `address`.
    fn flash_command(&self, address: u32, bitstream: &Path)
        -> Result<Vec<String>, ProgrammerError>;

    /// Loads `bitstream` into configuration memory.
    fn load_bitstream(&self, bitstream: &Path) -> Result<(), ProgrammerError> {
        invoke(self.name(), &self.load_command(bitstream)?)
    }

    /// Writes `bitstream` to flash at `address`.
    fn flash(&self, address: u32, bitstream: &Path) -> Result<(), ProgrammerError> {
        invoke(self.name(), &self.flash_command(address, bitstream)?)
    }
}

fn invoke(programmer: &'static str, argv: &[String]) -> Result<(), ProgrammerError> {
    let Some((tool, args)) = argv.split_first() else {
        return Err(ProgrammerError::EmptyCommand { programmer });
    };
    log::info!("running {}", argv.join(" "));
    let status = Command::new(tool)
        .args(args)
        .status()
        .map_err(|source| ProgrammerError::Spawn {
            tool: tool.clone(),
            source,
        })?;
    if status.success() {
        Ok(())
    } else {
        Err(ProgrammerError::Failed {
            tool: tool.clone(),
            code: status.code().unwrap_or(-1),
        })
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

/// `iceprog`, for FTDI-based boards such as the iCEstick.
#[derive(Debug, Clone, Default)]
pub struct IceStormProgrammer;

impl Programmer for IceStormProgrammer {
    fn name(&self) -> &'static str {
        "iceprog"
    }

    fn load_command(&self, bitstream: &Path) -> Result<Vec<String>, ProgrammerError> {
        Ok(vec!["iceprog".into(), "-S".into(), path_arg(bitstream)])
    }

    fn flash_command(
        &self,
        address: u32,
        bitstream: &Path,
    ) -> Result<Vec<String>, ProgrammerError> {
        Ok(vec![
            "iceprog".into(),
            "-o".into(),
            address.to_string(),
            path_arg(bitstream),
        ])
    }
}

/// `iCEburn`, for the iCE40-HX8K breakout and similar boards.
#[derive(Debug, Clone)]
pub struct IceBurnProgrammer {
    iceburn: String,
}

impl IceBurnProgrammer {
    /// Creates a programmer running the `iCEburn` script at `iceburn`.
    pub fn new(iceburn: impl Into<String>) -> Self {
        Self {
            iceburn: iceburn.into(),
        }
    }
}

impl Programmer for IceBurnProgrammer {
    fn name(&self) -> &'static str {
        "iceburn"
    }

    fn load_command(&self, bitstream: &Path) -> Result<Vec<String>, ProgrammerError> {
        Ok(vec![self.iceburn.clone(), "-evw".into(), path_arg(bitstream)])
    }

    fn flash_command(
        &self,
        _address: u32,
        _bitstream: &Path,
    ) -> Result<Vec<String>, ProgrammerError> {
        Err(ProgrammerError::Unsupported {
            programmer: self.name(),
            operation: "flash",
        })
    }
}

/// `tinyfpgab`, for TinyFPGA B-series boards. Flash only.
#[derive(Debug, Clone, Default)]
pub struct TinyFpgaBProgrammer;

impl Programmer for TinyFpgaBProgrammer {
    fn name(&self) -> &'static str {
        "tinyfpgab"
    }

    fn load_command(&self, _bitstream: &Path) -> Result<Vec<String>, ProgrammerError> {
        Err(ProgrammerError::Unsupported {
            programmer: self.name(),
            operation: "load",
        })
    }

    fn flash_command(
        &self,
        address: u32,
        bitstream: &Path,
    ) -> Result<Vec<String>, ProgrammerError> {
        Ok(vec![
            "tinyfpgab".into(),
            "-a".into(),
            address.to_string(),
            "-p".into(),
            path_arg(bitstream),
        ])
    }
}
