//! HDL source files handed to the synthesizer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// HDL language of a source file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLanguage {
    /// Verilog-2005 (`.v`).
    Verilog,
    /// SystemVerilog (`.sv`).
    SystemVerilog,
    /// VHDL (`.vhd`, `.vhdl`).
    Vhdl,
}

impl SourceLanguage {
    /// Returns the tag used to build the `read_<tag>` synthesis command.
    pub fn tag(self) -> &'static str {
        match self {
            SourceLanguage::Verilog => "verilog",
            SourceLanguage::SystemVerilog => "systemverilog",
            SourceLanguage::Vhdl => "vhdl",
        }
    }

    /// Detects the language from a file's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "v" => Some(SourceLanguage::Verilog),
            "sv" => Some(SourceLanguage::SystemVerilog),
            "vhd" | "vhdl" => Some(SourceLanguage::Vhdl),
            _ => None,
        }
    }
}

impl fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A source file with its language and logical library.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path as it should appear in the synthesis script.
    pub path: String,
    /// Language of the file.
    pub language: SourceLanguage,
    /// Logical library name. Yosys has no library concept, so this is
    /// carried for the front end only.
    pub library: String,
}

impl SourceFile {
    /// Creates a source in the default `work` library.
    pub fn new(path: impl Into<String>, language: SourceLanguage) -> Self {
        Self {
            path: path.into(),
            language,
            library: "work".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_language() {
        assert_eq!(
            SourceLanguage::from_path(Path::new("top.v")),
            Some(SourceLanguage::Verilog)
        );
        assert_eq!(
            SourceLanguage::from_path(Path::new("a/b.sv")),
            Some(SourceLanguage::SystemVerilog)
        );
        assert_eq!(
            SourceLanguage::from_path(Path::new("c.vhdl")),
            Some(SourceLanguage::Vhdl)
        );
        assert_eq!(SourceLanguage::from_path(Path::new("notes.txt")), None);
        assert_eq!(SourceLanguage::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn default_library() {
        let src = SourceFile::new("top.v", SourceLanguage::Verilog);
        assert_eq!(src.library, "work");
        assert_eq!(src.language.tag(), "verilog");
    }

    #[test]
    fn serde_uses_lowercase_language_names() {
        let src = SourceFile::new("core.sv", SourceLanguage::SystemVerilog);
        let json = serde_json::to_string(&src).unwrap();
        assert!(json.contains("\"language\":\"systemverilog\""));
        let back: SourceFile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, src);
    }
}
