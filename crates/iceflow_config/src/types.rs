//! Configuration types deserialized from `iceflow.toml`.

use iceflow_common::Frequency;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

use crate::error::ConfigError;

/// The top-level project configuration parsed from `iceflow.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Core project metadata.
    pub project: ProjectMeta,
    /// Additional sources and include paths.
    #[serde(default)]
    pub sources: SourcesConfig,
    /// Global signal-to-pin bindings shared across all targets.
    #[serde(default)]
    pub pins: BTreeMap<String, PinBinding>,
    /// Named clock period constraints.
    #[serde(default)]
    pub clocks: BTreeMap<String, ClockDef>,
    /// Global raw placement constraints.
    #[serde(default)]
    pub constraints: ConstraintConfig,
    /// Synthesis command hooks.
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    /// External tool names and options.
    #[serde(default)]
    pub toolchain: ToolchainConfig,
    /// Named hardware targets (e.g. "icestick", "tinyfpga_b2").
    #[serde(default)]
    pub targets: BTreeMap<String, TargetConfig>,
}

/// Core project metadata required in every `iceflow.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// Path to the flat top-level Verilog file.
    pub top: String,
    /// Base name of every generated artifact.
    #[serde(default = "default_build_name")]
    pub build_name: String,
    /// Directory the build runs in, relative to the project root.
    #[serde(default = "default_build_dir")]
    pub build_dir: String,
}

fn default_build_name() -> String {
    "top".to_string()
}

fn default_build_dir() -> String {
    "build".to_string()
}

/// Extra HDL sources read alongside the top file.
#[derive(Debug, Default, Deserialize)]
pub struct SourcesConfig {
    /// Source file paths; the language is taken from the extension.
    #[serde(default)]
    pub files: Vec<String>,
    /// Include search paths.
    #[serde(default)]
    pub include: Vec<String>,
}

/// A top-level signal bound to one or more package pins.
#[derive(Debug, Clone, Deserialize)]
pub struct PinBinding {
    /// Pins in bit order. Accepts `pin = "99"` or `pins = ["1", "2"]`.
    #[serde(alias = "pins", deserialize_with = "deserialize_string_or_vec")]
    pub pin: Vec<String>,
    /// Signal name in the design; defaults to the table key.
    #[serde(default)]
    pub signal: Option<String>,
    /// I/O standard, kept as an electrical attribute of the binding.
    #[serde(default)]
    pub io_standard: Option<String>,
    /// Abstract synthesis attributes (`keep`, `async_reg`, ...).
    #[serde(default)]
    pub attributes: Vec<String>,
}

/// A clock period requirement.
///
/// Exactly one of `period` (ns) and `frequency` must be given.
#[derive(Debug, Clone, Deserialize)]
pub struct ClockDef {
    /// The port the clock enters on; defaults to the table key.
    #[serde(default)]
    pub port: Option<String>,
    /// Required period in nanoseconds.
    #[serde(default)]
    pub period: Option<f64>,
    /// Required frequency (e.g. "12MHz").
    #[serde(default)]
    pub frequency: Option<String>,
}

impl ClockDef {
    /// Returns the clock identity: the port, or `key` when none is given.
    pub fn identity<'a>(&'a self, key: &'a str) -> &'a str {
        self.port.as_deref().unwrap_or(key)
    }

    /// Returns the required period in nanoseconds.
    pub fn period_ns(&self, key: &str) -> Result<f64, ConfigError> {
        let period = match (self.period, &self.frequency) {
            (Some(period), None) => period,
            (None, Some(freq)) => {
                let freq: Frequency = freq.parse().map_err(|e| {
                    ConfigError::ValidationError(format!("clocks.{key}.frequency: {e}"))
                })?;
                freq.period_ns()
            }
            (Some(_), Some(_)) => {
                return Err(ConfigError::ValidationError(format!(
                    "clocks.{key}: give either period or frequency, not both"
                )))
            }
            (None, None) => return Err(ConfigError::MissingField(format!("clocks.{key}.period"))),
        };
        if period.is_finite() && period > 0.0 {
            Ok(period)
        } else {
            Err(ConfigError::ValidationError(format!(
                "clocks.{key}: period must be positive, got {period}"
            )))
        }
    }
}

/// Raw place-and-route constraints appended to the generated PCF.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConstraintConfig {
    /// Inline constraint blocks.
    #[serde(default)]
    pub commands: Vec<String>,
    /// Files whose contents are appended as blocks.
    #[serde(default)]
    pub files: Vec<String>,
}

/// User commands inserted into the synthesis script.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SynthesisConfig {
    /// Commands run before synthesis.
    #[serde(default)]
    pub pre: Vec<String>,
    /// Replacement for the default synthesis command. Must still write
    /// `{build_name}.blif`.
    #[serde(default)]
    pub commands: Vec<String>,
    /// Commands run after synthesis.
    #[serde(default)]
    pub post: Vec<String>,
}

/// External tool executables and their extra options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Options passed to yosys.
    pub yosys_opt: String,
    /// Options passed to arachne-pnr before the derived ones.
    pub pnr_opt: String,
    /// Options passed to icetime before the derived ones.
    pub icetime_opt: String,
    /// Options passed to icepack.
    pub icepack_opt: String,
    /// yosys executable.
    pub yosys: String,
    /// arachne-pnr executable.
    pub arachne_pnr: String,
    /// icetime executable.
    pub icetime: String,
    /// icepack executable.
    pub icepack: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            yosys_opt: "-q".to_string(),
            pnr_opt: "-q".to_string(),
            icetime_opt: String::new(),
            icepack_opt: String::new(),
            yosys: "yosys".to_string(),
            arachne_pnr: "arachne-pnr".to_string(),
            icetime: "icetime".to_string(),
            icepack: "icepack".to_string(),
        }
    }
}

/// Configuration for a specific board.
#[derive(Debug, Deserialize)]
pub struct TargetConfig {
    /// Device string, `<family>-<size>-<package>` (e.g. "ice40-hx1k-tq144").
    pub device: String,
    /// Target-specific bindings that override/extend global pins.
    #[serde(default)]
    pub pins: BTreeMap<String, PinBinding>,
    /// Target-specific constraints; replace the global ones when present.
    #[serde(default)]
    pub constraints: Option<ConstraintConfig>,
}

/// Deserializes a field that can be either a single string or a list of strings.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}
