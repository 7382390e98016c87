//! Target resolution: merging global and target-specific configurations.

use crate::error::ConfigError;
use crate::types::{ConstraintConfig, PinBinding, ProjectConfig};
use std::collections::BTreeMap;

/// A fully resolved target configuration with global and target-specific settings merged.
///
/// Global pin bindings serve as the base, and target-specific pins overlay on top.
/// Target-specific constraints override global constraints entirely.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    /// The target name.
    pub name: String,
    /// The device string, still unparsed.
    pub device: String,
    /// Merged pin bindings (global base + target overlay).
    pub pins: BTreeMap<String, PinBinding>,
    /// Resolved constraint configuration (target overrides global).
    pub constraints: ConstraintConfig,
}

/// Resolves a named target by merging global settings with target-specific overrides.
pub fn resolve_target(
    config: &ProjectConfig,
    target_name: &str,
) -> Result<ResolvedTarget, ConfigError> {
    let target = config
        .targets
        .get(target_name)
        .ok_or_else(|| ConfigError::UnknownTarget(target_name.to_string()))?;

    let mut pins = config.pins.clone();
    for (name, binding) in &target.pins {
        pins.insert(name.clone(), binding.clone());
    }

    let constraints = target
        .constraints
        .clone()
        .unwrap_or_else(|| config.constraints.clone());

    Ok(ResolvedTarget {
        name: target_name.to_string(),
        device: target.device.clone(),
        pins,
        constraints,
    })
}

/// Picks the target to build: the requested one, or the only one defined.
pub fn select_target<'a>(
    config: &'a ProjectConfig,
    requested: Option<&'a str>,
) -> Result<&'a str, ConfigError> {
    if let Some(name) = requested {
        return if config.targets.contains_key(name) {
            Ok(name)
        } else {
            Err(ConfigError::UnknownTarget(name.to_string()))
        };
    }

    let mut names = config.targets.keys();
    match (names.next(), names.next()) {
        (Some(only), None) => Ok(only.as_str()),
        (None, _) => Err(ConfigError::MissingField("targets".to_string())),
        (Some(_), Some(_)) => {
            let all: Vec<&str> = config.targets.keys().map(String::as_str).collect();
            Err(ConfigError::ValidationError(format!(
                "multiple targets defined ({}); pick one with --target",
                all.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    const TWO_BOARDS: &str = r#"
[project]
name = "test"
top = "top.v"

[pins.clk]
pin = "21"

[pins.led]
pin = "99"

[constraints]
commands = ["set_io global 1"]

[targets.icestick]
device = "ice40-hx1k-tq144"

[targets.icestick.pins.led]
pin = "95"

[targets.hx8k]
device = "ice40-hx8k-ct256"

[targets.hx8k.pins.button]
pin = "B1"

[targets.hx8k.constraints]
commands = ["set_io board 2"]
"#;

    #[test]
    fn resolve_basic_target() {
        let config = load_config_from_str(TWO_BOARDS).unwrap();
        let resolved = resolve_target(&config, "icestick").unwrap();
        assert_eq!(resolved.name, "icestick");
        assert_eq!(resolved.device, "ice40-hx1k-tq144");
    }

    #[test]
    fn unknown_target_errors() {
        let config = load_config_from_str(TWO_BOARDS).unwrap();
        let err = resolve_target(&config, "upduino").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownTarget(_)));
    }

    #[test]
    fn pin_merging() {
        let config = load_config_from_str(TWO_BOARDS).unwrap();
        let resolved = resolve_target(&config, "icestick").unwrap();
        assert_eq!(resolved.pins.len(), 2);
        assert_eq!(resolved.pins["clk"].pin, vec!["21"]);
        assert_eq!(resolved.pins["led"].pin, vec!["95"]);

        let resolved = resolve_target(&config, "hx8k").unwrap();
        assert_eq!(resolved.pins.len(), 3);
        assert_eq!(resolved.pins["led"].pin, vec!["99"]);
        assert_eq!(resolved.pins["button"].pin, vec!["B1"]);
    }

    #[test]
    fn constraint_override() {
        let config = load_config_from_str(TWO_BOARDS).unwrap();
        let global = resolve_target(&config, "icestick").unwrap();
        assert_eq!(global.constraints.commands, vec!["set_io global 1"]);
        let replaced = resolve_target(&config, "hx8k").unwrap();
        assert_eq!(replaced.constraints.commands, vec!["set_io board 2"]);
    }

    #[test]
    fn select_requested_target() {
        let config = load_config_from_str(TWO_BOARDS).unwrap();
        assert_eq!(select_target(&config, Some("hx8k")).unwrap(), "hx8k");
        assert!(matches!(
            select_target(&config, Some("nope")),
            Err(ConfigError::UnknownTarget(_))
        ));
    }

    #[test]
    fn select_requires_choice_among_many() {
        let config = load_config_from_str(TWO_BOARDS).unwrap();
        let err = select_target(&config, None).unwrap_err();
        assert!(format!("{err}").contains("hx8k, icestick"));
    }

    #[test]
    fn select_single_target_automatically() {
        let toml = r#"
[project]
name = "test"
top = "top.v"

[targets.only]
device = "ice40-lp1k-cm36"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(select_target(&config, None).unwrap(), "only");
    }

    #[test]
    fn select_without_targets_errors() {
        let toml = "[project]\nname = \"t\"\ntop = \"top.v\"\n";
        let config = load_config_from_str(toml).unwrap();
        assert!(matches!(
            select_target(&config, None),
            Err(ConfigError::MissingField(_))
        ));
    }
}
