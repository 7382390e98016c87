//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::path::Path;

/// Name of the project configuration file.
pub const CONFIG_FILE_NAME: &str = "iceflow.toml";

/// Loads and validates an `iceflow.toml` configuration from a project directory.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE_NAME);
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates an `iceflow.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and configuration values are consistent.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    if config.project.top.is_empty() {
        return Err(ConfigError::MissingField("project.top".to_string()));
    }
    if config.project.build_name.is_empty() {
        return Err(ConfigError::MissingField("project.build_name".to_string()));
    }

    for (name, binding) in &config.pins {
        if binding.pin.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "pin list for '{name}' is empty"
            )));
        }
    }
    for (target_name, target) in &config.targets {
        if target.device.is_empty() {
            return Err(ConfigError::MissingField(format!(
                "targets.{target_name}.device"
            )));
        }
        for (name, binding) in &target.pins {
            if binding.pin.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "pin list for '{name}' in target '{target_name}' is empty"
                )));
            }
        }
    }

    for (key, clock) in &config.clocks {
        clock.period_ns(key)?;
    }
    Ok(())
}
