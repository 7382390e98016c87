//! Shared helpers for CLI commands: project root resolution and
//! diagnostic output.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use iceflow_config::CONFIG_FILE_NAME;
use iceflow_diagnostics::{Diagnostic, DiagnosticRenderer, JsonRenderer, TerminalRenderer};

use crate::{GlobalArgs, MessageFormat};

/// Walks up from `start` looking for the nearest directory containing `iceflow.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE_NAME).exists() {
            return Ok(current);
        }
        if !current.pop() {
            bail!(
                "could not find {CONFIG_FILE_NAME} in {} or any parent directory",
                start.display()
            );
        }
    }
}

/// Resolves the project root directory from global CLI args.
///
/// If `--config` is specified, uses that path (file → parent dir, dir → itself).
/// Otherwise walks up from the current directory looking for `iceflow.toml`.
pub fn resolve_project_root(global: &GlobalArgs) -> Result<PathBuf> {
    let root = match &global.config {
        Some(config_path) => {
            let p = PathBuf::from(config_path);
            if p.is_file() {
                p.parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."))
            } else {
                p
            }
        }
        None => find_project_root(&std::env::current_dir()?)?,
    };
    // The build changes the working directory, so later paths must not
    // depend on it.
    Ok(std::path::absolute(&root)?)
}

/// Prints diagnostics: human format to stderr, JSON lines to stdout.
pub fn render_diagnostics(diagnostics: &[Diagnostic], format: MessageFormat, global: &GlobalArgs) {
    match format {
        MessageFormat::Human => {
            let renderer = TerminalRenderer::new(global.color);
            for diag in diagnostics {
                if global.quiet && !diag.severity.is_error() {
                    continue;
                }
                eprint!("{}", renderer.render(diag));
            }
        }
        MessageFormat::Json => {
            for diag in diagnostics {
                println!("{}", JsonRenderer.render(diag));
            }
        }
    }
}
