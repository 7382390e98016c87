//! File and process helpers used by the build.

use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;

use crate::script::TargetOs;

/// Line terminator used when writing text artifacts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineEnding {
    /// `\n`
    Lf,
    /// `\r\n`
    CrLf,
}

impl LineEnding {
    /// Returns the native line ending of `os`.
    pub fn for_os(os: TargetOs) -> Self {
        match os {
            TargetOs::Posix => LineEnding::Lf,
            TargetOs::Windows => LineEnding::CrLf,
        }
    }

    /// Rewrites `\n`-terminated text to this line ending.
    pub fn apply(self, content: &str) -> String {
        match self {
            LineEnding::Lf => content.to_string(),
            LineEnding::CrLf => content.replace("\r\n", "\n").replace('\n', "\r\n"),
        }
    }
}

/// Writes `content` to `path`, creating parent directories as needed.
pub fn write_to_file(path: &Path, content: &str, line_ending: LineEnding) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    log::debug!("writing {}", path.display());
    fs::write(path, line_ending.apply(content))
}

/// Runs `script` through `shell` and waits for it to finish.
///
/// `shell` is the interpreter argv, e.g. `["bash"]` or `["cmd", "/c"]`.
/// Returns the exit status, or `-1` if the process was terminated by a
/// signal.
pub fn run_script(shell: &[&str], script: &Path) -> io::Result<i32> {
    let (program, args) = shell
        .split_first()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty shell command"))?;

    log::info!("running {} {}", shell.join(" "), script.display());
    let status = Command::new(program).args(args).arg(script).status()?;
    Ok(status.code().unwrap_or(-1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_endings() {
        assert_eq!(LineEnding::Lf.apply("a\nb\n"), "a\nb\n");
        assert_eq!(LineEnding::CrLf.apply("a\nb\n"), "a\r\nb\r\n");
        assert_eq!(LineEnding::CrLf.apply("a\r\nb"), "a\r\nb");
        assert_eq!(LineEnding::for_os(TargetOs::Windows), LineEnding::CrLf);
        assert_eq!(LineEnding::for_os(TargetOs::Posix), LineEnding::Lf);
    }

    #[test]
    fn write_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/top.pcf");
        write_to_file(&path, "set_io led 99\n", LineEnding::Lf).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "set_io led 99\n");
    }

    #[test]
    fn write_with_crlf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build_top.bat");
        write_to_file(&path, "@echo off\n", LineEnding::CrLf).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"@echo off\r\n");
    }

    #[test]
    fn empty_shell_is_rejected() {
        let err = run_script(&[], Path::new("build_top.sh")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[cfg(unix)]
    #[test]
    fn script_exit_status_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let ok = dir.path().join("ok.sh");
        let bad = dir.path().join("bad.sh");
        fs::write(&ok, "exit 0\n").unwrap();
        fs::write(&bad, "exit 3\n").unwrap();
        assert_eq!(run_script(&["sh"], &ok).unwrap(), 0);
        assert_eq!(run_script(&["sh"], &bad).unwrap(), 3);
    }
}
