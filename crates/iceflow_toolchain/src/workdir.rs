//! Scoped change of the process working directory.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Enters a directory and returns to the previous one when dropped.
///
/// The working directory is process-wide: two guards alive on different
/// threads interfere with each other.
#[derive(Debug)]
pub struct WorkdirGuard {
    previous: PathBuf,
    current: PathBuf,
}

impl WorkdirGuard {
    /// Creates `dir` if needed and makes it the working directory.
    pub fn enter(dir: &Path) -> io::Result<Self> {
        let previous = env::current_dir()?;
        fs::create_dir_all(dir)?;
        let current = previous.join(dir);
        env::set_current_dir(&current)?;
        log::debug!("entered {}", current.display());
        Ok(Self { previous, current })
    }

    /// Returns the absolute path of the entered directory.
    pub fn path(&self) -> &Path {
        &self.current
    }

    /// Returns the directory that will be restored.
    pub fn previous(&self) -> &Path {
        &self.previous
    }
}

impl Drop for WorkdirGuard {
    fn drop(&mut self) {
        if let Err(e) = env::set_current_dir(&self.previous) {
            log::warn!(
                "could not restore working directory {}: {e}",
                self.previous.display()
            );
        } else {
            log::debug!("returned to {}", self.previous.display());
        }
    }
}

/// Serializes tests that change the working directory.
#[cfg(test)]
pub(crate) static CWD_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;

    fn lock() -> std::sync::MutexGuard<'static, ()> {
        CWD_LOCK.lock().unwrap_or_else(|p| p.into_inner())
    }

    #[test]
    fn enter_and_restore() {
        let _lock = lock();
        let tmp = tempfile::tempdir().unwrap();
        let before = env::current_dir().unwrap();
        let target = tmp.path().join("build");
        {
            let guard = WorkdirGuard::enter(&target).unwrap();
            assert!(target.is_dir());
            assert_eq!(
                env::current_dir().unwrap().canonicalize().unwrap(),
                target.canonicalize().unwrap()
            );
            assert_eq!(guard.previous(), before.as_path());
        }
        assert_eq!(env::current_dir().unwrap(), before);
    }

    #[test]
    fn existing_directory_is_reused() {
        let _lock = lock();
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("build");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("keep.txt"), "x").unwrap();
        {
            let _guard = WorkdirGuard::enter(&target).unwrap();
            assert!(Path::new("keep.txt").exists());
        }
    }

    #[test]
    fn restored_on_early_return() {
        let _lock = lock();
        let tmp = tempfile::tempdir().unwrap();
        let before = env::current_dir().unwrap();

        fn fails_inside(dir: &Path) -> io::Result<()> {
            let _guard = WorkdirGuard::enter(dir)?;
            Err(io::Error::other("tool failed"))
        }

        assert!(fails_inside(&tmp.path().join("b")).is_err());
        assert_eq!(env::current_dir().unwrap(), before);
    }

    #[test]
    fn absolute_path_of_relative_dir() {
        let _lock = lock();
        let tmp = tempfile::tempdir().unwrap();
        let before = env::current_dir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        let result = std::panic::catch_unwind(|| {
            let guard = WorkdirGuard::enter(Path::new("out")).unwrap();
            guard.path().is_absolute() && guard.path().ends_with("out")
        });
        env::set_current_dir(before).unwrap();
        assert!(result.unwrap());
    }
}
