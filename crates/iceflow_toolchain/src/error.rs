//! Build and programming errors.

use std::path::PathBuf;

use iceflow_arch::DeviceError;
use iceflow_timing::ConstraintError;

/// Broad classification of a [`BuildError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The project or platform is misconfigured; detected before any tool runs.
    Configuration,
    /// An external tool in the build script exited with a failure status.
    ToolExecution,
    /// The build directory or an artifact could not be created or written.
    Io,
}

/// Errors that abort a build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The device string did not validate.
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// A timing constraint was rejected.
    #[error(transparent)]
    Constraint(#[from] ConstraintError),

    /// The platform could not lower the design.
    #[error("failed to lower design: {0}")]
    Lowering(String),

    /// The build script exited with a nonzero status.
    #[error("build script {} failed with exit status {code}", script.display())]
    ToolchainFailure {
        /// Path of the script that failed.
        script: PathBuf,
        /// Its exit status; `-1` when it was killed by a signal.
        code: i32,
    },

    /// A filesystem or process operation failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// The path being created, written, or executed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    /// Wraps an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns the broad kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BuildError::Device(_) | BuildError::Constraint(_) | BuildError::Lowering(_) => {
                ErrorKind::Configuration
            }
            BuildError::ToolchainFailure { .. } => ErrorKind::ToolExecution,
            BuildError::Io { .. } => ErrorKind::Io,
        }
    }
}

/// Errors raised while driving a board programmer.
#[derive(Debug, thiserror::Error)]
pub enum ProgrammerError {
    /// The programmer executable could not be started.
    #[error("failed to run {tool}: {source}")]
    Spawn {
        /// The executable.
        tool: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The programmer ran but reported failure.
    #[error("{tool} exited with status {code}")]
    Failed {
        /// The executable.
        tool: String,
        /// Its exit status; `-1` when it was killed by a signal.
        code: i32,
    },

    /// The programmer produced no command to run.
    #[error("{programmer} produced an empty command line")]
    EmptyCommand {
        /// The programmer name.
        programmer: &'static str,
    },

    /// The programmer cannot perform the requested operation.
    #[error("{programmer} does not support {operation}")]
    Unsupported {
        /// The programmer name.
        programmer: &'static str,
        /// The operation that was requested.
        operation: &'static str,
    },
}
