use crate::EntryError;
use std::path::Path;
use toolbox_runtime::ExecStatus;

/// Exit status the engine uses when `exec` itself could not run.
pub const EXIT_ENGINE_FAILED: i32 = 125;
/// Exit status for a command that exists but could not be invoked.
pub const EXIT_NOT_INVOKABLE: i32 = 126;
/// Exit status for a command, or working directory, that does not exist.
pub const EXIT_NOT_FOUND: i32 = 127;

/// What the exit status of an interactive exec means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    EngineInvocationFailed,
    CommandInvocationFailed,
    CommandNotFound,
    PathNotFoundInContainer,
    /// The command ran and exited with this status of its own.
    ApplicationExit(i32),
}

/// Classify an exec status.
///
/// `workdir_present` is only consulted for 127, which the engine reports both
/// for a missing command and for a missing working directory.
///
/// # Panics
///
/// Panics when the status is 0 but the runner also reported an error. The two
/// signals must never disagree.
pub fn classify(status: &ExecStatus, workdir_present: impl FnOnce() -> bool) -> Outcome {
    match status.code {
        0 => {
            assert!(
                status.error.is_none(),
                "exec exited with status 0 but reported an error: {:?}",
                status.error
            );
            Outcome::Success
        }
        EXIT_ENGINE_FAILED => Outcome::EngineInvocationFailed,
        EXIT_NOT_INVOKABLE => Outcome::CommandInvocationFailed,
        EXIT_NOT_FOUND => {
            if workdir_present() {
                Outcome::CommandNotFound
            } else {
                Outcome::PathNotFoundInContainer
            }
        }
        code => Outcome::ApplicationExit(code),
    }
}

impl Outcome {
    /// The exit code to forward, or the error this outcome stands for.
    pub fn into_result(self, container: &str, command: &str, workdir: &Path) -> Result<i32, EntryError> {
        match self {
            Self::Success => Ok(0),
            Self::ApplicationExit(code) => Ok(code),
            Self::EngineInvocationFailed => {
                Err(EntryError::EngineInvocationFailed(container.to_owned()))
            }
            Self::CommandInvocationFailed => Err(EntryError::CommandInvocationFailed {
                command: command.to_owned(),
                container: container.to_owned(),
            }),
            Self::CommandNotFound => Err(EntryError::CommandNotFound {
                command: command.to_owned(),
                container: container.to_owned(),
            }),
            Self::PathNotFoundInContainer => Err(EntryError::PathNotFoundInContainer {
                path: workdir.to_path_buf(),
                container: container.to_owned(),
            }),
        }
    }
}
