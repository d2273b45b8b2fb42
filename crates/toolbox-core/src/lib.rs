//! Core orchestration for entering toolbox containers.
//!
//! This crate ties together identity resolution, container engine calls and
//! host integration into the `Entry` flow: resolve which container to use,
//! reconcile that against what exists (create, substitute or fail), start it,
//! wait for its init process to report readiness, make sure the requested
//! command exists, build the interactive exec invocation, and classify the
//! exit code of the wrapped process.

pub mod command;
pub mod concurrency;
pub mod config;
pub mod entry;
pub mod invocation;
pub mod outcome;
pub mod policy;
pub mod readiness;
pub mod resolve;

#[cfg(test)]
mod test_support;

pub use concurrency::{install_signal_handler, shutdown_requested};
pub use config::{EntryConfig, EntryContext};
pub use entry::{Entry, EntryReport, EntryRequest, Interaction};
pub use invocation::{ExecParams, ExecSpec, DETACH_KEYS_MIN_VERSION};
pub use outcome::{classify, Outcome};
pub use policy::{PolicyMode, Resolution};
pub use readiness::{readiness_marker, ReadinessWaiter, ENTRY_POINT_SENTINEL};
pub use resolve::{resolve_identity, IdentityRequest, ResolvedIdentity};

use std::path::PathBuf;
use thiserror::Error;
use toolbox_schema::CONTAINER_NAME_PATTERN;

/// Name of the executable, as shown in usage hints.
pub const EXECUTABLE: &str = "toolbox";

#[derive(Debug, Error)]
pub enum EntryError {
    #[error(
        "invalid argument for '{arg}'\nContainer names must match '{pattern}'\nRun '{exe} --help' for usage.",
        pattern = CONTAINER_NAME_PATTERN,
        exe = EXECUTABLE
    )]
    InvalidContainerName { arg: String, name: String },
    #[error(
        "invalid argument for '--release': {reason}\nRun '{exe} --help' for usage.",
        exe = EXECUTABLE
    )]
    InvalidRelease { release: String, reason: String },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("failed to get the current user's default shell")]
    MissingShell,
    #[error(
        "container {container} not found\n{hint}\nRun '{exe} --help' for usage.",
        exe = EXECUTABLE
    )]
    ContainerNotFound { container: String, hint: String },
    #[error(
        "container {0} is too old and no longer supported\nRecreate it with a newer version of {exe}.",
        exe = EXECUTABLE
    )]
    UnsupportedContainer(String),
    #[error("invalid entry point PID of container {0}")]
    InvalidEntryPoint(String),
    #[error("failed to initialize container {0}")]
    InitializationTimeout(String),
    #[error("interrupted while waiting for container {0} to initialize")]
    Cancelled(String),
    #[error("command {command} not found in container {container}")]
    CommandNotFound { command: String, container: String },
    #[error("directory {} not found in container {container}", path.display())]
    PathNotFoundInContainer { path: PathBuf, container: String },
    #[error("failed to invoke the container engine's exec in container {0}")]
    EngineInvocationFailed(String),
    #[error("failed to invoke command {command} in container {container}")]
    CommandInvocationFailed { command: String, container: String },
    #[error("engine error: {0}")]
    Engine(#[from] toolbox_runtime::EngineError),
}

impl EntryError {
    /// Errors caused by malformed user input rather than system state.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidContainerName { .. } | Self::InvalidRelease { .. }
        )
    }
}
