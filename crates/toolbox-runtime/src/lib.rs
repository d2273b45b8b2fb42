//! Container engine backends and host integration for toolbox.
//!
//! This crate implements the execution layer: the `ContainerEngine` trait with
//! a podman backend (subprocess calls to the engine binary) and an in-memory
//! mock, host discovery (current user, runtime directory, preserved session
//! variables, inside-container detection), engine version comparison,
//! prerequisite checking, and the terminal escape sequences that tell
//! container-aware terminals which container a session runs in.

pub mod engine;
pub mod host;
pub mod mock;
pub mod podman;
pub mod prereq;
pub mod terminal;
pub mod version;

pub use engine::{ContainerEngine, ContainerSummary, CreateSpec, EntryPoint, ExecStatus};
pub use host::{HostUser, PRESERVED_ENV_VARS};
pub use mock::MockEngine;
pub use podman::PodmanEngine;
pub use prereq::{check_engine_prereqs, format_missing, MissingPrereq};
pub use terminal::ContainerContextGuard;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("'{command}' failed: {detail}")]
    CommandFailed { command: String, detail: String },
    #[error("failed to parse {what}: {detail}")]
    Parse { what: String, detail: String },
    #[error("container {0} not found")]
    NoSuchContainer(String),
}
