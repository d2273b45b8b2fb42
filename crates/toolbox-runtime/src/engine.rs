use crate::EngineError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use toolbox_schema::{ContainerIdentity, ContainerName};

/// One toolbox container as reported by the engine's listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContainerSummary {
    pub name: ContainerName,
    pub image: String,
    pub status: String,
}

/// The PID-1 process of a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub process_name: String,
    pub pid: i64,
}

/// How an interactive exec ended.
///
/// `error` carries the runner's own failure report. A zero `code` must never
/// come with an error; the exit code classifier treats that as a broken contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecStatus {
    pub code: i32,
    pub error: Option<String>,
}

impl ExecStatus {
    pub fn exited(code: i32) -> Self {
        Self {
            code,
            error: (code != 0).then(|| format!("exit status {code}")),
        }
    }
}

/// Everything the engine needs to create a toolbox container.
#[derive(Debug, Clone)]
pub struct CreateSpec {
    pub identity: ContainerIdentity,
    pub user: String,
    pub uid: u32,
    pub home: PathBuf,
    pub shell: String,
    pub runtime_dir: PathBuf,
}

pub trait ContainerEngine {
    fn name(&self) -> &str;

    fn container_exists(&self, container: &str) -> Result<bool, EngineError>;

    /// All toolbox containers, in the engine's order.
    fn list_containers(&self) -> Result<Vec<ContainerSummary>, EngineError>;

    /// Pull the image if needed and create the container.
    fn create(&self, spec: &CreateSpec) -> Result<(), EngineError>;

    fn start(&self, container: &str) -> Result<(), EngineError>;

    fn entry_point(&self, container: &str) -> Result<EntryPoint, EngineError>;

    /// Whether `command` resolves on the container's `PATH`.
    fn command_present(&self, container: &str, command: &str) -> Result<bool, EngineError>;

    fn path_present(&self, container: &str, path: &Path) -> Result<bool, EngineError>;

    /// Whether the engine version is at least `minimum`. Unknown versions
    /// compare as too old.
    fn version_at_least(&self, minimum: &str) -> bool;

    /// Run the engine with `args`, handing it this process's terminal.
    fn exec_interactive(&self, args: &[String]) -> Result<ExecStatus, EngineError>;
}
