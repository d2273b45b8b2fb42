use crate::engine::{ContainerEngine, ContainerSummary, CreateSpec, EntryPoint, ExecStatus};
use crate::version::version_at_least;
use crate::EngineError;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use toolbox_schema::ContainerName;

const MOCK_PID_BASE: i64 = 4200;

#[derive(Debug, Clone)]
struct MockContainer {
    name: String,
    image: String,
    running: bool,
    entry_point: String,
    pid: i64,
}

#[derive(Debug)]
struct MockState {
    containers: Vec<MockContainer>,
    calls: Vec<String>,
    exec_args: Vec<Vec<String>>,
    exec_results: VecDeque<ExecStatus>,
    missing_commands: HashSet<String>,
    missing_paths: HashSet<PathBuf>,
    version: String,
    runtime_dir: Option<PathBuf>,
    fail_list: bool,
}

/// In-memory container engine.
///
/// Records every call, and when given a runtime directory plays the part of
/// the container's init process by dropping the readiness stamp on `start`.
pub struct MockEngine {
    state: Mutex<MockState>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self {
            state: Mutex::new(MockState {
                containers: Vec::new(),
                calls: Vec::new(),
                exec_args: Vec::new(),
                exec_results: VecDeque::new(),
                missing_commands: HashSet::new(),
                missing_paths: HashSet::new(),
                version: "4.9.4".to_owned(),
                runtime_dir: None,
                fail_list: false,
            }),
        }
    }
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MockState>, EngineError> {
        self.state.lock().map_err(|e| EngineError::CommandFailed {
            command: "mock".to_owned(),
            detail: format!("mutex poisoned: {e}"),
        })
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Add a stopped toolbox container with a current entry point.
    #[must_use]
    pub fn with_container(self, name: &str) -> Self {
        self.with_entry_point(name, "toolbox")
    }

    /// Add a stopped container whose PID 1 is `entry_point`.
    #[must_use]
    pub fn with_entry_point(self, name: &str, entry_point: &str) -> Self {
        {
            let mut state = self.state();
            let pid = MOCK_PID_BASE + state.containers.len() as i64;
            state.containers.push(MockContainer {
                name: name.to_owned(),
                image: format!("mock/{name}:latest"),
                running: false,
                entry_point: entry_point.to_owned(),
                pid,
            });
        }
        self
    }

    /// Override the PID reported for a container's entry point.
    #[must_use]
    pub fn with_pid(self, name: &str, pid: i64) -> Self {
        if let Some(c) = self.state().containers.iter_mut().find(|c| c.name == name) {
            c.pid = pid;
        }
        self
    }

    /// Drop readiness stamps into `dir` whenever a container starts.
    #[must_use]
    pub fn with_runtime_dir(self, dir: impl Into<PathBuf>) -> Self {
        self.state().runtime_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_version(self, version: &str) -> Self {
        self.state().version = version.to_owned();
        self
    }

    #[must_use]
    pub fn without_command(self, command: &str) -> Self {
        self.state().missing_commands.insert(command.to_owned());
        self
    }

    #[must_use]
    pub fn without_path(self, path: impl Into<PathBuf>) -> Self {
        self.state().missing_paths.insert(path.into());
        self
    }

    /// Queue the result of the next interactive exec. Defaults to exit 0.
    #[must_use]
    pub fn with_exec_result(self, status: ExecStatus) -> Self {
        self.state().exec_results.push_back(status);
        self
    }

    #[must_use]
    pub fn with_failing_list(self) -> Self {
        self.state().fail_list = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Number of recorded calls starting with `prefix`.
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn exec_args(&self) -> Vec<Vec<String>> {
        self.state().exec_args.clone()
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.state()
            .containers
            .iter()
            .any(|c| c.name == name && c.running)
    }

    pub fn stamp_path(runtime_dir: &Path, pid: i64) -> PathBuf {
        runtime_dir.join(format!("container-initialized-{pid}"))
    }
}

impl ContainerEngine for MockEngine {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn container_exists(&self, container: &str) -> Result<bool, EngineError> {
        let mut state = self.lock()?;
        state.calls.push(format!("exists {container}"));
        Ok(state.containers.iter().any(|c| c.name == container))
    }

    fn list_containers(&self) -> Result<Vec<ContainerSummary>, EngineError> {
        let mut state = self.lock()?;
        state.calls.push("list".to_owned());
        if state.fail_list {
            return Err(EngineError::CommandFailed {
                command: "mock ps".to_owned(),
                detail: "listing disabled".to_owned(),
            });
        }
        Ok(state
            .containers
            .iter()
            .map(|c| ContainerSummary {
                name: ContainerName::new(c.name.clone()),
                image: c.image.clone(),
                status: if c.running { "running" } else { "exited" }.to_owned(),
            })
            .collect())
    }

    fn create(&self, spec: &CreateSpec) -> Result<(), EngineError> {
        let mut state = self.lock()?;
        let name = spec.identity.name.to_string();
        state.calls.push(format!("create {name} {}", spec.identity.image));
        if state.containers.iter().any(|c| c.name == name) {
            return Err(EngineError::CommandFailed {
                command: "mock create".to_owned(),
                detail: format!("container {name} already exists"),
            });
        }
        let pid = MOCK_PID_BASE + state.containers.len() as i64;
        state.containers.push(MockContainer {
            name,
            image: spec.identity.image.to_string(),
            running: false,
            entry_point: "toolbox".to_owned(),
            pid,
        });
        Ok(())
    }

    fn start(&self, container: &str) -> Result<(), EngineError> {
        let mut state = self.lock()?;
        state.calls.push(format!("start {container}"));
        let runtime_dir = state.runtime_dir.clone();
        let c = state
            .containers
            .iter_mut()
            .find(|c| c.name == container)
            .ok_or_else(|| EngineError::NoSuchContainer(container.to_owned()))?;
        c.running = true;
        if let Some(dir) = runtime_dir {
            std::fs::create_dir_all(&dir)?;
            std::fs::write(Self::stamp_path(&dir, c.pid), "")?;
        }
        Ok(())
    }

    fn entry_point(&self, container: &str) -> Result<EntryPoint, EngineError> {
        let mut state = self.lock()?;
        state.calls.push(format!("entry_point {container}"));
        state
            .containers
            .iter()
            .find(|c| c.name == container)
            .map(|c| EntryPoint {
                process_name: c.entry_point.clone(),
                pid: if c.running { c.pid } else { 0 },
            })
            .ok_or_else(|| EngineError::NoSuchContainer(container.to_owned()))
    }

    fn command_present(&self, container: &str, command: &str) -> Result<bool, EngineError> {
        let mut state = self.lock()?;
        state.calls.push(format!("command_present {container} {command}"));
        Ok(!state.missing_commands.contains(command))
    }

    fn path_present(&self, container: &str, path: &Path) -> Result<bool, EngineError> {
        let mut state = self.lock()?;
        state
            .calls
            .push(format!("path_present {container} {}", path.display()));
        Ok(!state.missing_paths.contains(path))
    }

    fn version_at_least(&self, minimum: &str) -> bool {
        let Ok(mut state) = self.lock() else {
            return false;
        };
        state.calls.push("version".to_owned());
        version_at_least(&state.version, minimum)
    }

    fn exec_interactive(&self, args: &[String]) -> Result<ExecStatus, EngineError> {
        let mut state = self.lock()?;
        state.calls.push("exec".to_owned());
        state.exec_args.push(args.to_vec());
        Ok(state
            .exec_results
            .pop_front()
            .unwrap_or_else(|| ExecStatus::exited(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolbox_schema::{ContainerIdentity, Distro, Release};

    fn create_spec(dir: &Path) -> CreateSpec {
        CreateSpec {
            identity: ContainerIdentity::for_release(Distro::Fedora, Release::new("40")),
            user: "tester".to_owned(),
            uid: 1000,
            home: dir.to_path_buf(),
            shell: "/bin/bash".to_owned(),
            runtime_dir: dir.join("toolbox"),
        }
    }

    #[test]
    fn mock_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let runtime_dir = dir.path().join("toolbox");
        let engine = MockEngine::new().with_runtime_dir(&runtime_dir);

        assert!(!engine.container_exists("fedora-toolbox-40").unwrap());
        engine.create(&create_spec(dir.path())).unwrap();
        assert!(engine.container_exists("fedora-toolbox-40").unwrap());
        assert!(engine.create(&create_spec(dir.path())).is_err());

        let stopped = engine.entry_point("fedora-toolbox-40").unwrap();
        assert_eq!(stopped.pid, 0);

        engine.start("fedora-toolbox-40").unwrap();
        assert!(engine.is_running("fedora-toolbox-40"));
        let ep = engine.entry_point("fedora-toolbox-40").unwrap();
        assert_eq!(ep.process_name, "toolbox");
        assert!(MockEngine::stamp_path(&runtime_dir, ep.pid).exists());
    }

    #[test]
    fn mock_lists_in_insertion_order() {
        let engine = MockEngine::new().with_container("a").with_container("b");
        let names: Vec<String> = engine
            .list_containers()
            .unwrap()
            .into_iter()
            .map(|c| c.name.into_inner())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn mock_exec_results_are_queued() {
        let engine = MockEngine::new().with_exec_result(ExecStatus::exited(127));
        assert_eq!(engine.exec_interactive(&[]).unwrap().code, 127);
        assert_eq!(engine.exec_interactive(&[]).unwrap().code, 0);
        assert_eq!(engine.count_calls("exec"), 2);
    }

    #[test]
    fn mock_probes() {
        let engine = MockEngine::new()
            .with_container("dev")
            .without_command("zsh")
            .without_path("/srv/missing");
        assert!(!engine.command_present("dev", "zsh").unwrap());
        assert!(engine.command_present("dev", "bash").unwrap());
        assert!(!engine.path_present("dev", Path::new("/srv/missing")).unwrap());
        assert!(engine.path_present("dev", Path::new("/home")).unwrap());
    }

    #[test]
    fn mock_version_gate() {
        assert!(MockEngine::new().version_at_least("1.8.1"));
        assert!(!MockEngine::new().with_version("1.6.2").version_at_least("1.8.1"));
    }
}
