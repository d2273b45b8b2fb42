use crate::engine::{ContainerEngine, ContainerSummary, CreateSpec, EntryPoint, ExecStatus};
use crate::version::version_at_least;
use crate::EngineError;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use toolbox_schema::ContainerName;
use tracing::{debug, warn};

const TOOLBOX_LABELS: &[&str] = &[
    "com.github.containers.toolbox=true",
    "com.github.debarshiray.toolbox=true",
];

const MIGRATE_HINT: &str = "use system migrate to mitigate";

/// Container engine driven through the podman command line.
pub struct PodmanEngine {
    program: String,
    log_level: String,
}

impl Default for PodmanEngine {
    fn default() -> Self {
        Self::new("podman", "error")
    }
}

impl PodmanEngine {
    pub fn new(program: impl Into<String>, log_level: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            log_level: log_level.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["--log-level", &self.log_level]);
        cmd.stdin(Stdio::null());
        cmd
    }

    fn output(&self, args: &[&str]) -> Result<Output, EngineError> {
        debug!("running {} {}", self.program, args.join(" "));
        self.command()
            .args(args)
            .output()
            .map_err(|source| EngineError::Spawn {
                program: self.program.clone(),
                source,
            })
    }

    fn checked_output(&self, args: &[&str]) -> Result<Output, EngineError> {
        let output = self.output(args)?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(self.failure(args, &output))
        }
    }

    fn failure(&self, args: &[&str], output: &Output) -> EngineError {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = if stderr.trim().is_empty() {
            match output.status.code() {
                Some(code) => format!("exit status {code}"),
                None => "terminated by signal".to_owned(),
            }
        } else {
            stderr.trim().to_owned()
        };
        EngineError::CommandFailed {
            command: format!("{} {}", self.program, args.first().copied().unwrap_or("")),
            detail,
        }
    }

    fn run_in_container_as_root(
        &self,
        container: &str,
        script: &str,
        arg: &str,
    ) -> Result<bool, EngineError> {
        let output = self.output(&[
            "exec", "--user", "root", container, "sh", "-c", script, "sh", arg,
        ])?;
        Ok(output.status.success())
    }

    fn ensure_image(&self, image: &str) -> Result<(), EngineError> {
        let exists = self.output(&["image", "exists", image])?;
        if exists.status.success() {
            debug!("image {image} already present");
            return Ok(());
        }
        eprintln!("Pulling {image}...");
        let status = self
            .command()
            .args(["pull", image])
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| EngineError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(EngineError::CommandFailed {
                command: format!("{} pull", self.program),
                detail: format!("failed to pull image {image}"),
            })
        }
    }

    fn engine_version(&self) -> Result<String, EngineError> {
        let output = self.checked_output(&["version", "--format", "json"])?;
        parse_version_json(&output.stdout)
    }
}

impl ContainerEngine for PodmanEngine {
    fn name(&self) -> &'static str {
        "podman"
    }

    fn container_exists(&self, container: &str) -> Result<bool, EngineError> {
        let args = ["container", "exists", container];
        let output = self.output(&args)?;
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(self.failure(&args, &output)),
        }
    }

    fn list_containers(&self) -> Result<Vec<ContainerSummary>, EngineError> {
        let mut all: Vec<ContainerSummary> = Vec::new();
        for label in TOOLBOX_LABELS {
            let filter = format!("label={label}");
            let output =
                self.checked_output(&["ps", "--all", "--format", "json", "--filter", &filter])?;
            for summary in parse_ps_json(&output.stdout)? {
                if !all.iter().any(|c| c.name == summary.name) {
                    all.push(summary);
                }
            }
        }
        Ok(all)
    }

    fn create(&self, spec: &CreateSpec) -> Result<(), EngineError> {
        let image = spec.identity.image.as_str();
        self.ensure_image(image)?;

        let args = create_args(spec, std::env::current_exe().ok().as_deref());
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        debug!("creating container {}", spec.identity.name);
        self.checked_output(&args)?;
        Ok(())
    }

    fn start(&self, container: &str) -> Result<(), EngineError> {
        let args = ["start", container];
        let output = self.output(&args)?;
        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.contains(MIGRATE_HINT) {
            return Err(self.failure(&args, &output));
        }

        warn!(
            "container {container} needs a migration, running '{} system migrate'",
            self.program
        );
        self.checked_output(&["system", "migrate"])?;
        self.checked_output(&args)?;
        Ok(())
    }

    fn entry_point(&self, container: &str) -> Result<EntryPoint, EngineError> {
        let output =
            self.checked_output(&["inspect", "--format", "json", "--type", "container", container])?;
        parse_inspect_json(container, &output.stdout)
    }

    fn command_present(&self, container: &str, command: &str) -> Result<bool, EngineError> {
        self.run_in_container_as_root(container, "command -v \"$1\" >/dev/null", command)
    }

    fn path_present(&self, container: &str, path: &Path) -> Result<bool, EngineError> {
        self.run_in_container_as_root(container, "test -e \"$1\"", &path.to_string_lossy())
    }

    fn version_at_least(&self, minimum: &str) -> bool {
        match self.engine_version() {
            Ok(version) => {
                debug!("{} version {version}", self.program);
                version_at_least(&version, minimum)
            }
            Err(e) => {
                debug!("unable to determine {} version: {e}", self.program);
                false
            }
        }
    }

    fn exec_interactive(&self, args: &[String]) -> Result<ExecStatus, EngineError> {
        let status = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| EngineError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let code = match status.code() {
            Some(code) => code,
            None => {
                #[cfg(unix)]
                {
                    use std::os::unix::process::ExitStatusExt;
                    status.signal().map_or(1, |sig| 128 + sig)
                }
                #[cfg(not(unix))]
                {
                    1
                }
            }
        };
        Ok(ExecStatus::exited(code))
    }
}

/// Arguments for `podman create` of a toolbox container.
pub fn create_args(spec: &CreateSpec, toolbox_binary: Option<&Path>) -> Vec<String> {
    let home = spec.home.to_string_lossy();
    let runtime_dir = spec.runtime_dir.to_string_lossy();
    let mut args: Vec<String> = [
        "create",
        "--dns",
        "none",
        "--hostname",
        "toolbox",
        "--ipc",
        "host",
        "--label",
        TOOLBOX_LABELS[0],
        "--network",
        "host",
        "--no-hosts",
        "--pid",
        "host",
        "--privileged",
        "--security-opt",
        "label=disable",
        "--ulimit",
        "host",
        "--userns",
        "keep-id",
        "--user",
        "root:root",
    ]
    .iter()
    .map(|s| (*s).to_owned())
    .collect();

    args.push("--name".to_owned());
    args.push(spec.identity.name.to_string());
    args.push("--volume".to_owned());
    args.push("/:/run/host:rslave".to_owned());
    args.push("--volume".to_owned());
    args.push("/dev:/dev:rslave".to_owned());
    args.push("--volume".to_owned());
    args.push(format!("{home}:{home}:rslave"));
    args.push("--volume".to_owned());
    args.push(format!("{runtime_dir}:{runtime_dir}"));
    if let Some(binary) = toolbox_binary {
        args.push("--volume".to_owned());
        args.push(format!("{}:/usr/bin/toolbox:ro", binary.display()));
    }

    args.push(spec.identity.image.to_string());
    let uid = spec.uid.to_string();
    args.extend(
        [
            "toolbox",
            "--log-level",
            "debug",
            "init-container",
            "--home",
            &*home,
            "--shell",
            spec.shell.as_str(),
            "--uid",
            uid.as_str(),
            "--user",
            spec.user.as_str(),
            "--runtime-dir",
            &*runtime_dir,
        ]
        .iter()
        .map(|s| (*s).to_owned()),
    );
    args
}

fn parse_json(what: &str, bytes: &[u8]) -> Result<serde_json::Value, EngineError> {
    serde_json::from_slice(bytes).map_err(|e| EngineError::Parse {
        what: what.to_owned(),
        detail: e.to_string(),
    })
}

/// Parse `ps --format json`. Older engines report `Names` as a string,
/// newer ones as an array.
pub fn parse_ps_json(bytes: &[u8]) -> Result<Vec<ContainerSummary>, EngineError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let value = parse_json("container list", bytes)?;
    let Some(entries) = value.as_array() else {
        return Ok(Vec::new());
    };

    let field = |entry: &serde_json::Value, key: &str| {
        entry
            .get(key)
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_owned()
    };

    let summaries = entries
        .iter()
        .filter_map(|entry| {
            let name = match entry.get("Names") {
                Some(serde_json::Value::Array(names)) => names.first()?.as_str()?.to_owned(),
                Some(serde_json::Value::String(name)) => name.clone(),
                _ => return None,
            };
            let status = match field(entry, "State") {
                s if s.is_empty() => field(entry, "Status"),
                s => s,
            };
            Some(ContainerSummary {
                name: ContainerName::new(name),
                image: field(entry, "Image"),
                status,
            })
        })
        .collect();
    Ok(summaries)
}

/// Extract the entry point process name and PID from `inspect --format json`.
pub fn parse_inspect_json(container: &str, bytes: &[u8]) -> Result<EntryPoint, EngineError> {
    let value = parse_json("container inspection", bytes)?;
    let info = value
        .as_array()
        .and_then(|a| a.first())
        .unwrap_or(&value);

    let cmd0 = info
        .pointer("/Config/Cmd/0")
        .and_then(serde_json::Value::as_str)
        .or_else(|| info.pointer("/Config/Cmd").and_then(serde_json::Value::as_str))
        .ok_or_else(|| EngineError::Parse {
            what: format!("entry point of container {container}"),
            detail: "Config.Cmd is missing".to_owned(),
        })?;
    let process_name = cmd0.to_owned();

    let pid = info
        .pointer("/State/Pid")
        .and_then(serde_json::Value::as_i64)
        .ok_or_else(|| EngineError::Parse {
            what: format!("entry point PID of container {container}"),
            detail: "State.Pid is missing".to_owned(),
        })?;

    Ok(EntryPoint { process_name, pid })
}

fn parse_version_json(bytes: &[u8]) -> Result<String, EngineError> {
    let value = parse_json("engine version", bytes)?;
    value
        .pointer("/Client/Version")
        .or_else(|| value.pointer("/Version"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| EngineError::Parse {
            what: "engine version".to_owned(),
            detail: "Client.Version is missing".to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use toolbox_schema::{ContainerIdentity, Distro, Release};

    #[test]
    fn ps_json_with_name_arrays() {
        let json = br#"[
            {"Names": ["fedora-toolbox-40"], "Image": "registry.fedoraproject.org/fedora-toolbox:40", "State": "running"},
            {"Names": ["dev"], "Image": "quay.io/x/y:1", "State": "exited"}
        ]"#;
        let list = parse_ps_json(json).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name, "fedora-toolbox-40");
        assert_eq!(list[1].status, "exited");
    }

    #[test]
    fn ps_json_with_name_strings() {
        let json = br#"[{"Names": "old", "Image": "img", "Status": "Created"}]"#;
        let list = parse_ps_json(json).unwrap();
        assert_eq!(list[0].name, "old");
        assert_eq!(list[0].status, "Created");
    }

    #[test]
    fn ps_json_empty_output() {
        assert!(parse_ps_json(b"").unwrap().is_empty());
        assert!(parse_ps_json(b"[]").unwrap().is_empty());
        assert!(parse_ps_json(b"null").unwrap().is_empty());
    }

    #[test]
    fn ps_json_garbage_is_a_parse_error() {
        assert!(matches!(
            parse_ps_json(b"{not json"),
            Err(EngineError::Parse { .. })
        ));
    }

    #[test]
    fn inspect_json_yields_entry_point() {
        let json = br#"[{"Config": {"Cmd": ["toolbox", "init-container"]}, "State": {"Pid": 4242}}]"#;
        let ep = parse_inspect_json("dev", json).unwrap();
        assert_eq!(ep.process_name, "toolbox");
        assert_eq!(ep.pid, 4242);
    }

    #[test]
    fn inspect_json_keeps_entry_point_path() {
        let json = br#"[{"Config": {"Cmd": ["/opt/bin/toolbox", "init-container"]}, "State": {"Pid": 7}}]"#;
        let ep = parse_inspect_json("dev", json).unwrap();
        assert_eq!(ep.process_name, "/opt/bin/toolbox");
    }

    #[test]
    fn inspect_json_old_container() {
        let json = br#"[{"Config": {"Cmd": ["sleep", "infinity"]}, "State": {"Pid": 0}}]"#;
        let ep = parse_inspect_json("old", json).unwrap();
        assert_eq!(ep.process_name, "sleep");
        assert_eq!(ep.pid, 0);
    }

    #[test]
    fn inspect_json_missing_fields() {
        let err = parse_inspect_json("dev", br#"[{"State": {"Pid": 1}}]"#).unwrap_err();
        assert!(err.to_string().contains("dev"));
    }

    #[test]
    fn version_json_client_version() {
        let json = br#"{"Client": {"Version": "4.9.4"}, "Server": {"Version": "4.9.4"}}"#;
        assert_eq!(parse_version_json(json).unwrap(), "4.9.4");
    }

    #[test]
    fn create_args_carry_identity_and_entry_point() {
        let spec = CreateSpec {
            identity: ContainerIdentity::for_release(Distro::Fedora, Release::new("40")),
            user: "alice".to_owned(),
            uid: 1000,
            home: PathBuf::from("/home/alice"),
            shell: "/bin/bash".to_owned(),
            runtime_dir: PathBuf::from("/run/user/1000/toolbox"),
        };
        let args = create_args(&spec, Some(Path::new("/usr/bin/toolbox")));
        assert_eq!(args[0], "create");
        let name_pos = args.iter().position(|a| a == "--name").unwrap();
        assert_eq!(args[name_pos + 1], "fedora-toolbox-40");
        assert!(args.contains(&"/home/alice:/home/alice:rslave".to_owned()));
        assert!(args.contains(&"/usr/bin/toolbox:/usr/bin/toolbox:ro".to_owned()));

        let image_pos = args
            .iter()
            .position(|a| a == "registry.fedoraproject.org/fedora-toolbox:40")
            .unwrap();
        assert_eq!(args[image_pos + 1], "toolbox");
        assert!(args[image_pos..].contains(&"init-container".to_owned()));
        let user_pos = args.iter().rposition(|a| a == "--user").unwrap();
        assert_eq!(args[user_pos + 1], "alice");
        assert_eq!(args.last().unwrap(), "/run/user/1000/toolbox");
    }

    #[test]
    fn missing_engine_binary_is_a_spawn_error() {
        let engine = PodmanEngine::new("/nonexistent/podman", "error");
        assert!(matches!(
            engine.container_exists("dev"),
            Err(EngineError::Spawn { .. })
        ));
        assert!(!engine.version_at_least("1.8.1"));
    }
}
