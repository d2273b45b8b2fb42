//! CLI subprocess integration tests.
//!
//! These tests invoke the `toolbox` binary as a subprocess, with
//! `TOOLBOX_ENGINE` pointing at a shell script that plays the container
//! engine: one stopped toolbox container named `dev`, whose init process
//! drops its readiness stamp as soon as the container starts.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use toolbox_runtime::podman::create_args;
use toolbox_runtime::CreateSpec;
use toolbox_schema::{ContainerIdentity, Distro, Release};

const STUB_ENGINE: &str = r#"#!/bin/sh
while [ "$1" = "--log-level" ]; do shift 2; done
case "$1" in
    container)
        [ "$2" = "exists" ] && [ "$3" = "dev" ] && exit 0
        exit 1
        ;;
    ps)
        echo '[{"Names":["dev"],"Image":"registry.example.com/dev-toolbox:1","State":"exited"}]'
        ;;
    start)
        [ "$2" = "dev" ] || exit 125
        mkdir -p "$STUB_RUNTIME_DIR" && : > "$STUB_RUNTIME_DIR/container-initialized-4242"
        ;;
    inspect)
        echo '[{"Config":{"Cmd":["toolbox","--log-level","debug","init-container"]},"State":{"Pid":4242}}]'
        ;;
    version)
        echo '{"Client":{"Version":"4.9.4"}}'
        ;;
    exec)
        shift
        # Probes run as root: command -v and test -e always succeed.
        [ "$1" = "--user" ] && [ "$2" = "root" ] && exit 0
        while [ $# -gt 0 ] && [ "$1" != "capsh" ]; do shift; done
        # capsh --caps= -- -c 'exec "$@"' /bin/sh
        shift 6
        exec "$@"
        ;;
    *)
        echo "stub engine: unexpected arguments: $*" >&2
        exit 125
        ;;
esac
"#;

struct Sandbox {
    dir: tempfile::TempDir,
    engine: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let engine = dir.path().join("stub-engine");
        std::fs::write(&engine, STUB_ENGINE).unwrap();
        std::fs::set_permissions(&engine, std::fs::Permissions::from_mode(0o755)).unwrap();
        Self { dir, engine }
    }

    fn xdg_runtime_dir(&self) -> PathBuf {
        self.dir.path().join("runtime")
    }

    /// Where the binary looks for readiness stamps: root has a fixed location.
    fn toolbox_runtime_dir(&self) -> PathBuf {
        if running_as_root() {
            PathBuf::from("/run/toolbox")
        } else {
            self.xdg_runtime_dir().join("toolbox")
        }
    }

    fn toolbox(&self) -> Command {
        let mut cmd = toolbox_bin();
        cmd.current_dir(self.dir.path())
            .env("TOOLBOX_ENGINE", &self.engine)
            .env("STUB_RUNTIME_DIR", self.toolbox_runtime_dir())
            .env("XDG_RUNTIME_DIR", self.xdg_runtime_dir())
            .env("XDG_CONFIG_HOME", self.dir.path().join("config"))
            .env("SHELL", "/bin/sh")
            .env_remove("TOOLBOX_LOG");
        cmd
    }
}

fn toolbox_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_toolbox"));
    // The stub engine is not on PATH.
    cmd.env("TOOLBOX_SKIP_PREREQS", "1");
    cmd
}

fn running_as_root() -> bool {
    Command::new("id")
        .arg("-u")
        .output()
        .map(|o| String::from_utf8_lossy(&o.stdout).trim() == "0")
        .unwrap_or(false)
}

/// Inside a container the binary forwards engine commands to the host.
fn skip_inside_container() -> bool {
    let inside = Path::new("/run/.containerenv").exists();
    if inside {
        eprintln!("skipping: running inside a container");
    }
    inside
}

#[test]
fn cli_version_exits_zero() {
    let output = toolbox_bin().arg("--version").output().unwrap();
    assert!(output.status.success(), "toolbox --version must exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("toolbox"),
        "version output must contain 'toolbox': {stdout}"
    );
}

#[test]
fn cli_help_lists_commands() {
    let output = toolbox_bin().arg("--help").output().unwrap();
    assert!(output.status.success(), "toolbox --help must exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["enter", "run", "list"] {
        assert!(stdout.contains(command), "help must list '{command}'");
    }
}

#[test]
fn cli_run_without_command_is_usage_error() {
    let output = toolbox_bin().args(["run", "-c", "dev"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn cli_completions_bash() {
    let output = toolbox_bin().args(["completions", "bash"]).output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("toolbox"));
}

#[test]
fn cli_man_pages_written() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("man");
    let output = toolbox_bin()
        .arg("man-pages")
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(out.join("toolbox.1").exists());
    assert!(out.join("toolbox-enter.1").exists());
    assert!(out.join("toolbox-run.1").exists());
    assert!(!out.join("toolbox-init-container.1").exists());
}

#[test]
fn cli_run_echo_in_stopped_container() {
    if skip_inside_container() {
        return;
    }
    let sandbox = Sandbox::new();
    let output = sandbox
        .toolbox()
        .args(["run", "--container", "dev", "--", "echo", "hi"])
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "run must succeed: {stderr}");
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hi");
}

#[test]
fn cli_run_forwards_exit_code() {
    if skip_inside_container() {
        return;
    }
    let sandbox = Sandbox::new();
    let output = sandbox
        .toolbox()
        .args(["run", "-c", "dev", "sh", "-c", "exit 7"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7));
    assert!(
        !String::from_utf8_lossy(&output.stderr).contains("error:"),
        "application exit codes carry no message"
    );
}

#[test]
fn cli_run_in_missing_container_fails() {
    if skip_inside_container() {
        return;
    }
    let sandbox = Sandbox::new();
    let output = sandbox
        .toolbox()
        .args(["run", "-c", "nope", "--", "true"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error: container nope not found"),
        "unexpected stderr: {stderr}"
    );
}

#[test]
fn cli_invalid_container_name_is_usage_error() {
    if skip_inside_container() {
        return;
    }
    let sandbox = Sandbox::new();
    let output = sandbox
        .toolbox()
        .args(["run", "--container=has/slash", "--", "true"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid argument for '--container'"));
    assert!(stderr.contains("[a-zA-Z0-9][a-zA-Z0-9_.-]*"));
}

#[test]
fn cli_enter_requires_shell() {
    if skip_inside_container() {
        return;
    }
    let sandbox = Sandbox::new();
    let output = sandbox
        .toolbox()
        .env_remove("SHELL")
        .args(["enter", "dev"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("default shell"));
}

#[test]
fn cli_list_json() {
    if skip_inside_container() {
        return;
    }
    let sandbox = Sandbox::new();
    let output = sandbox
        .toolbox()
        .args(["list", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let containers: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let containers = containers.as_array().unwrap();
    // Both toolbox labels report the same container once.
    assert_eq!(containers.len(), 1);
    assert_eq!(containers[0]["name"], "dev");
    assert_eq!(containers[0]["status"], "exited");
}

#[test]
fn cli_container_entry_point_stamps_readiness() {
    if skip_inside_container() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let spec = CreateSpec {
        identity: ContainerIdentity::for_release(Distro::Fedora, Release::new("40")),
        user: "alice".to_owned(),
        uid: 1000,
        home: dir.path().join("home"),
        shell: "/bin/bash".to_owned(),
        runtime_dir: dir.path().join("runtime").join("toolbox"),
    };
    let args = create_args(&spec, None);
    let image = spec.identity.image.to_string();
    let image_pos = args.iter().position(|a| *a == image).unwrap();
    assert_eq!(args[image_pos + 1], "toolbox");

    let mut child = toolbox_bin()
        .args(&args[image_pos + 2..])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    let marker = spec
        .runtime_dir
        .join(format!("container-initialized-{}", child.id()));

    let mut stamped = false;
    for _ in 0..100 {
        if marker.exists() {
            stamped = true;
            break;
        }
        if child.try_wait().unwrap().is_some() {
            break;
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    let still_running = child.try_wait().unwrap().is_none();
    let _ = child.kill();
    let _ = child.wait();

    assert!(stamped, "entry point must create {}", marker.display());
    assert!(still_running, "entry point must keep running after initializing");
}
