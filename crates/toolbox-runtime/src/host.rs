use std::path::{Path, PathBuf};

/// Session variables forwarded into the container with `--env`.
pub const PRESERVED_ENV_VARS: &[&str] = &[
    "COLORTERM",
    "DBUS_SESSION_BUS_ADDRESS",
    "DBUS_SYSTEM_BUS_ADDRESS",
    "DESKTOP_SESSION",
    "DISPLAY",
    "LANG",
    "SHELL",
    "SSH_AUTH_SOCK",
    "TERM",
    "TOOLBOX_PATH",
    "VTE_VERSION",
    "WAYLAND_DISPLAY",
    "XAUTHORITY",
    "XDG_CURRENT_DESKTOP",
    "XDG_DATA_DIRS",
    "XDG_MENU_PREFIX",
    "XDG_RUNTIME_DIR",
    "XDG_SEAT",
    "XDG_SESSION_DESKTOP",
    "XDG_SESSION_ID",
    "XDG_SESSION_TYPE",
    "XDG_VTNR",
];

const CONTAINERENV_PATH: &str = "/run/.containerenv";
/// Stamp that marks a container as a toolbox container.
pub const TOOLBOXENV_PATH: &str = "/run/.toolboxenv";

/// The user invoking toolbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostUser {
    pub name: String,
    pub uid: u32,
    pub home: PathBuf,
}

/// Safe wrapper around libc::getuid().
#[allow(unsafe_code)]
fn current_uid() -> u32 {
    // SAFETY: getuid() is always safe, takes no arguments and cannot fail.
    unsafe { libc::getuid() }
}

impl HostUser {
    pub fn current() -> Self {
        let uid = current_uid();
        let name = std::env::var("USER")
            .or_else(|_| std::env::var("LOGNAME"))
            .ok()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| uid.to_string());
        let home = std::env::var("HOME").map_or_else(
            |_| {
                if uid == 0 {
                    PathBuf::from("/root")
                } else {
                    PathBuf::from(format!("/home/{name}"))
                }
            },
            PathBuf::from,
        );
        Self { name, uid, home }
    }

    /// Directory where container init processes drop their readiness stamps.
    pub fn runtime_dir(&self) -> PathBuf {
        runtime_dir_for(self.uid, std::env::var("XDG_RUNTIME_DIR").ok().as_deref())
    }
}

pub fn runtime_dir_for(uid: u32, xdg_runtime_dir: Option<&str>) -> PathBuf {
    if uid == 0 {
        return PathBuf::from("/run/toolbox");
    }
    match xdg_runtime_dir {
        Some(dir) if !dir.is_empty() => Path::new(dir).join("toolbox"),
        _ => PathBuf::from(format!("/run/user/{uid}/toolbox")),
    }
}

/// `--env=NAME=VALUE` options for every preserved variable that is set.
pub fn env_options<F>(lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    PRESERVED_ENV_VARS
        .iter()
        .filter_map(|name| lookup(name).map(|value| format!("--env={name}={value}")))
        .collect()
}

pub fn env_options_from_process() -> Vec<String> {
    env_options(|name| std::env::var(name).ok())
}

pub fn is_inside_container() -> bool {
    Path::new(CONTAINERENV_PATH).exists()
}

pub fn is_inside_toolbox_container() -> bool {
    Path::new(TOOLBOXENV_PATH).exists()
}
