use super::EXIT_SUCCESS;
use std::path::{Path, PathBuf};
use std::time::Duration;
use toolbox_core::{readiness_marker, shutdown_requested};
use toolbox_runtime::host::{is_inside_container, runtime_dir_for, TOOLBOXENV_PATH};

/// The entry point of a toolbox container, as set up by `create`.
#[derive(Debug)]
pub struct InitOptions {
    pub home: PathBuf,
    pub shell: String,
    pub uid: u32,
    pub user: String,
    pub runtime_dir: Option<PathBuf>,
}

pub fn run(options: &InitOptions) -> Result<u8, String> {
    tracing::debug!(
        "initializing container for {} (uid {}, home {}, shell {})",
        options.user,
        options.uid,
        options.home.display(),
        options.shell
    );

    if is_inside_container() {
        if let Err(e) = std::fs::write(TOOLBOXENV_PATH, b"") {
            tracing::warn!("failed to create {TOOLBOXENV_PATH}: {e}");
        }
    }

    let runtime_dir = options.runtime_dir.clone().unwrap_or_else(|| {
        runtime_dir_for(
            options.uid,
            std::env::var("XDG_RUNTIME_DIR").ok().as_deref(),
        )
    });
    let marker = stamp_readiness(&runtime_dir, std::process::id())?;
    tracing::info!("container initialized, created {}", marker.display());

    while !shutdown_requested() {
        std::thread::sleep(Duration::from_secs(1));
    }
    Ok(EXIT_SUCCESS)
}

/// Drop the marker the entering side waits for. The container shares the
/// host's PID namespace, so `pid` is what the engine reports for PID 1.
fn stamp_readiness(runtime_dir: &Path, pid: u32) -> Result<PathBuf, String> {
    std::fs::create_dir_all(runtime_dir)
        .map_err(|e| format!("failed to create {}: {e}", runtime_dir.display()))?;
    let marker = readiness_marker(runtime_dir, i64::from(pid));
    std::fs::write(&marker, b"")
        .map_err(|e| format!("failed to create {}: {e}", marker.display()))?;
    Ok(marker)
}
