use crate::EntryError;
use std::path::PathBuf;
use toolbox_runtime::host::env_options_from_process;
use toolbox_runtime::HostUser;

/// Process-wide settings, passed explicitly instead of read from globals.
#[derive(Debug, Clone)]
pub struct EntryConfig {
    /// Answer yes to every confirmation prompt.
    pub assume_yes: bool,
    /// Value for the engine's own `--log-level`.
    pub engine_log_level: String,
    /// Where container init processes drop their readiness stamps.
    pub runtime_dir: PathBuf,
}

impl EntryConfig {
    pub fn new(assume_yes: bool, engine_log_level: &str, runtime_dir: PathBuf) -> Self {
        Self {
            assume_yes,
            engine_log_level: engine_log_level.to_owned(),
            runtime_dir,
        }
    }
}

/// Facts about the invoking session that end up in the exec call.
#[derive(Debug, Clone)]
pub struct EntryContext {
    pub user: HostUser,
    pub workdir: PathBuf,
    pub shell: Option<String>,
    pub env_options: Vec<String>,
}

impl EntryContext {
    pub fn from_process() -> Result<Self, EntryError> {
        let workdir = std::env::current_dir().map_err(|e| {
            EntryError::Config(format!("failed to get the current working directory: {e}"))
        })?;
        Ok(Self {
            user: HostUser::current(),
            workdir,
            shell: std::env::var("SHELL").ok().filter(|s| !s.is_empty()),
            env_options: env_options_from_process(),
        })
    }

    /// The user's login shell, as an interactive command line.
    pub fn login_shell_command(&self) -> Result<Vec<String>, EntryError> {
        let shell = self.shell.as_ref().ok_or(EntryError::MissingShell)?;
        Ok(vec![shell.clone(), "-l".to_owned()])
    }
}
