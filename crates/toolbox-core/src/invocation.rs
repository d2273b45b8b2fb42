use std::path::Path;

/// Oldest engine version that understands `exec --detach-keys`.
pub const DETACH_KEYS_MIN_VERSION: &str = "1.8.1";

/// Drops every capability, then replaces itself with the user's command.
const CAPSH_WRAPPER: &[&str] = &["capsh", "--caps=", "--", "-c", "exec \"$@\"", "/bin/sh"];

/// Inputs for one interactive exec.
#[derive(Debug, Clone)]
pub struct ExecParams<'a> {
    pub log_level: &'a str,
    /// Engine is recent enough to accept an empty `--detach-keys`.
    pub detach_keys: bool,
    pub user: &'a str,
    pub workdir: &'a Path,
    /// Pre-rendered `--env=NAME=VALUE` options.
    pub env_options: &'a [String],
    pub container: &'a str,
    pub command: &'a [String],
}

/// A fully built exec invocation, consumed by a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecSpec {
    /// Arguments for the engine binary, without the binary itself.
    pub argv: Vec<String>,
    pub emit_escape_sequence: bool,
    pub fallback_allowed: bool,
}

impl ExecSpec {
    pub fn build(params: &ExecParams<'_>, emit_escape_sequence: bool, fallback_allowed: bool) -> Self {
        let mut argv: Vec<String> = vec![
            "--log-level".to_owned(),
            params.log_level.to_owned(),
            "exec".to_owned(),
        ];
        if params.detach_keys {
            argv.extend(["--detach-keys".to_owned(), String::new()]);
        }
        argv.extend([
            "--interactive".to_owned(),
            "--tty".to_owned(),
            "--user".to_owned(),
            params.user.to_owned(),
            "--workdir".to_owned(),
            params.workdir.to_string_lossy().into_owned(),
        ]);
        argv.extend(params.env_options.iter().cloned());
        argv.push(params.container.to_owned());
        argv.extend(CAPSH_WRAPPER.iter().map(|s| (*s).to_owned()));
        argv.extend(params.command.iter().cloned());

        Self {
            argv,
            emit_escape_sequence,
            fallback_allowed,
        }
    }
}
