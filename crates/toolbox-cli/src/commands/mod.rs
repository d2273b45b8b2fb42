pub mod completions;
pub mod enter;
pub mod init_container;
pub mod list;
pub mod man_pages;
pub mod run;

use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::process::Command;
use std::time::Duration;
use toolbox_core::{EntryError, EntryReport, Interaction, EXECUTABLE};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_USAGE: u8 = 2;
pub const EXIT_INTERRUPTED: u8 = 130;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn colorize_status(status: &str) -> String {
    use console::Style;
    match status {
        "running" => Style::new().cyan().bold().apply_to(status).to_string(),
        "created" | "configured" => Style::new().yellow().apply_to(status).to_string(),
        "exited" | "stopped" => Style::new().dim().apply_to(status).to_string(),
        other => other.to_owned(),
    }
}

/// Process exit code for a finished entry attempt.
pub fn report_exit_code(report: &EntryReport) -> u8 {
    u8::try_from(report.exit_code()).unwrap_or(EXIT_FAILURE)
}

/// Print a failed entry attempt and pick its exit code.
pub fn entry_failure(err: &EntryError) -> u8 {
    eprintln!("error: {err}");
    if err.is_usage_error() {
        EXIT_USAGE
    } else if matches!(err, EntryError::Cancelled(_)) {
        EXIT_INTERRUPTED
    } else {
        EXIT_FAILURE
    }
}

/// Re-run this invocation on the host, from inside a toolbox container.
pub fn forward_to_host() -> Result<u8, String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    tracing::debug!("forwarding to host: {EXECUTABLE} {}", args.join(" "));
    let status = Command::new("flatpak-spawn")
        .arg("--host")
        .arg(EXECUTABLE)
        .args(&args)
        .status()
        .map_err(|e| format!("failed to forward to the host: {e}"))?;
    Ok(status
        .code()
        .and_then(|c| u8::try_from(c).ok())
        .unwrap_or(EXIT_FAILURE))
}

/// Terminal front end for an entry attempt.
pub struct CliInteraction {
    stdout: std::io::Stdout,
    spinner: Option<ProgressBar>,
}

impl Default for CliInteraction {
    fn default() -> Self {
        Self {
            stdout: std::io::stdout(),
            spinner: None,
        }
    }
}

impl Interaction for CliInteraction {
    fn confirm(&mut self, prompt: &str) -> bool {
        if !console::user_attended() {
            tracing::debug!("no terminal attached, not asking: {prompt}");
            return false;
        }
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false)
    }

    fn notice(&mut self, message: &str) {
        eprintln!("{message}");
    }

    fn info(&mut self, message: &str) {
        println!("{message}");
    }

    fn waiting(&mut self, container: &str) {
        self.spinner = Some(spinner(&format!(
            "waiting for container {container} to initialize..."
        )));
    }

    fn ready(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }

    fn terminal(&mut self) -> &mut dyn Write {
        &mut self.stdout
    }
}
