use crate::command::ensure_command;
use crate::concurrency::shutdown_requested;
use crate::config::{EntryConfig, EntryContext};
use crate::invocation::{ExecParams, ExecSpec, DETACH_KEYS_MIN_VERSION};
use crate::outcome::{classify, Outcome};
use crate::policy::{reconcile, PolicyMode, Resolution};
use crate::readiness::{check_entry_point, readiness_marker, ReadinessWaiter};
use crate::resolve::ResolvedIdentity;
use crate::EntryError;
use std::io::Write;
use toolbox_runtime::{ContainerContextGuard, ContainerEngine, CreateSpec};
use toolbox_schema::ContainerName;
use tracing::{debug, info};

/// The user-facing side of an entry attempt.
///
/// Keeps prompts, diagnostics and progress out of the orchestration logic so
/// the same flow runs behind a terminal or a test recorder.
pub trait Interaction {
    /// Ask a yes/no question. Anything but an explicit yes is a no.
    fn confirm(&mut self, prompt: &str) -> bool;

    /// Diagnostic for the user, on stderr.
    fn notice(&mut self, message: &str);

    /// Informational message, on stdout.
    fn info(&mut self, message: &str);

    /// The readiness wait is about to begin.
    fn waiting(&mut self, _container: &str) {}

    /// The readiness wait is over, whatever its result.
    fn ready(&mut self) {}

    /// Where terminal escape sequences go.
    fn terminal(&mut self) -> &mut dyn Write;
}

/// One entry attempt.
#[derive(Debug, Clone)]
pub struct EntryRequest {
    pub resolved: ResolvedIdentity,
    /// Command to run. For interactive entry this is the login shell.
    pub command: Vec<String>,
    pub mode: PolicyMode,
    /// Substitute the fallback shell when `command` is missing.
    pub fallback_allowed: bool,
    pub emit_escape_sequence: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryReport {
    /// No container existed and the user chose not to create one.
    Declined,
    Ran {
        container: ContainerName,
        outcome: Outcome,
        exit_code: i32,
    },
}

impl EntryReport {
    /// Process exit code for this report.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Declined => 0,
            Self::Ran { exit_code, .. } => *exit_code,
        }
    }
}

/// Drives a request from container reconciliation to exit classification.
pub struct Entry<'a, E: ContainerEngine + ?Sized> {
    engine: &'a E,
    config: &'a EntryConfig,
    context: &'a EntryContext,
    waiter: ReadinessWaiter,
    cancelled: fn() -> bool,
}

impl<'a, E: ContainerEngine + ?Sized> Entry<'a, E> {
    pub fn new(engine: &'a E, config: &'a EntryConfig, context: &'a EntryContext) -> Self {
        Self {
            engine,
            config,
            context,
            waiter: ReadinessWaiter::default(),
            cancelled: shutdown_requested,
        }
    }

    #[must_use]
    pub fn with_waiter(mut self, waiter: ReadinessWaiter) -> Self {
        self.waiter = waiter;
        self
    }

    #[must_use]
    pub fn with_cancel_check(mut self, cancelled: fn() -> bool) -> Self {
        self.cancelled = cancelled;
        self
    }

    pub fn run(
        &self,
        request: EntryRequest,
        ui: &mut dyn Interaction,
    ) -> Result<EntryReport, EntryError> {
        let create_spec = self.create_spec(&request.resolved);
        let resolution = reconcile(
            self.engine,
            &create_spec,
            request.resolved.default_container,
            request.mode,
            self.config.assume_yes,
            ui,
        )?;
        let container = match resolution {
            Resolution::Declined => return Ok(EntryReport::Declined),
            Resolution::Existing(name) | Resolution::Created(name) => name,
            Resolution::Substituted { chosen, .. } => chosen,
        };

        info!("starting container {container}");
        self.engine.start(&container)?;

        let entry_point = self.engine.entry_point(&container)?;
        check_entry_point(&container, &entry_point)?;

        let marker = readiness_marker(&self.config.runtime_dir, entry_point.pid);
        ui.waiting(&container);
        let waited = self
            .waiter
            .wait_for_marker(&container, &marker, self.cancelled);
        ui.ready();
        debug!("container {container} initialized after {}s", waited?);

        let command = ensure_command(
            self.engine,
            &container,
            request.command,
            request.fallback_allowed,
            ui,
        )?;

        let detach_keys = self.engine.version_at_least(DETACH_KEYS_MIN_VERSION);
        let spec = ExecSpec::build(
            &ExecParams {
                log_level: &self.config.engine_log_level,
                detach_keys,
                user: &self.context.user.name,
                workdir: &self.context.workdir,
                env_options: &self.context.env_options,
                container: &container,
                command: &command,
            },
            request.emit_escape_sequence,
            request.fallback_allowed,
        );

        debug!("{} {}", self.engine.name(), spec.argv.join(" "));
        let status = {
            let _context = ContainerContextGuard::push(
                ui.terminal(),
                spec.emit_escape_sequence,
                &container,
                self.context.user.uid,
            );
            self.engine.exec_interactive(&spec.argv)?
        };

        let outcome = classify(&status, || {
            self.engine
                .path_present(&container, &self.context.workdir)
                .unwrap_or(false)
        });
        debug!("exec in {container} exited with {} ({outcome:?})", status.code);

        let program = command.first().map(String::as_str).unwrap_or_default();
        let exit_code = outcome.into_result(&container, program, &self.context.workdir)?;
        Ok(EntryReport::Ran {
            container,
            outcome,
            exit_code,
        })
    }

    fn create_spec(&self, resolved: &ResolvedIdentity) -> CreateSpec {
        let user = &self.context.user;
        CreateSpec {
            identity: resolved.identity.clone(),
            user: user.name.clone(),
            uid: user.uid,
            home: user.home.clone(),
            shell: self
                .context
                .shell
                .clone()
                .unwrap_or_else(|| "/bin/bash".to_owned()),
            runtime_dir: self.config.runtime_dir.clone(),
        }
    }
}
