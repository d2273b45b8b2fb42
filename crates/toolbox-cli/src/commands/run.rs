use super::{entry_failure, report_exit_code, CliInteraction};
use toolbox_core::{
    resolve_identity, Entry, EntryConfig, EntryContext, EntryError, EntryReport, EntryRequest,
    IdentityRequest, PolicyMode,
};
use toolbox_runtime::ContainerEngine;
use toolbox_schema::{GeneralSection, HostOs};

pub fn run<E: ContainerEngine>(
    engine: &E,
    config: &EntryConfig,
    host: &HostOs,
    defaults: &GeneralSection,
    container: Option<&str>,
    release: Option<&str>,
    command: &[String],
) -> Result<u8, String> {
    let identity = IdentityRequest {
        positional: None,
        container,
        release,
    };
    Ok(
        match run_command(engine, config, host, defaults, &identity, command) {
            Ok(report) => report_exit_code(&report),
            Err(e) => entry_failure(&e),
        },
    )
}

fn run_command<E: ContainerEngine>(
    engine: &E,
    config: &EntryConfig,
    host: &HostOs,
    defaults: &GeneralSection,
    identity: &IdentityRequest<'_>,
    command: &[String],
) -> Result<EntryReport, EntryError> {
    let resolved = resolve_identity(identity, host, defaults)?;
    let context = EntryContext::from_process()?;
    let request = EntryRequest {
        resolved,
        command: command.to_vec(),
        mode: PolicyMode::Pedantic,
        fallback_allowed: false,
        emit_escape_sequence: false,
    };
    Entry::new(engine, config, &context).run(request, &mut CliInteraction::default())
}
