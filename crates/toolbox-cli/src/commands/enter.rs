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
    name: Option<&str>,
    container: Option<&str>,
    release: Option<&str>,
) -> Result<u8, String> {
    let identity = IdentityRequest {
        positional: name,
        container,
        release,
    };
    Ok(match enter(engine, config, host, defaults, &identity) {
        Ok(report) => report_exit_code(&report),
        Err(e) => entry_failure(&e),
    })
}

fn enter<E: ContainerEngine>(
    engine: &E,
    config: &EntryConfig,
    host: &HostOs,
    defaults: &GeneralSection,
    identity: &IdentityRequest<'_>,
) -> Result<EntryReport, EntryError> {
    let resolved = resolve_identity(identity, host, defaults)?;
    let context = EntryContext::from_process()?;
    let command = context.login_shell_command()?;

    let request = EntryRequest {
        resolved,
        command,
        mode: PolicyMode::Permissive,
        fallback_allowed: true,
        emit_escape_sequence: host.is_container_aware_desktop(),
    };
    Entry::new(engine, config, &context).run(request, &mut CliInteraction::default())
}
