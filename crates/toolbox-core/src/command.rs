use crate::entry::Interaction;
use crate::EntryError;
use toolbox_runtime::ContainerEngine;
use tracing::debug;

/// Shell used when the requested command is not available in the container.
pub const FALLBACK_SHELL: &[&str] = &["/bin/bash", "-l"];

/// Make sure `command[0]` resolves inside `container`.
///
/// When it does not, either substitute [`FALLBACK_SHELL`] (interactive entry)
/// or fail with `CommandNotFound` (explicit commands).
pub fn ensure_command<E: ContainerEngine + ?Sized>(
    engine: &E,
    container: &str,
    command: Vec<String>,
    fallback_allowed: bool,
    ui: &mut dyn Interaction,
) -> Result<Vec<String>, EntryError> {
    let program = command.first().map(String::as_str).unwrap_or_default();
    if !program.is_empty() && engine.command_present(container, program)? {
        debug!("{program} found in container {container}");
        return Ok(command);
    }

    if !fallback_allowed {
        return Err(EntryError::CommandNotFound {
            command: program.to_owned(),
            container: container.to_owned(),
        });
    }

    ui.notice(&format!(
        "Error: command {program} not found in container {container}\nUsing {} instead.",
        FALLBACK_SHELL[0]
    ));
    Ok(FALLBACK_SHELL.iter().map(|s| (*s).to_owned()).collect())
}
