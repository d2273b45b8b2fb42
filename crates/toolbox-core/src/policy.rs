use crate::entry::Interaction;
use crate::EntryError;
use toolbox_runtime::{ContainerEngine, CreateSpec};
use toolbox_schema::ContainerName;
use tracing::{debug, info, warn};

pub const CREATE_PROMPT: &str = "No toolbox containers found. Create now?";

/// How a missing container is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyMode {
    /// The named container must exist.
    Pedantic,
    /// Offer to create a container, or substitute the only one there is.
    Permissive,
}

/// Which container the entry attempt goes on with, and how it was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Existing(ContainerName),
    Created(ContainerName),
    Substituted {
        requested: ContainerName,
        chosen: ContainerName,
    },
    /// The user declined to create a container. Nothing left to do.
    Declined,
}

impl Resolution {
    pub fn container(&self) -> Option<&ContainerName> {
        match self {
            Self::Existing(name) | Self::Created(name) => Some(name),
            Self::Substituted { chosen, .. } => Some(chosen),
            Self::Declined => None,
        }
    }
}

/// Reconcile the resolved identity against the containers that exist.
///
/// Existence is queried fresh from the engine. `create` is issued at most
/// once, and only in permissive mode after confirmation.
pub fn reconcile<E: ContainerEngine + ?Sized>(
    engine: &E,
    spec: &CreateSpec,
    default_container: bool,
    mode: PolicyMode,
    assume_yes: bool,
    ui: &mut dyn Interaction,
) -> Result<Resolution, EntryError> {
    let requested = &spec.identity.name;
    if engine.container_exists(requested)? {
        debug!("container {requested} exists");
        return Ok(Resolution::Existing(requested.clone()));
    }

    if mode == PolicyMode::Pedantic {
        return Err(not_found(
            requested,
            "Use the 'create' command to create a toolbox container.",
        ));
    }

    let containers = match engine.list_containers() {
        Ok(containers) => containers,
        Err(e) => {
            warn!("failed to list toolbox containers: {e}");
            return Err(not_found(
                requested,
                "Use the 'create' command to create a toolbox container.",
            ));
        }
    };
    debug!("found {} toolbox container(s)", containers.len());

    match containers.as_slice() {
        [] => {
            if !(assume_yes || ui.confirm(CREATE_PROMPT)) {
                ui.info("A container can be created later with the 'create' command.");
                return Ok(Resolution::Declined);
            }
            info!("creating container {requested} from {}", spec.identity.image);
            engine.create(spec)?;
            Ok(Resolution::Created(requested.clone()))
        }
        [only] if default_container => {
            ui.notice(&format!(
                "Error: container {requested} not found\n\
                 Entering container {} instead.\n\
                 Use the 'create' command to create a different toolbox.\n\
                 Run '{} --help' for usage.",
                only.name,
                crate::EXECUTABLE
            ));
            Ok(Resolution::Substituted {
                requested: requested.clone(),
                chosen: only.name.clone(),
            })
        }
        _ => Err(not_found(
            requested,
            "Use the '--container' option to select a toolbox.",
        )),
    }
}

fn not_found(container: &ContainerName, hint: &str) -> EntryError {
    EntryError::ContainerNotFound {
        container: container.to_string(),
        hint: hint.to_owned(),
    }
}
