use crate::EntryError;
use toolbox_schema::{
    validate_container_name, ContainerIdentity, Distro, GeneralSection, HostOs, IdentityError,
    ImageRef,
};
use tracing::debug;

/// The identity inputs of one invocation, as given on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityRequest<'a> {
    /// Positional `CONTAINER` argument.
    pub positional: Option<&'a str>,
    /// `--container` option.
    pub container: Option<&'a str>,
    /// `--release` option.
    pub release: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub identity: ContainerIdentity,
    /// True when neither a name nor a release was supplied.
    pub default_container: bool,
}

/// Turn the command line inputs into a canonical container identity.
///
/// The positional name wins over `--container`. Defaults come from the
/// configuration file first, then from the host's os-release. No engine
/// calls are made here.
pub fn resolve_identity(
    request: &IdentityRequest<'_>,
    host: &HostOs,
    config: &GeneralSection,
) -> Result<ResolvedIdentity, EntryError> {
    let named = match (request.positional, request.container) {
        (Some(name), _) => Some(("CONTAINER", name)),
        (None, Some(name)) => Some(("--container", name)),
        (None, None) => None,
    };
    let name = named
        .map(|(arg, name)| {
            validate_container_name(name).map_err(|_| EntryError::InvalidContainerName {
                arg: arg.to_owned(),
                name: name.to_owned(),
            })
        })
        .transpose()?;

    let distro = match config.distro.as_deref() {
        Some(id) => Distro::from_id(id).ok_or_else(|| {
            EntryError::Config(IdentityError::UnsupportedDistro(id.to_owned()).to_string())
        })?,
        None => host.distro().unwrap_or(Distro::Fedora),
    };

    let release = if let Some(input) = request.release {
        distro
            .parse_release(input)
            .map_err(|e| EntryError::InvalidRelease {
                release: input.to_owned(),
                reason: e.to_string(),
            })?
    } else if let Some(input) = config.release.as_deref() {
        distro
            .parse_release(input)
            .map_err(|e| EntryError::Config(e.to_string()))?
    } else {
        host.release()
            .filter(|_| host.distro() == Some(distro))
            .unwrap_or_else(|| distro.default_release())
    };

    let mut identity = ContainerIdentity::for_release(distro, release);
    if request.release.is_none() {
        if let Some(image) = config.image.as_deref() {
            identity = identity.with_image(ImageRef::new(image));
        }
    }

    let default_container = name.is_none() && request.release.is_none();
    if let Some(name) = name {
        identity = identity.with_name(name);
    }

    debug!(
        "resolved container {} (image {}, release {}, default: {default_container})",
        identity.name, identity.image, identity.release
    );
    Ok(ResolvedIdentity {
        identity,
        default_container,
    })
}
