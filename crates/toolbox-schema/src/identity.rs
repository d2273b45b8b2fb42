use crate::release::Distro;
use crate::types::{ContainerName, ImageRef, Release};
use serde::Serialize;
use thiserror::Error;

/// Grammar every container name must match, as shown to users.
pub const CONTAINER_NAME_PATTERN: &str = "[a-zA-Z0-9][a-zA-Z0-9_.-]*";

/// Container names double as hostnames inside the container.
pub const CONTAINER_NAME_MAX_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error(
        "invalid container name '{0}': names must match '{pattern}' and be at most {max} characters",
        pattern = CONTAINER_NAME_PATTERN,
        max = CONTAINER_NAME_MAX_LEN
    )]
    InvalidName(String),
    #[error("invalid release '{release}' for {distro}: expected {hint}")]
    InvalidRelease {
        distro: String,
        release: String,
        hint: String,
    },
    #[error("unsupported distribution '{0}' (expected: fedora, rhel)")]
    UnsupportedDistro(String),
}

/// The canonical (container, image, release) triple for one invocation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ContainerIdentity {
    pub name: ContainerName,
    pub image: ImageRef,
    pub release: Release,
    pub distro: Distro,
}

impl ContainerIdentity {
    /// Identity of the default container for a distribution release.
    pub fn for_release(distro: Distro, release: Release) -> Self {
        Self {
            name: distro.container_name(&release),
            image: distro.image(&release),
            release,
            distro,
        }
    }

    /// Replace the container name, keeping image and release.
    #[must_use]
    pub fn with_name(mut self, name: ContainerName) -> Self {
        self.name = name;
        self
    }

    /// Replace the image. The container name is re-derived from it.
    #[must_use]
    pub fn with_image(mut self, image: ImageRef) -> Self {
        self.name = container_name_for_image(&image);
        self.image = image;
        self
    }
}

/// Check `name` against [`CONTAINER_NAME_PATTERN`] and the length bound.
pub fn validate_container_name(name: &str) -> Result<ContainerName, IdentityError> {
    let mut bytes = name.bytes();
    let valid_first = bytes.next().is_some_and(|b| b.is_ascii_alphanumeric());
    let valid_rest =
        bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b'-');

    if valid_first && valid_rest && name.len() <= CONTAINER_NAME_MAX_LEN {
        Ok(ContainerName::new(name))
    } else {
        Err(IdentityError::InvalidName(name.to_owned()))
    }
}

/// Derive the default container name for an image: `<basename>-<tag>`.
pub fn container_name_for_image(image: &ImageRef) -> ContainerName {
    match image.tag() {
        Some(tag) if !tag.is_empty() => ContainerName::new(format!("{}-{tag}", image.basename())),
        _ => ContainerName::new(image.basename()),
    }
}
