//! Container identity, release parsing, host identification and configuration for toolbox.
//!
//! This crate defines the schema layer: the container naming grammar
//! (`validate_container_name`), per-distribution release handling (`Distro`),
//! the canonical (container, image, release) triple (`ContainerIdentity`),
//! `/etc/os-release` parsing (`HostOs`), and the layered `toolbox.conf`
//! configuration file (`ToolboxConfig`).

pub mod config;
pub mod identity;
pub mod os_release;
pub mod release;
pub mod types;

pub use config::{ConfigError, GeneralSection, ToolboxConfig};
pub use identity::{
    container_name_for_image, validate_container_name, ContainerIdentity, IdentityError,
    CONTAINER_NAME_MAX_LEN, CONTAINER_NAME_PATTERN,
};
pub use os_release::HostOs;
pub use release::Distro;
pub use types::{ContainerName, ImageRef, Release};
