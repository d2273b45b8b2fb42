use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SYSTEM_CONFIG_PATH: &str = "/etc/containers/toolbox.conf";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Contents of `toolbox.conf`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ToolboxConfig {
    #[serde(default)]
    pub general: GeneralSection,
}

/// Defaults for the container identity when none is given on the command line.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GeneralSection {
    #[serde(default)]
    pub distro: Option<String>,
    #[serde(default)]
    pub release: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl ToolboxConfig {
    pub fn parse_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load a single file. A missing file yields the empty configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Load each file in order; keys set in later files win.
    pub fn load_layered(paths: &[PathBuf]) -> Result<Self, ConfigError> {
        let mut merged = Self::default();
        for path in paths {
            merged.merge(Self::load(path)?);
        }
        Ok(merged)
    }

    /// System file first, then the per-user file.
    pub fn load_default() -> Result<Self, ConfigError> {
        let mut paths = vec![PathBuf::from(SYSTEM_CONFIG_PATH)];
        if let Some(user) = user_config_path() {
            paths.push(user);
        }
        Self::load_layered(&paths)
    }

    fn merge(&mut self, other: Self) {
        let GeneralSection {
            distro,
            release,
            image,
        } = other.general;
        if distro.is_some() {
            self.general.distro = distro;
        }
        if release.is_some() {
            self.general.release = release;
        }
        if image.is_some() {
            self.general.image = image;
        }
    }
}

fn user_config_path() -> Option<PathBuf> {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(std::env::var("HOME").ok()?).join(".config"),
    };
    Some(base.join("containers/toolbox.conf"))
}
