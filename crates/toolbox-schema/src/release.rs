use crate::identity::IdentityError;
use crate::types::{ContainerName, ImageRef, Release};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Newest Fedora release with a published toolbox image known to this build.
pub const FEDORA_DEFAULT_RELEASE: &str = "40";

/// Newest RHEL release with a published toolbox image known to this build.
pub const RHEL_DEFAULT_RELEASE: &str = "9.4";

/// Distributions with known toolbox images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distro {
    Fedora,
    Rhel,
}

impl Distro {
    /// Map an os-release `ID` onto a supported distribution.
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "fedora" => Some(Self::Fedora),
            "rhel" => Some(Self::Rhel),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fedora => "fedora",
            Self::Rhel => "rhel",
        }
    }

    pub fn default_release(self) -> Release {
        match self {
            Self::Fedora => Release::new(FEDORA_DEFAULT_RELEASE),
            Self::Rhel => Release::new(RHEL_DEFAULT_RELEASE),
        }
    }

    /// Parse a user supplied release string into its normalized form.
    ///
    /// Fedora accepts `40`, `f40` and `F40`. RHEL accepts `MAJOR.MINOR`.
    pub fn parse_release(self, input: &str) -> Result<Release, IdentityError> {
        let invalid = |hint: &str| IdentityError::InvalidRelease {
            distro: self.as_str().to_owned(),
            release: input.to_owned(),
            hint: hint.to_owned(),
        };

        match self {
            Self::Fedora => {
                let digits = input
                    .strip_prefix('f')
                    .or_else(|| input.strip_prefix('F'))
                    .unwrap_or(input);
                match digits.parse::<u32>() {
                    Ok(n) if n > 0 && digits.bytes().all(|b| b.is_ascii_digit()) => {
                        Ok(Release::new(n.to_string()))
                    }
                    _ => Err(invalid("a positive integer, optionally prefixed with 'f'")),
                }
            }
            Self::Rhel => {
                let hint = "'<major>.<minor>', e.g. 9.4";
                let (major, minor) = input.split_once('.').ok_or_else(|| invalid(hint))?;
                let numeric = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
                if !numeric(major) || !numeric(minor) {
                    return Err(invalid(hint));
                }
                let major: u32 = major.parse().map_err(|_| invalid(hint))?;
                let minor: u32 = minor.parse().map_err(|_| invalid(hint))?;
                if major == 0 {
                    return Err(invalid(hint));
                }
                Ok(Release::new(format!("{major}.{minor}")))
            }
        }
    }

    /// Default image for a release of this distribution.
    pub fn image(self, release: &Release) -> ImageRef {
        match self {
            Self::Fedora => ImageRef::new(format!(
                "registry.fedoraproject.org/fedora-toolbox:{release}"
            )),
            Self::Rhel => {
                let major = release.split('.').next().unwrap_or(release.as_str());
                ImageRef::new(format!(
                    "registry.access.redhat.com/ubi{major}/toolbox:{release}"
                ))
            }
        }
    }

    /// Default container name for a release of this distribution.
    pub fn container_name(self, release: &Release) -> ContainerName {
        ContainerName::new(format!("{}-toolbox-{release}", self.as_str()))
    }
}

impl fmt::Display for Distro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
