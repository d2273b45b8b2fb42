use crate::release::Distro;
use crate::types::Release;
use std::collections::BTreeMap;
use std::path::Path;

const OS_RELEASE_PATHS: &[&str] = &["/etc/os-release", "/usr/lib/os-release"];

/// Host operating system identity, as described by os-release(5).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostOs {
    pub id: String,
    pub version_id: Option<String>,
    pub variant_id: Option<String>,
}

impl HostOs {
    /// Read the first os-release file that exists on this host.
    pub fn detect() -> std::io::Result<Self> {
        let mut last_err = None;
        for path in OS_RELEASE_PATHS {
            match Self::load(Path::new(path)) {
                Ok(host) => return Ok(host),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound)))
    }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        let fields: BTreeMap<&str, String> = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .filter_map(|l| l.split_once('='))
            .map(|(k, v)| (k.trim(), unquote(v.trim())))
            .collect();

        Self {
            // os-release(5): ID defaults to "linux" when absent.
            id: fields.get("ID").cloned().unwrap_or_else(|| "linux".to_owned()),
            version_id: fields.get("VERSION_ID").cloned(),
            variant_id: fields.get("VARIANT_ID").cloned(),
        }
    }

    pub fn distro(&self) -> Option<Distro> {
        Distro::from_id(&self.id)
    }

    /// The host's own release, if the host is a supported distribution and
    /// its VERSION_ID parses as a release of it.
    pub fn release(&self) -> Option<Release> {
        let distro = self.distro()?;
        let version = self.version_id.as_deref()?;
        distro.parse_release(version).ok()
    }

    /// Desktop variants that understand the container push/pop escape sequences.
    pub fn is_container_aware_desktop(&self) -> bool {
        self.id == "fedora"
            && matches!(
                self.variant_id.as_deref(),
                Some("silverblue" | "workstation")
            )
    }
}

fn unquote(value: &str) -> String {
    let stripped = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);
    stripped.replace("\\\"", "\"").replace("\\\\", "\\")
}
