//! `vcpkg-configuration.json` registry pin

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryKind {
    Git,
    Builtin,
    Filesystem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub kind: RegistryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<String>,
    /// Ports served by a non-default registry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RegistryPin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_registry: Option<Registry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub registries: Vec<Registry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overlay_triplets: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overlay_ports: Vec<String>,
}

impl RegistryPin {
    /// The validated baseline commit of the default registry, if one is pinned.
    pub fn default_baseline(&self) -> Result<Option<&str>> {
        match self
            .default_registry
            .as_ref()
            .and_then(|r| r.baseline.as_deref())
        {
            Some(baseline) if is_commit_id(baseline) => Ok(Some(baseline)),
            Some(baseline) => Err(Error::InvalidBaseline {
                baseline: baseline.to_string(),
            }),
            None => Ok(None),
        }
    }
}

/// A full 40-character hexadecimal commit id.
pub fn is_commit_id(value: &str) -> bool {
    value.len() == 40 && value.bytes().all(|b| b.is_ascii_hexdigit())
}
