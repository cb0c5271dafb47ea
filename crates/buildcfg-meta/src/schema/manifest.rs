//! `vcpkg.json` dependency manifest

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DependencyManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "version-string", alias = "version-semver")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builtin_baseline: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<VersionOverride>,
}

/// A dependency entry: a bare port name or a detailed object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dependency {
    Name(String),
    Detailed(DependencySpec),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DependencySpec {
    pub name: String,
    #[serde(rename = "version>=", default, skip_serializing_if = "Option::is_none")]
    pub minimum_version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_features: Option<bool>,
}

impl Dependency {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Detailed(spec) => &spec.name,
        }
    }

    pub fn minimum_version(&self) -> Option<&str> {
        match self {
            Self::Name(_) => None,
            Self::Detailed(spec) => spec.minimum_version.as_deref(),
        }
    }

    pub fn features(&self) -> &[String] {
        match self {
            Self::Name(_) => &[],
            Self::Detailed(spec) => &spec.features,
        }
    }
}

/// Pins a port to an exact version regardless of baseline or constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VersionOverride {
    pub name: String,
    #[serde(alias = "version-string", alias = "version-semver", alias = "version-date")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_version: Option<u32>,
}
