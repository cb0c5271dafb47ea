//! ToolchainProvider trait and related types

use crate::Result;
use crate::host::Host;
use crate::state::{ToolchainField, ToolchainState};
use crate::triplet::Triplet;
use buildcfg_fs::NormalizedPath;
use serde::Serialize;
use std::collections::BTreeMap;

/// Directories searched for compilers when settings do not override them.
pub const DEFAULT_SEARCH_DIRS: &[&str] = &[
    "/usr/bin",
    "/usr/local/bin",
    "/opt/homebrew/bin",
    "/opt/local/bin",
];

/// Everything a provider may read. Providers never read process state
/// directly, so the same inputs always give the same toolchain.
#[derive(Debug, Clone)]
pub struct ToolchainContext {
    /// Cache variables of the effective configuration.
    pub cache_variables: BTreeMap<String, String>,
    /// Host environment overlaid with the preset's environment.
    pub environment: BTreeMap<String, String>,
    pub chainload_toolchain_file: Option<NormalizedPath>,
    pub triplet: Option<Triplet>,
    pub host: Host,
    pub search_dirs: Vec<NormalizedPath>,
}

impl ToolchainContext {
    pub fn new(host: Host) -> Self {
        Self {
            cache_variables: BTreeMap::new(),
            environment: BTreeMap::new(),
            chainload_toolchain_file: None,
            triplet: None,
            host,
            search_dirs: DEFAULT_SEARCH_DIRS
                .iter()
                .map(|dir| NormalizedPath::new(dir))
                .collect(),
        }
    }

    pub fn cache_variable(&self, name: &str) -> Option<&str> {
        self.cache_variables
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn env(&self, name: &str) -> Option<&str> {
        self.environment
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// What one provider contributed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderReport {
    pub provider: String,
    pub filled: Vec<ToolchainField>,
}

impl ProviderReport {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            filled: vec![],
        }
    }

    /// Fill through `state` and record the field when it took.
    pub fn fill(
        &mut self,
        state: &mut ToolchainState,
        field: ToolchainField,
        value: impl Into<String>,
    ) {
        if state.fill(field, value, self.provider.clone()) {
            tracing::debug!(provider = %self.provider, %field, "Filled toolchain field");
            self.filled.push(field);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.filled.is_empty()
    }
}

/// One step of the chain-loader. A provider may only fill fields that are
/// still unset; [`ToolchainState::fill`] enforces that.
pub trait ToolchainProvider: Send + Sync {
    fn id(&self) -> &str;
    fn provide(&self, context: &ToolchainContext, state: &mut ToolchainState)
    -> Result<ProviderReport>;
}

#[cfg(unix)]
pub(crate) fn is_executable(path: &NormalizedPath) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path.to_native())
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub(crate) fn is_executable(path: &NormalizedPath) -> bool {
    path.is_file()
}
