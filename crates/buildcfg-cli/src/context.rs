//! Source tree detection and per-invocation state
//!
//! Like `cmake --preset`, commands work from anywhere below the source
//! directory: the nearest ancestor holding a `CMakePresets.json` is used
//! unless `-S` names one.

use crate::error::{CliError, Result};
use buildcfg_core::{HostContext, PresetResolver, Settings, SettingsResolver};
use buildcfg_fs::{NormalizedPath, ProjectFile};
use buildcfg_meta::{PresetRegistry, load_project};
use std::path::{Path, PathBuf};

/// Find the source directory for `start`.
pub fn find_source_dir(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| {
            dir.join(ProjectFile::Presets.as_str()).is_file()
                || dir.join(ProjectFile::UserPresets.as_str()).is_file()
        })
        .map(Path::to_path_buf)
}

/// The explicit source dir, or the detected one.
pub fn resolve_source_dir(explicit: Option<&Path>, cwd: &Path) -> Result<NormalizedPath> {
    if let Some(dir) = explicit {
        let dir = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            cwd.join(dir)
        };
        return Ok(NormalizedPath::new(dir));
    }
    find_source_dir(cwd).map(NormalizedPath::new).ok_or_else(|| {
        CliError::user(format!(
            "No {} found in {} or any parent directory (use -S to name the source directory)",
            ProjectFile::Presets.as_str(),
            cwd.display()
        ))
    })
}

/// Everything a command needs about one source tree.
pub struct Session {
    pub source_dir: NormalizedPath,
    pub registry: PresetRegistry,
    pub settings: Settings,
    pub host: HostContext,
}

impl Session {
    pub fn load(source_dir: NormalizedPath) -> Result<Self> {
        let host = HostContext::current();
        let registry = load_project(&source_dir)?;
        if registry.is_empty() {
            tracing::warn!("No presets defined in {}", source_dir);
        }
        let settings = SettingsResolver::new(source_dir.clone())
            .with_env(host.env.clone())
            .resolve()?;
        tracing::debug!(
            vcpkg_root = %settings.vcpkg_root,
            binary_cache = %settings.binary_cache_dir,
            "Settings resolved"
        );
        Ok(Self {
            source_dir,
            registry,
            settings,
            host,
        })
    }

    pub fn resolver(&self) -> PresetResolver<'_> {
        PresetResolver::new(&self.registry, &self.host)
            .with_default_triplet(self.settings.default_triplet.clone())
    }
}
