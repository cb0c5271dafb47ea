//! Loader for the documents of a source tree
//!
//! ```text
//! <source>/
//!   CMakePresets.json          checked-in presets, may `include` others
//!   CMakeUserPresets.json      developer presets, loaded after the above
//!   vcpkg.json                 dependency manifest
//!   vcpkg-configuration.json   registry pin
//! ```

use crate::registry::PresetRegistry;
use crate::schema::file::{INCLUDE_VERSION, MAX_VERSION, MIN_VERSION, WORKFLOW_VERSION};
use crate::schema::{BaselineDatabase, DependencyManifest, PresetFile, RegistryPin};
use crate::{Error, Result};
use buildcfg_fs::{ConfigStore, NormalizedPath, ProjectFile};
use std::collections::HashSet;

/// Reads preset files, following `include` chains.
#[derive(Debug, Default)]
pub struct PresetLoader {
    store: ConfigStore,
}

impl PresetLoader {
    pub fn new() -> Self {
        Self {
            store: ConfigStore::new(),
        }
    }

    /// Load `CMakePresets.json` and `CMakeUserPresets.json` from `source_dir`.
    ///
    /// At least one of the two files must exist. A file reached through
    /// more than one include path is only loaded once; a file that includes
    /// itself, directly or not, is an error.
    pub fn load(&self, source_dir: &NormalizedPath) -> Result<PresetRegistry> {
        let presets = source_dir.join(ProjectFile::Presets.as_str());
        let user_presets = source_dir.join(ProjectFile::UserPresets.as_str());

        if !presets.is_file() && !user_presets.is_file() {
            return Err(Error::PresetsNotFound {
                path: presets.to_native(),
            });
        }

        let mut registry = PresetRegistry::new(source_dir.clone());
        let mut loaded = HashSet::new();

        if presets.is_file() {
            self.load_file(&presets, false, &mut Vec::new(), &mut loaded, &mut registry)?;
        }
        if user_presets.is_file() {
            self.load_file(&user_presets, true, &mut Vec::new(), &mut loaded, &mut registry)?;
        }

        tracing::debug!(
            source = %source_dir,
            configure = registry.configure_presets().len(),
            build = registry.build_presets().len(),
            test = registry.test_presets().len(),
            package = registry.package_presets().len(),
            workflow = registry.workflow_presets().len(),
            "Loaded preset registry"
        );

        Ok(registry)
    }

    fn load_file(
        &self,
        path: &NormalizedPath,
        user: bool,
        stack: &mut Vec<NormalizedPath>,
        loaded: &mut HashSet<NormalizedPath>,
        registry: &mut PresetRegistry,
    ) -> Result<()> {
        if stack.contains(path) {
            let mut chain: Vec<String> = stack.iter().map(|p| p.to_string()).collect();
            chain.push(path.to_string());
            return Err(Error::IncludeCycle { chain });
        }
        if !loaded.insert(path.clone()) {
            tracing::debug!(path = %path, "Preset file already loaded, skipping");
            return Ok(());
        }

        let mut file: PresetFile = self.store.load(path)?;
        check_version(path, &file)?;
        tracing::debug!(path = %path, version = file.version, "Read preset file");

        let dir = path.parent().unwrap_or_else(|| registry.source_dir().clone());
        let includes = std::mem::take(&mut file.include);

        stack.push(path.clone());
        for include in &includes {
            let target = dir.join(include);
            if !target.is_file() {
                return Err(Error::PresetsNotFound {
                    path: target.to_native(),
                });
            }
            self.load_file(&target, user, stack, loaded, registry)?;
        }
        stack.pop();

        registry.add_file(path, file, user)
    }
}

fn check_version(path: &NormalizedPath, file: &PresetFile) -> Result<()> {
    if !(MIN_VERSION..=MAX_VERSION).contains(&file.version) {
        return Err(Error::UnsupportedVersion {
            path: path.to_native(),
            version: file.version,
            min: MIN_VERSION,
            max: MAX_VERSION,
        });
    }
    if !file.include.is_empty() && file.version < INCLUDE_VERSION {
        return Err(Error::FeatureRequiresVersion {
            path: path.to_native(),
            feature: "include".to_string(),
            required: INCLUDE_VERSION,
            version: file.version,
        });
    }
    if !file.workflow_presets.is_empty() && file.version < WORKFLOW_VERSION {
        return Err(Error::FeatureRequiresVersion {
            path: path.to_native(),
            feature: "workflowPresets".to_string(),
            required: WORKFLOW_VERSION,
            version: file.version,
        });
    }
    Ok(())
}

/// Load every preset visible from `source_dir`.
pub fn load_project(source_dir: &NormalizedPath) -> Result<PresetRegistry> {
    PresetLoader::new().load(source_dir)
}

/// Load `vcpkg.json` if the source tree has one.
pub fn load_manifest(source_dir: &NormalizedPath) -> Result<Option<DependencyManifest>> {
    load_optional(&source_dir.join(ProjectFile::DependencyManifest.as_str()))
}

/// Load `vcpkg-configuration.json` if the source tree has one.
pub fn load_registry_pin(source_dir: &NormalizedPath) -> Result<Option<RegistryPin>> {
    load_optional(&source_dir.join(ProjectFile::RegistryPin.as_str()))
}

/// Load `versions/baseline.json` from a registry checkout.
pub fn load_baseline(registry_root: &NormalizedPath) -> Result<BaselineDatabase> {
    let path = registry_root.join("versions/baseline.json");
    Ok(ConfigStore::new().load(&path)?)
}

fn load_optional<T: serde::de::DeserializeOwned>(path: &NormalizedPath) -> Result<Option<T>> {
    if !path.is_file() {
        return Ok(None);
    }
    Ok(Some(ConfigStore::new().load(path)?))
}
