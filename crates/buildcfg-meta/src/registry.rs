//! In-memory registry of every preset visible from a source tree

use crate::schema::{
    BuildPreset, ConfigurePreset, PackagePreset, PresetFile, PresetKind, TestPreset,
    WorkflowPreset,
};
use crate::{Error, Result};
use buildcfg_fs::NormalizedPath;

/// A preset plus the directory of the file that declared it.
///
/// `${fileDir}` expands to `file_dir`, so it has to survive includes.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetEntry<T> {
    pub preset: T,
    pub file_dir: NormalizedPath,
    /// Declared in `CMakeUserPresets.json` or one of its includes.
    pub user: bool,
}

/// Presets from `CMakePresets.json`, `CMakeUserPresets.json` and all files
/// they include, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct PresetRegistry {
    source_dir: NormalizedPath,
    configure: Vec<PresetEntry<ConfigurePreset>>,
    build: Vec<PresetEntry<BuildPreset>>,
    test: Vec<PresetEntry<TestPreset>>,
    package: Vec<PresetEntry<PackagePreset>>,
    workflow: Vec<PresetEntry<WorkflowPreset>>,
}

fn push_unique<T>(
    table: &mut Vec<PresetEntry<T>>,
    items: Vec<T>,
    name_of: fn(&T) -> &str,
    kind: PresetKind,
    file_dir: &NormalizedPath,
    path: &NormalizedPath,
    user: bool,
) -> Result<()> {
    for preset in items {
        let name = name_of(&preset);
        if table.iter().any(|e| name_of(&e.preset) == name) {
            return Err(Error::DuplicatePreset {
                kind: kind.to_string(),
                name: name.to_string(),
                path: path.to_native(),
            });
        }
        table.push(PresetEntry {
            preset,
            file_dir: file_dir.clone(),
            user,
        });
    }
    Ok(())
}

impl PresetRegistry {
    pub fn new(source_dir: NormalizedPath) -> Self {
        Self {
            source_dir,
            ..Default::default()
        }
    }

    pub fn source_dir(&self) -> &NormalizedPath {
        &self.source_dir
    }

    /// Add every preset of a parsed file. Names must be unique per kind
    /// across all files.
    pub fn add_file(&mut self, path: &NormalizedPath, file: PresetFile, user: bool) -> Result<()> {
        let file_dir = path.parent().unwrap_or_else(|| self.source_dir.clone());

        push_unique(
            &mut self.configure,
            file.configure_presets,
            |p| p.name.as_str(),
            PresetKind::Configure,
            &file_dir,
            path,
            user,
        )?;
        push_unique(
            &mut self.build,
            file.build_presets,
            |p| p.name.as_str(),
            PresetKind::Build,
            &file_dir,
            path,
            user,
        )?;
        push_unique(
            &mut self.test,
            file.test_presets,
            |p| p.name.as_str(),
            PresetKind::Test,
            &file_dir,
            path,
            user,
        )?;
        push_unique(
            &mut self.package,
            file.package_presets,
            |p| p.name.as_str(),
            PresetKind::Package,
            &file_dir,
            path,
            user,
        )?;
        push_unique(
            &mut self.workflow,
            file.workflow_presets,
            |p| p.name.as_str(),
            PresetKind::Workflow,
            &file_dir,
            path,
            user,
        )?;
        Ok(())
    }

    pub fn configure(&self, name: &str) -> Option<&PresetEntry<ConfigurePreset>> {
        self.configure.iter().find(|e| e.preset.name == name)
    }

    pub fn build(&self, name: &str) -> Option<&PresetEntry<BuildPreset>> {
        self.build.iter().find(|e| e.preset.name == name)
    }

    pub fn test(&self, name: &str) -> Option<&PresetEntry<TestPreset>> {
        self.test.iter().find(|e| e.preset.name == name)
    }

    pub fn package(&self, name: &str) -> Option<&PresetEntry<PackagePreset>> {
        self.package.iter().find(|e| e.preset.name == name)
    }

    pub fn workflow(&self, name: &str) -> Option<&PresetEntry<WorkflowPreset>> {
        self.workflow.iter().find(|e| e.preset.name == name)
    }

    pub fn configure_presets(&self) -> &[PresetEntry<ConfigurePreset>] {
        &self.configure
    }

    pub fn build_presets(&self) -> &[PresetEntry<BuildPreset>] {
        &self.build
    }

    pub fn test_presets(&self) -> &[PresetEntry<TestPreset>] {
        &self.test
    }

    pub fn package_presets(&self) -> &[PresetEntry<PackagePreset>] {
        &self.package
    }

    pub fn workflow_presets(&self) -> &[PresetEntry<WorkflowPreset>] {
        &self.workflow
    }

    /// Names of one kind in declaration order, optionally including hidden ones.
    pub fn names(&self, kind: PresetKind, include_hidden: bool) -> Vec<String> {
        fn visible<T>(
            table: &[PresetEntry<T>],
            include_hidden: bool,
            parts: fn(&T) -> (&str, bool),
        ) -> Vec<String> {
            table
                .iter()
                .map(|e| parts(&e.preset))
                .filter(|(_, hidden)| include_hidden || !hidden)
                .map(|(name, _)| name.to_string())
                .collect()
        }

        match kind {
            PresetKind::Configure => {
                visible(&self.configure, include_hidden, |p| (p.name.as_str(), p.hidden))
            }
            PresetKind::Build => visible(&self.build, include_hidden, |p| (p.name.as_str(), p.hidden)),
            PresetKind::Test => visible(&self.test, include_hidden, |p| (p.name.as_str(), p.hidden)),
            PresetKind::Package => {
                visible(&self.package, include_hidden, |p| (p.name.as_str(), p.hidden))
            }
            PresetKind::Workflow => visible(&self.workflow, include_hidden, |p| (p.name.as_str(), false)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.configure.is_empty()
            && self.build.is_empty()
            && self.test.is_empty()
            && self.package.is_empty()
            && self.workflow.is_empty()
    }
}
