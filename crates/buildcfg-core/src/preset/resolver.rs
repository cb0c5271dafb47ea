//! Preset resolution
//!
//! Resolution is pure: it reads the in-memory registry and the host
//! snapshot, and never touches the filesystem.

use super::effective::{
    EffectiveBuild, EffectiveConfig, EffectivePackage, EffectiveTest, PlannedStep, WorkflowPlan,
};
use super::inherit::{Inheritable, merge_chain};
use crate::condition::evaluate;
use crate::error::ConfigurationError;
use crate::guard::{is_truthy, validate_effective};
use crate::host::HostContext;
use crate::macros::{MacroContext, expand};
use crate::Result;
use buildcfg_fs::NormalizedPath;
use buildcfg_meta::PresetRegistry;
use buildcfg_meta::schema::{
    BuildPreset, CacheValue, ConfigurePreset, PackagePreset, PresetKind, StepKind, TestPreset,
    TypedValue,
};
use std::collections::BTreeMap;

pub const TOOLCHAIN_FILE_VAR: &str = "CMAKE_TOOLCHAIN_FILE";
pub const BUILD_TYPE_VAR: &str = "CMAKE_BUILD_TYPE";
pub const INSTALL_PREFIX_VAR: &str = "CMAKE_INSTALL_PREFIX";
pub const TRIPLET_VAR: &str = "VCPKG_TARGET_TRIPLET";
pub const CHAINLOAD_VAR: &str = "VCPKG_CHAINLOAD_TOOLCHAIN_FILE";
pub const OVERLAY_TRIPLETS_VAR: &str = "VCPKG_OVERLAY_TRIPLETS";
pub const MANIFEST_MODE_VAR: &str = "VCPKG_MANIFEST_MODE";

/// Resolves preset names from one registry into effective records.
pub struct PresetResolver<'a> {
    registry: &'a PresetRegistry,
    host: &'a HostContext,
    default_triplet: Option<String>,
}

impl<'a> PresetResolver<'a> {
    pub fn new(registry: &'a PresetRegistry, host: &'a HostContext) -> Self {
        Self {
            registry,
            host,
            default_triplet: None,
        }
    }

    /// Triplet used when a preset does not set `VCPKG_TARGET_TRIPLET`.
    pub fn with_default_triplet(mut self, triplet: Option<String>) -> Self {
        self.default_triplet = triplet;
        self
    }

    pub fn registry(&self) -> &PresetRegistry {
        self.registry
    }

    /// Same as [`resolve_configure`](Self::resolve_configure).
    pub fn resolve(&self, name: &str) -> Result<EffectiveConfig> {
        self.resolve_configure(name)
    }

    pub fn resolve_configure(&self, name: &str) -> Result<EffectiveConfig> {
        let (preset, file_dir) = self.select::<ConfigurePreset>(name)?;
        let source_dir = self.registry.source_dir();

        let base = MacroContext {
            source_dir,
            file_dir,
            preset_name: name,
            generator: preset.generator.as_deref(),
            host: self.host,
            preset_env: None,
        };
        let environment = expand_environment(&BTreeMap::new(), &preset.environment, &base)?;
        let context = base.with_preset_env(&environment);
        check_condition(&preset, &context)?;

        let mut cache_variables = BTreeMap::new();
        for (key, value) in &preset.cache_variables {
            let Some(value) = value else { continue };
            let expanded = match value {
                CacheValue::Bool(_)
                | CacheValue::Typed {
                    value: TypedValue::Bool(_),
                    ..
                } => value.clone(),
                _ => value.with_value(expand(&value.as_string(), &context)?),
            };
            cache_variables.insert(key.clone(), expanded);
        }
        let cache = |key: &str| {
            cache_variables
                .get(key)
                .map(CacheValue::as_string)
        };
        let path = |value: &str| -> std::result::Result<NormalizedPath, ConfigurationError> {
            Ok(source_dir.join(&expand(value, &context)?))
        };
        let missing = |field: &str| ConfigurationError::MissingField {
            preset: name.to_string(),
            field: field.to_string(),
        };

        let binary_dir = preset
            .binary_dir
            .as_deref()
            .map(path)
            .transpose()?
            .ok_or_else(|| missing("binary directory"))?;
        let install_dir = preset.install_dir.as_deref().map(path).transpose()?;
        let toolchain_file = match preset.toolchain_file.as_deref() {
            Some(file) => path(file)?,
            None => cache(TOOLCHAIN_FILE_VAR)
                .map(|file| source_dir.join(&file))
                .ok_or_else(|| missing("toolchain file"))?,
        };
        let build_type = cache(BUILD_TYPE_VAR).ok_or_else(|| missing("build type"))?;
        let triplet = cache(TRIPLET_VAR)
            .or_else(|| self.default_triplet.clone())
            .ok_or_else(|| missing("triplet"))?;
        let chainload_toolchain_file = cache(CHAINLOAD_VAR)
            .filter(|file| !file.is_empty())
            .map(|file| source_dir.join(&file));
        let overlay_triplets = cache(OVERLAY_TRIPLETS_VAR)
            .map(|dirs| {
                dirs.split(';')
                    .filter(|d| !d.is_empty())
                    .map(|d| source_dir.join(d))
                    .collect()
            })
            .unwrap_or_default();
        let manifest_mode = cache(MANIFEST_MODE_VAR).is_none_or(|v| is_truthy(&v));

        cache_variables.insert(
            TOOLCHAIN_FILE_VAR.to_string(),
            CacheValue::from(toolchain_file.as_str()),
        );
        cache_variables.insert(TRIPLET_VAR.to_string(), CacheValue::from(triplet.as_str()));
        if let Some(install_dir) = &install_dir {
            cache_variables
                .entry(INSTALL_PREFIX_VAR.to_string())
                .or_insert_with(|| CacheValue::from(install_dir.as_str()));
        }

        let config = EffectiveConfig {
            preset: name.to_string(),
            source_dir: source_dir.clone(),
            binary_dir,
            install_dir,
            generator: preset.generator.clone(),
            toolchain_file,
            chainload_toolchain_file,
            build_type,
            triplet,
            overlay_triplets,
            cache_variables,
            environment,
            manifest_mode,
        };
        validate_effective(&config)?;

        tracing::debug!(
            preset = name,
            triplet = %config.triplet,
            build_type = %config.build_type,
            binary_dir = %config.binary_dir,
            "Resolved configure preset"
        );
        Ok(config)
    }

    pub fn resolve_build(&self, name: &str) -> Result<EffectiveBuild> {
        let (preset, file_dir) = self.select::<BuildPreset>(name)?;
        let configure = self.configure_for(name, preset.configure_preset.as_deref())?;
        let environment = self.stage_environment(&preset, &preset.environment, &configure, file_dir)?;

        Ok(EffectiveBuild {
            preset: name.to_string(),
            configuration: preset.configuration.clone(),
            targets: preset.targets.as_ref().map(|t| t.to_vec()).unwrap_or_default(),
            jobs: preset.jobs,
            clean_first: preset.clean_first.unwrap_or(false),
            environment,
            configure,
        })
    }

    pub fn resolve_test(&self, name: &str) -> Result<EffectiveTest> {
        let (preset, file_dir) = self.select::<TestPreset>(name)?;
        let configure = self.configure_for(name, preset.configure_preset.as_deref())?;
        let environment = self.stage_environment(&preset, &preset.environment, &configure, file_dir)?;

        let output = preset.output.clone().unwrap_or_default();
        let include = preset
            .filter
            .as_ref()
            .and_then(|f| f.include.clone())
            .unwrap_or_default();
        let execution = preset.execution.clone().unwrap_or_default();

        Ok(EffectiveTest {
            preset: name.to_string(),
            configuration: preset.configuration.clone(),
            output_on_failure: output.output_on_failure.unwrap_or(false),
            verbosity: output.verbosity,
            include_name: include.name,
            include_label: include.label,
            jobs: execution.jobs,
            stop_on_failure: execution.stop_on_failure.unwrap_or(false),
            environment,
            configure,
        })
    }

    pub fn resolve_package(&self, name: &str) -> Result<EffectivePackage> {
        let (preset, file_dir) = self.select::<PackagePreset>(name)?;
        let configure = self.configure_for(name, preset.configure_preset.as_deref())?;
        let environment = self.stage_environment(&preset, &preset.environment, &configure, file_dir)?;

        let context = MacroContext {
            source_dir: self.registry.source_dir(),
            file_dir,
            preset_name: name,
            generator: configure.generator.as_deref(),
            host: self.host,
            preset_env: Some(&environment),
        };
        let package_directory = preset
            .package_directory
            .as_deref()
            .map(|dir| {
                expand(dir, &context).map(|dir| self.registry.source_dir().join(&dir))
            })
            .transpose()?;

        Ok(EffectivePackage {
            preset: name.to_string(),
            generators: preset.generators.clone().unwrap_or_default(),
            configurations: preset.configurations.clone().unwrap_or_default(),
            package_directory,
            environment,
            configure,
        })
    }

    /// Resolve every step of a workflow and check that the steps form a
    /// valid sequence over a single configure preset.
    pub fn resolve_workflow(&self, name: &str) -> Result<WorkflowPlan> {
        let entry = self
            .registry
            .workflow(name)
            .ok_or_else(|| ConfigurationError::PresetNotFound {
                kind: PresetKind::Workflow,
                name: name.to_string(),
            })?;
        let workflow = &entry.preset;
        let invalid = |reason: String| ConfigurationError::InvalidWorkflow {
            workflow: name.to_string(),
            reason,
        };

        let Some(first) = workflow.steps.first() else {
            return Err(invalid("it has no steps".to_string()).into());
        };
        if first.kind != StepKind::Configure {
            return Err(invalid("the first step must be a configure step".to_string()).into());
        }

        let mut steps = Vec::with_capacity(workflow.steps.len());
        let mut previous = StepKind::Configure;
        for (index, step) in workflow.steps.iter().enumerate() {
            if index > 0 && step.kind == StepKind::Configure {
                return Err(invalid(format!(
                    "configure step '{}' is not the first step",
                    step.name
                ))
                .into());
            }
            if step_order(step.kind) < step_order(previous) {
                return Err(invalid(format!(
                    "{} step '{}' follows a {} step",
                    step.kind.preset_kind(),
                    step.name,
                    previous.preset_kind()
                ))
                .into());
            }
            previous = step.kind;

            let planned = match step.kind {
                StepKind::Configure => PlannedStep::Configure(self.resolve_configure(&step.name)?),
                StepKind::Build => PlannedStep::Build(self.resolve_build(&step.name)?),
                StepKind::Test => PlannedStep::Test(self.resolve_test(&step.name)?),
                StepKind::Package => PlannedStep::Package(self.resolve_package(&step.name)?),
            };
            if planned.configure_preset() != first.name {
                return Err(ConfigurationError::ConfigurePresetMismatch {
                    workflow: name.to_string(),
                    step: step.name.clone(),
                    expected: first.name.clone(),
                    found: planned.configure_preset().to_string(),
                }
                .into());
            }
            steps.push(planned);
        }

        Ok(WorkflowPlan {
            name: name.to_string(),
            steps,
        })
    }

    /// Merge a selectable preset. Only the requested preset is checked for
    /// `hidden`; its ancestors may be hidden.
    fn select<T: Inheritable + 'a>(
        &self,
        name: &str,
    ) -> std::result::Result<(T, &'a NormalizedPath), ConfigurationError> {
        let entry = T::lookup(self.registry, name).ok_or_else(|| {
            ConfigurationError::PresetNotFound {
                kind: T::KIND,
                name: name.to_string(),
            }
        })?;
        if entry.preset.hidden() {
            return Err(ConfigurationError::HiddenPreset {
                kind: T::KIND,
                name: name.to_string(),
            });
        }
        let merged = merge_chain::<T>(self.registry, name)?;
        Ok((merged, &entry.file_dir))
    }

    fn configure_for(&self, preset: &str, configure: Option<&str>) -> Result<EffectiveConfig> {
        let configure = configure.ok_or_else(|| ConfigurationError::MissingField {
            preset: preset.to_string(),
            field: "configurePreset".to_string(),
        })?;
        self.resolve_configure(configure)
    }

    /// The configure environment overlaid with a stage preset's own, after
    /// checking the stage preset's condition.
    fn stage_environment<T: Inheritable>(
        &self,
        preset: &T,
        own: &BTreeMap<String, Option<String>>,
        configure: &EffectiveConfig,
        file_dir: &NormalizedPath,
    ) -> std::result::Result<BTreeMap<String, String>, ConfigurationError> {
        let base = MacroContext {
            source_dir: self.registry.source_dir(),
            file_dir,
            preset_name: preset.name(),
            generator: configure.generator.as_deref(),
            host: self.host,
            preset_env: Some(&configure.environment),
        };
        let environment = expand_environment(&configure.environment, own, &base)?;
        check_condition(preset, &base.with_preset_env(&environment))?;
        Ok(environment)
    }
}

fn step_order(kind: StepKind) -> u8 {
    match kind {
        StepKind::Configure => 0,
        StepKind::Build => 1,
        StepKind::Test => 2,
        StepKind::Package => 3,
    }
}

/// `inherited` overlaid with the expanded entries of `own`; `null` removes.
fn expand_environment(
    inherited: &BTreeMap<String, String>,
    own: &BTreeMap<String, Option<String>>,
    context: &MacroContext<'_>,
) -> std::result::Result<BTreeMap<String, String>, ConfigurationError> {
    let mut environment = inherited.clone();
    for (key, value) in own {
        match value {
            Some(value) => {
                environment.insert(key.clone(), expand(value, context)?);
            }
            None => {
                environment.remove(key);
            }
        }
    }
    Ok(environment)
}

fn check_condition<T: Inheritable>(
    preset: &T,
    context: &MacroContext<'_>,
) -> std::result::Result<(), ConfigurationError> {
    let Some(condition) = preset.condition() else {
        return Ok(());
    };
    if evaluate(condition, context)? {
        return Ok(());
    }
    Err(ConfigurationError::ConditionNotMet {
        kind: T::KIND,
        name: preset.name().to_string(),
    })
}
