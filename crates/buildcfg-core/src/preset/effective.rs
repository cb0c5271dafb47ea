//! Fully resolved presets

use buildcfg_fs::NormalizedPath;
use buildcfg_meta::schema::{CacheValue, StepKind};
use serde::Serialize;
use std::collections::BTreeMap;

/// A configure preset after inheritance, condition and macro expansion.
///
/// This record is what every later stage receives; nothing downstream
/// re-reads the preset files.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveConfig {
    pub preset: String,
    pub source_dir: NormalizedPath,
    pub binary_dir: NormalizedPath,
    pub install_dir: Option<NormalizedPath>,
    pub generator: Option<String>,
    pub toolchain_file: NormalizedPath,
    pub chainload_toolchain_file: Option<NormalizedPath>,
    pub build_type: String,
    pub triplet: String,
    pub overlay_triplets: Vec<NormalizedPath>,
    /// Everything passed as `-D` at configure time, including the
    /// toolchain file, triplet and install prefix.
    pub cache_variables: BTreeMap<String, CacheValue>,
    pub environment: BTreeMap<String, String>,
    /// `false` when `VCPKG_MANIFEST_MODE` turns dependency resolution off.
    pub manifest_mode: bool,
}

impl EffectiveConfig {
    pub fn cache_value(&self, name: &str) -> Option<String> {
        self.cache_variables.get(name).map(CacheValue::as_string)
    }

    /// Cache variables as plain strings.
    pub fn cache_strings(&self) -> BTreeMap<String, String> {
        self.cache_variables
            .iter()
            .map(|(k, v)| (k.clone(), v.as_string()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveBuild {
    pub preset: String,
    pub configure: EffectiveConfig,
    pub configuration: Option<String>,
    pub targets: Vec<String>,
    pub jobs: Option<u32>,
    pub clean_first: bool,
    /// The configure preset's environment overlaid with the build preset's.
    pub environment: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveTest {
    pub preset: String,
    pub configure: EffectiveConfig,
    pub configuration: Option<String>,
    pub output_on_failure: bool,
    pub verbosity: Option<String>,
    pub include_name: Option<String>,
    pub include_label: Option<String>,
    pub jobs: Option<u32>,
    pub stop_on_failure: bool,
    pub environment: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectivePackage {
    pub preset: String,
    pub configure: EffectiveConfig,
    pub generators: Vec<String>,
    pub configurations: Vec<String>,
    pub package_directory: Option<NormalizedPath>,
    pub environment: BTreeMap<String, String>,
}

/// One resolved workflow step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PlannedStep {
    Configure(EffectiveConfig),
    Build(EffectiveBuild),
    Test(EffectiveTest),
    Package(EffectivePackage),
}

impl PlannedStep {
    pub fn kind(&self) -> StepKind {
        match self {
            Self::Configure(_) => StepKind::Configure,
            Self::Build(_) => StepKind::Build,
            Self::Test(_) => StepKind::Test,
            Self::Package(_) => StepKind::Package,
        }
    }

    pub fn preset(&self) -> &str {
        match self {
            Self::Configure(c) => &c.preset,
            Self::Build(b) => &b.preset,
            Self::Test(t) => &t.preset,
            Self::Package(p) => &p.preset,
        }
    }

    /// The configure preset this step runs against.
    pub fn configure_preset(&self) -> &str {
        match self {
            Self::Configure(c) => &c.preset,
            Self::Build(b) => &b.configure.preset,
            Self::Test(t) => &t.configure.preset,
            Self::Package(p) => &p.configure.preset,
        }
    }
}

/// A workflow whose steps are all resolved and checked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowPlan {
    pub name: String,
    pub steps: Vec<PlannedStep>,
}
