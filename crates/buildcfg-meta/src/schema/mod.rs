//! Serde schemas for preset, manifest and registry documents

pub mod baseline;
pub mod condition;
pub mod file;
pub mod manifest;
pub mod pin;
pub mod preset;

pub use baseline::{BaselineDatabase, BaselineEntry};
pub use condition::{Condition, ConditionExpr};
pub use file::{CMakeVersion, PresetFile};
pub use manifest::{Dependency, DependencyManifest, DependencySpec, VersionOverride};
pub use pin::{Registry, RegistryKind, RegistryPin, is_commit_id};
pub use preset::{
    BuildPreset, CacheValue, ConfigurePreset, OneOrMany, PackagePreset, PresetKind, StepKind,
    TestExecution, TestFilter, TestFilterInclude, TestOutput, TestPreset, TypedValue, WorkflowPreset,
    WorkflowStep,
};
