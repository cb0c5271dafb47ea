//! Preset resolution: inheritance, conditions, macros, effective records

mod effective;
mod inherit;
mod resolver;

pub use effective::{
    EffectiveBuild, EffectiveConfig, EffectivePackage, EffectiveTest, PlannedStep, WorkflowPlan,
};
pub use inherit::{Inheritable, merge_chain};
pub use resolver::{
    BUILD_TYPE_VAR, CHAINLOAD_VAR, INSTALL_PREFIX_VAR, MANIFEST_MODE_VAR, OVERLAY_TRIPLETS_VAR,
    PresetResolver, TOOLCHAIN_FILE_VAR, TRIPLET_VAR,
};
