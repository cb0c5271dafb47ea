//! Build configuration resolution and the workflow stage runner
//!
//! [`preset::PresetResolver`] turns a named preset into an
//! [`preset::EffectiveConfig`]: inheritance is merged, conditions are
//! checked, macros are expanded and guardrails are applied, all without
//! touching the filesystem. [`workflow::StageRunner`] then drives
//! configure, build, test and package through a
//! [`workflow::CommandExecutor`].
//!
//! # Modules
//!
//! - [`preset`]: inheritance and effective records
//! - [`macros`]: `${...}`, `$env{...}` and `$penv{...}` expansion
//! - [`condition`]: preset conditions
//! - [`guard`]: sanitizer and out-of-source guardrails
//! - [`settings`]: layered resolver settings
//! - [`workflow`]: stage commands, executors and the runner
//! - [`scaffold`]: `bcfg init`

pub mod condition;
pub mod error;
pub mod guard;
pub mod host;
pub mod macros;
pub mod preset;
pub mod scaffold;
pub mod settings;
pub mod workflow;

pub use error::{ConfigurationError, Error, ErrorKind, Result};
pub use host::HostContext;
pub use preset::{
    EffectiveBuild, EffectiveConfig, EffectivePackage, EffectiveTest, PlannedStep, PresetResolver,
    WorkflowPlan,
};
pub use scaffold::{InitOptions, InitReport, init};
pub use settings::{Settings, SettingsResolver};
pub use workflow::{
    CommandExecutor, CommandOutcome, CommandSpec, ProcessExecutor, RecordingExecutor, Stage,
    StageReport, StageRunner, StageStatus, WorkflowReport, WorkflowState,
};
