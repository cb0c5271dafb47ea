//! Error types for buildcfg-core
//!
//! Every failure belongs to one of four categories, reported by
//! [`Error::kind`]: configuration mistakes are caught before any tool runs,
//! toolchain and dependency failures stop configure, and a stage failure is
//! a tool exiting nonzero.

use buildcfg_meta::schema::PresetKind;
use std::path::PathBuf;

/// Result type for buildcfg-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Mistakes in presets, settings or the project layout.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error(transparent)]
    Presets(#[from] buildcfg_meta::Error),

    #[error("Unknown {kind} preset '{name}'")]
    PresetNotFound { kind: PresetKind, name: String },

    #[error("{kind} preset '{name}' inherits unknown preset '{parent}'")]
    ParentNotFound {
        kind: PresetKind,
        name: String,
        parent: String,
    },

    #[error("{kind} preset '{name}' is hidden and can only be inherited")]
    HiddenPreset { kind: PresetKind, name: String },

    #[error("Inheritance cycle in {kind} presets: {}", path.join(" -> "))]
    InheritanceCycle { kind: PresetKind, path: Vec<String> },

    #[error("{kind} preset '{name}' is not enabled on this host (condition is false)")]
    ConditionNotMet { kind: PresetKind, name: String },

    #[error("Preset '{preset}' does not resolve a {field}")]
    MissingField { preset: String, field: String },

    #[error("Unknown macro '{name}' in preset '{preset}'")]
    UnknownMacro { preset: String, name: String },

    #[error("Invalid regex '{pattern}' in preset '{preset}': {message}")]
    InvalidRegex {
        preset: String,
        pattern: String,
        message: String,
    },

    #[error(
        "Preset '{preset}' requests sanitizers ({}) together with an optimized build ({reason})",
        sanitizers.join(", ")
    )]
    SanitizerWithOptimization {
        preset: String,
        sanitizers: Vec<String>,
        reason: String,
    },

    #[error("In-source build refused for {binary_dir}: {reason}")]
    InSourceBuild { binary_dir: PathBuf, reason: String },

    #[error("Workflow '{workflow}' is invalid: {reason}")]
    InvalidWorkflow { workflow: String, reason: String },

    #[error(
        "Workflow '{workflow}' step '{step}' uses configure preset '{found}', expected '{expected}'"
    )]
    ConfigurePresetMismatch {
        workflow: String,
        step: String,
        expected: String,
        found: String,
    },

    #[error("Invalid settings in {path}: {message}")]
    Settings { path: PathBuf, message: String },
}

/// Errors that can occur in buildcfg-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Toolchain error: {0}")]
    Toolchain(#[from] buildcfg_toolchain::Error),

    #[error("Dependency resolution error: {0}")]
    DependencyResolution(#[from] buildcfg_deps::Error),

    #[error("{stage} stage failed: {command} exited with {}", code.map(|c| c.to_string()).unwrap_or_else(|| "a signal".to_string()))]
    StageFailure {
        stage: String,
        command: String,
        code: Option<i32>,
    },

    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Fs(#[from] buildcfg_fs::Error),
}

impl From<buildcfg_meta::Error> for Error {
    fn from(err: buildcfg_meta::Error) -> Self {
        Self::Configuration(ConfigurationError::Presets(err))
    }
}

/// Error category, as reported to the invoking process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Toolchain,
    DependencyResolution,
    StageFailure,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Toolchain(e) if e.is_configuration() => ErrorKind::Configuration,
            Self::Toolchain(_) => ErrorKind::Toolchain,
            Self::DependencyResolution(_) => ErrorKind::DependencyResolution,
            Self::StageFailure { .. } => ErrorKind::StageFailure,
            Self::Spawn { .. } | Self::Fs(_) => ErrorKind::Io,
        }
    }

    /// Exit code of the external tool behind this error, if one ran.
    pub fn tool_exit_code(&self) -> Option<i32> {
        match self {
            Self::StageFailure { code, .. } => *code,
            Self::DependencyResolution(e) => e.exit_code(),
            _ => None,
        }
    }
}
