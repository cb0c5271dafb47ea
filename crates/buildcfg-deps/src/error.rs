//! Error types for buildcfg-deps

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Filesystem error: {0}")]
    Fs(#[from] buildcfg_fs::Error),

    #[error("Manifest error: {0}")]
    Meta(#[from] buildcfg_meta::Error),

    #[error("No baseline pinned: add a default-registry baseline or a builtin-baseline to the manifest")]
    MissingBaseline,

    #[error("Package '{package}' is not in the baseline at {baseline} and has no override")]
    UnknownPackage { package: String, baseline: String },

    #[error("Binary cache corruption for entry {key}: expected {expected}, found {actual}")]
    CacheCorruption {
        key: String,
        expected: String,
        actual: String,
    },

    #[error("Binary cache metadata for entry {key} is unreadable: {message}")]
    CacheMetadata { key: String, message: String },

    #[error("Invalid binary source '{spec}': {reason}")]
    InvalidBinarySource { spec: String, reason: String },

    #[error("Building {package} for {triplet} failed: {message}")]
    BuildFailed {
        package: String,
        triplet: String,
        message: String,
    },

    #[error("Dependency tool not found at {path}")]
    ToolNotFound { path: PathBuf },

    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {}: {stderr}", code.map(|c| c.to_string()).unwrap_or_else(|| "a signal".to_string()))]
    ToolFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

impl Error {
    /// Exit code reported by the external tool, when it ran.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ToolFailed { code, .. } => *code,
            _ => None,
        }
    }
}
