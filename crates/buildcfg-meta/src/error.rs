//! Error types for buildcfg-meta

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Filesystem error: {0}")]
    Fs(#[from] buildcfg_fs::Error),

    #[error("No preset file found at {path}")]
    PresetsNotFound { path: PathBuf },

    #[error("Unsupported preset file version {version} in {path} (supported: {min}..={max})")]
    UnsupportedVersion {
        path: PathBuf,
        version: u32,
        min: u32,
        max: u32,
    },

    #[error("{feature} in {path} requires preset file version {required}, found {version}")]
    FeatureRequiresVersion {
        path: PathBuf,
        feature: String,
        required: u32,
        version: u32,
    },

    #[error("Include cycle detected: {}", chain.join(" -> "))]
    IncludeCycle { chain: Vec<String> },

    #[error("Duplicate {kind} preset '{name}' in {path}")]
    DuplicatePreset {
        kind: String,
        name: String,
        path: PathBuf,
    },

    #[error("Invalid baseline '{baseline}': expected a 40-character commit id")]
    InvalidBaseline { baseline: String },
}
