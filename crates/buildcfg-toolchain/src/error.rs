//! Error types for buildcfg-toolchain

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Filesystem error: {0}")]
    Fs(#[from] buildcfg_fs::Error),

    #[error("No usable {tool} found (searched: {})", searched.join(", "))]
    MissingCompiler { tool: String, searched: Vec<String> },

    #[error("Inconsistent sysroot: CMAKE_SYSROOT is {sysroot} but CMAKE_FIND_ROOT_PATH is {find_root_path}")]
    InconsistentSysroot {
        sysroot: String,
        find_root_path: String,
    },

    #[error("Chain-loaded toolchain file not found: {path}")]
    ChainloadNotFound { path: PathBuf },

    #[error("Unbalanced parentheses in {path} at line {line}")]
    UnbalancedParens { path: PathBuf, line: usize },

    #[error("Unterminated quoted argument in {path} at line {line}")]
    UnterminatedQuote { path: PathBuf, line: usize },

    #[error("Unknown triplet '{name}': no overlay definition and not a built-in triplet")]
    UnknownTriplet { name: String },

    #[error("Ambiguous triplet '{name}': defined in {}", candidates.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", "))]
    AmbiguousTriplet {
        name: String,
        candidates: Vec<PathBuf>,
    },

    #[error("Triplet file {path} does not set {variable}")]
    IncompleteTriplet { path: PathBuf, variable: String },
}

impl Error {
    /// Triplet lookup failures are configuration mistakes rather than
    /// toolchain problems.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownTriplet { .. } | Self::AmbiguousTriplet { .. } | Self::IncompleteTriplet { .. }
        )
    }
}
