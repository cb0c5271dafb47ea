//! Error types for buildcfg-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] buildcfg_core::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }

    /// Process exit status for this error: the failing tool's own code
    /// when one ran, otherwise 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Core(err) => err.tool_exit_code().filter(|code| *code != 0).unwrap_or(1),
            _ => 1,
        }
    }
}

impl From<buildcfg_meta::Error> for CliError {
    fn from(err: buildcfg_meta::Error) -> Self {
        Self::Core(err.into())
    }
}

impl From<buildcfg_core::ConfigurationError> for CliError {
    fn from(err: buildcfg_core::ConfigurationError) -> Self {
        Self::Core(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_failure_exits_with_tool_code() {
        let err = CliError::from(buildcfg_core::Error::StageFailure {
            stage: "test".into(),
            command: "ctest --test-dir build".into(),
            code: Some(8),
        });
        assert_eq!(err.exit_code(), 8);
    }

    #[test]
    fn other_errors_exit_with_one() {
        assert_eq!(CliError::user("nope").exit_code(), 1);
        let signalled = CliError::from(buildcfg_core::Error::StageFailure {
            stage: "build".into(),
            command: "cmake --build build".into(),
            code: None,
        });
        assert_eq!(signalled.exit_code(), 1);
    }
}
