//! Stage ordering and the workflow state machine

use crate::error::ConfigurationError;
use buildcfg_meta::schema::StepKind;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Configure,
    Build,
    Test,
    Package,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configure => "configure",
            Self::Build => "build",
            Self::Test => "test",
            Self::Package => "package",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<StepKind> for Stage {
    fn from(kind: StepKind) -> Self {
        match kind {
            StepKind::Configure => Self::Configure,
            StepKind::Build => Self::Build,
            StepKind::Test => Self::Test,
            StepKind::Package => Self::Package,
        }
    }
}

/// Where a workflow run stands.
///
/// Moves only forward: `NotStarted -> Configuring -> Building -> Testing ->
/// Packaging -> Succeeded`, skipping stages a workflow does not have, or to
/// `Failed` from any running stage. A later step of the same stage keeps
/// the state where it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowState {
    NotStarted,
    Configuring,
    Building,
    Testing,
    Packaging,
    Succeeded,
    Failed,
}

impl WorkflowState {
    fn running(stage: Stage) -> Self {
        match stage {
            Stage::Configure => Self::Configuring,
            Stage::Build => Self::Building,
            Stage::Test => Self::Testing,
            Stage::Package => Self::Packaging,
        }
    }

    /// The stage being run, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Configuring => Some(Stage::Configure),
            Self::Building => Some(Stage::Build),
            Self::Testing => Some(Stage::Test),
            Self::Packaging => Some(Stage::Package),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Enter `stage`.
    pub fn advance(self, stage: Stage) -> Result<Self, ConfigurationError> {
        let allowed = match (self, self.stage()) {
            (Self::NotStarted, _) => stage == Stage::Configure,
            (_, Some(current)) => stage > current || (stage == current && stage != Stage::Configure),
            _ => false,
        };
        if !allowed {
            return Err(ConfigurationError::InvalidWorkflow {
                workflow: String::new(),
                reason: format!("cannot enter the {stage} stage from {self:?}"),
            });
        }
        tracing::debug!(from = ?self, to = %stage, "Workflow state change");
        Ok(Self::running(stage))
    }

    /// All stages done.
    pub fn succeed(self) -> Result<Self, ConfigurationError> {
        if self.stage().is_none() {
            return Err(ConfigurationError::InvalidWorkflow {
                workflow: String::new(),
                reason: format!("cannot succeed from {self:?}"),
            });
        }
        Ok(Self::Succeeded)
    }

    /// The running stage failed.
    pub fn fail(self) -> Self {
        if self.is_terminal() { self } else { Self::Failed }
    }
}
