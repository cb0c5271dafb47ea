//! Running configure, build, test and package
//!
//! - [`commands`]: the tool command line for each stage
//! - [`executor`]: how commands are run
//! - [`state`]: the stage order and workflow state machine
//! - [`runner`]: the [`StageRunner`] tying resolution, guardrails, the
//!   toolchain and dependencies to the executor

pub mod commands;
pub mod executor;
pub mod runner;
pub mod state;

pub use commands::CommandSpec;
pub use executor::{CommandExecutor, CommandOutcome, ProcessExecutor, RecordingExecutor};
pub use runner::{INSTALLED_DIR, StageReport, StageRunner, StageStatus, WorkflowReport};
pub use state::{Stage, WorkflowState};
