//! Command implementations for buildcfg-cli

pub mod deps;
pub mod init;
pub mod inspect;
pub mod stage;

pub use deps::{run_plan, run_request};
pub use init::run_init;
pub use inspect::{run_list, run_show, run_toolchain};
pub use stage::{run_stage, run_workflow};
