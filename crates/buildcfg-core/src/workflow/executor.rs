//! Running stage commands

use super::commands::CommandSpec;
use crate::{Error, Result};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::process::Command;

/// How a command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandOutcome {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
}

impl CommandOutcome {
    pub fn success() -> Self {
        Self { code: Some(0) }
    }

    pub fn exited(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs stage commands.
pub trait CommandExecutor {
    fn run(&self, command: &CommandSpec) -> Result<CommandOutcome>;
}

/// Spawns the real tool with inherited stdio, so its diagnostics reach the
/// user unmodified.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl CommandExecutor for ProcessExecutor {
    fn run(&self, command: &CommandSpec) -> Result<CommandOutcome> {
        let mut process = Command::new(&command.program);
        process.args(&command.args).envs(&command.env);
        if let Some(cwd) = &command.cwd {
            process.current_dir(cwd.to_native());
        }

        let status = process.status().map_err(|source| Error::Spawn {
            command: command.program.clone(),
            source,
        })?;
        Ok(CommandOutcome {
            code: status.code(),
        })
    }
}

/// Records every command and answers with scripted exit codes, `0` once
/// the script runs out. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    commands: RefCell<Vec<CommandSpec>>,
    exit_codes: RefCell<VecDeque<i32>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exit codes for the next commands, in order.
    pub fn with_exit_codes(codes: impl IntoIterator<Item = i32>) -> Self {
        Self {
            commands: RefCell::default(),
            exit_codes: RefCell::new(codes.into_iter().collect()),
        }
    }

    pub fn commands(&self) -> Vec<CommandSpec> {
        self.commands.borrow().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.commands
            .borrow()
            .iter()
            .map(|c| c.program.clone())
            .collect()
    }
}

impl CommandExecutor for RecordingExecutor {
    fn run(&self, command: &CommandSpec) -> Result<CommandOutcome> {
        self.commands.borrow_mut().push(command.clone());
        let code = self.exit_codes.borrow_mut().pop_front().unwrap_or(0);
        Ok(CommandOutcome::exited(code))
    }
}
