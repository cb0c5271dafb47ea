//! Stand-ins that print what would run.

use buildcfg_core::workflow::{CommandExecutor, CommandOutcome, CommandSpec};
use buildcfg_deps::{DependencyRequest, ExternalResolver, VcpkgTool};
use colored::Colorize;

/// Prints each command and reports success.
#[derive(Debug, Default)]
pub struct PrintingExecutor;

impl CommandExecutor for PrintingExecutor {
    fn run(&self, command: &CommandSpec) -> buildcfg_core::Result<CommandOutcome> {
        if let Some(cwd) = &command.cwd {
            println!("{} cd {}", "$".dimmed(), cwd);
        }
        for (name, value) in &command.env {
            println!("{} export {name}={value}", "$".dimmed());
        }
        println!("{} {command}", "$".dimmed());
        Ok(CommandOutcome::success())
    }
}

/// Prints the dependency manager invocation instead of running it.
pub struct PrintingResolver {
    tool: VcpkgTool,
}

impl PrintingResolver {
    pub fn new(tool: VcpkgTool) -> Self {
        Self { tool }
    }
}

impl ExternalResolver for PrintingResolver {
    fn install(&self, request: &DependencyRequest) -> buildcfg_deps::Result<()> {
        for (name, value) in request.env() {
            println!("{} export {name}={value}", "$".dimmed());
        }
        println!("{} {}", "$".dimmed(), self.tool.command_line(request).join(" "));
        Ok(())
    }
}
