//! configure, build, test, package and workflow

use colored::Colorize;

use buildcfg_core::workflow::{CommandExecutor, ProcessExecutor};
use buildcfg_core::{Stage, StageRunner, StageStatus, WorkflowReport};
use buildcfg_deps::{ExternalResolver, VcpkgTool};

use crate::context::Session;
use crate::dry_run::{PrintingExecutor, PrintingResolver};
use crate::error::{CliError, Result};

/// Build a runner over the real tools, or over printing stand-ins for a
/// dry run, and hand it to `f`.
pub fn with_runner<T>(
    session: &Session,
    dry_run: bool,
    f: impl FnOnce(&StageRunner<'_>) -> Result<T>,
) -> Result<T> {
    let tool = VcpkgTool::new(session.settings.vcpkg_root.clone());
    let printing = PrintingResolver::new(tool.clone());
    let (executor, resolver): (&dyn CommandExecutor, &dyn ExternalResolver) = if dry_run {
        (&PrintingExecutor, &printing)
    } else {
        (&ProcessExecutor, &tool)
    };

    let runner = StageRunner::new(
        &session.registry,
        &session.settings,
        &session.host,
        executor,
        resolver,
    )
    .dry_run(dry_run);
    f(&runner)
}

/// Run one stage for a preset.
pub fn run_stage(session: &Session, stage: Stage, preset: &str, dry_run: bool) -> Result<()> {
    with_runner(session, dry_run, |runner| {
        match stage {
            Stage::Configure => runner.configure(preset)?,
            Stage::Build => runner.build(preset)?,
            Stage::Test => runner.test(preset)?,
            Stage::Package => runner.package(preset)?,
        }
        Ok(())
    })?;

    if !dry_run {
        println!("{} {} {}", "OK".green().bold(), stage, preset.cyan());
    }
    Ok(())
}

pub fn run_workflow(session: &Session, name: &str, dry_run: bool, json: bool) -> Result<()> {
    let mut report = with_runner(session, dry_run, |runner| Ok(runner.workflow(name)?))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    match report.take_failure() {
        Some(err) => Err(CliError::Core(err)),
        None => Ok(()),
    }
}

fn print_report(report: &WorkflowReport) {
    println!();
    println!("{} {}", "Workflow".bold(), report.workflow.cyan());
    for stage in &report.stages {
        let status = match &stage.status {
            StageStatus::Succeeded => "ok".green(),
            StageStatus::Failed { .. } => "failed".red().bold(),
            StageStatus::Skipped => "skipped".dimmed(),
        };
        println!(
            "  {:<10} {:<20} {:<8} {}",
            stage.stage.to_string(),
            stage.preset,
            status,
            format!("{} ms", stage.duration_ms).dimmed()
        );
    }
}
