//! Build configuration resolver CLI
//!
//! `bcfg` resolves CMake presets into effective configurations and runs
//! configure, build, test and package with the resolved toolchain and
//! dependencies.

mod cli;
mod commands;
mod context;
mod dry_run;
mod error;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use buildcfg_core::{InitOptions, Stage};
use buildcfg_fs::NormalizedPath;

use cli::{Cli, Commands, DepsAction};
use context::{Session, resolve_source_dir};
use error::Result;

/// Overrides the log filter, e.g. `BUILDCFG_LOG=buildcfg_toolchain=debug`.
const LOG_ENV: &str = "BUILDCFG_LOG";

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .without_time()
        .try_init();
    tracing::debug!("Verbose mode enabled");
}

fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "bcfg", &mut std::io::stdout());
            Ok(())
        }
        Commands::Init {
            name,
            baseline,
            force,
        } => {
            let source_dir = match cli.source_dir.as_deref() {
                Some(dir) => resolve_source_dir(Some(dir), &cwd)?,
                None => NormalizedPath::new(&cwd),
            };
            let options = InitOptions {
                project_name: name,
                baseline,
                force,
            };
            commands::run_init(&source_dir, &options)
        }
        command => {
            let source_dir = resolve_source_dir(cli.source_dir.as_deref(), &cwd)?;
            let session = Session::load(source_dir)?;
            execute(&session, command, cli.dry_run)
        }
    }
}

fn execute(session: &Session, command: Commands, dry_run: bool) -> Result<()> {
    match command {
        Commands::Configure { preset } => {
            commands::run_stage(session, Stage::Configure, &preset, dry_run)
        }
        Commands::Build { preset } => commands::run_stage(session, Stage::Build, &preset, dry_run),
        Commands::Test { preset } => commands::run_stage(session, Stage::Test, &preset, dry_run),
        Commands::Package { preset } => {
            commands::run_stage(session, Stage::Package, &preset, dry_run)
        }
        Commands::Workflow { preset, json } => {
            commands::run_workflow(session, &preset, dry_run, json)
        }
        Commands::List { kind, all, json } => {
            commands::run_list(session, kind.map(Into::into), all, json)
        }
        Commands::Show { preset, json } => commands::run_show(session, &preset, json),
        Commands::Toolchain { preset, json } => commands::run_toolchain(session, &preset, json),
        Commands::Deps { action } => match action {
            DepsAction::Plan { preset, json } => commands::run_plan(session, &preset, json),
            DepsAction::Request { preset, json } => commands::run_request(session, &preset, json),
        },
        Commands::Init { .. } | Commands::Completions { .. } => Ok(()),
    }
}
