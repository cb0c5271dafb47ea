//! CLI argument parsing using clap derive

use buildcfg_meta::schema::PresetKind;
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Resolve build presets and run configure, build, test and package
#[derive(Parser, Debug)]
#[command(name = "bcfg")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Source directory (default: nearest directory above the current one
    /// holding a CMakePresets.json)
    #[arg(short = 'S', long, global = true, env = "BUILDCFG_SOURCE_DIR")]
    pub source_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print commands instead of running them
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Configure a build tree from a configure preset
    ///
    /// Runs the toolchain chain-loader and the dependency manager before
    /// cmake.
    Configure {
        preset: String,
    },

    /// Build a configured tree from a build preset
    Build {
        preset: String,
    },

    /// Run tests from a test preset
    Test {
        preset: String,
    },

    /// Package from a package preset
    Package {
        preset: String,
    },

    /// Run every step of a workflow preset, stopping at the first failure
    ///
    /// Examples:
    ///   bcfg workflow ci
    ///   bcfg --dry-run workflow ci
    Workflow {
        preset: String,

        /// Output the stage report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List presets
    List {
        /// Only presets of this kind
        #[arg(long, value_enum)]
        kind: Option<KindArg>,

        /// Include hidden presets
        #[arg(long)]
        all: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration of a configure preset
    Show {
        preset: String,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show the chain-loaded toolchain of a configure preset
    Toolchain {
        preset: String,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Inspect the dependency stage of a configure preset
    Deps {
        #[command(subcommand)]
        action: DepsAction,
    },

    /// Scaffold presets, a dependency manifest and settings
    ///
    /// Examples:
    ///   bcfg init
    ///   bcfg init --name demo --baseline <commit>
    Init {
        /// Name for the dependency manifest (default: directory name)
        #[arg(long)]
        name: Option<String>,

        /// Registry baseline commit to pin
        #[arg(long)]
        baseline: Option<String>,

        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    ///
    /// Examples:
    ///   bcfg completions bash > ~/.local/share/bash-completion/completions/bcfg
    ///   bcfg completions zsh > ~/.zfunc/_bcfg
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum DepsAction {
    /// Binary cache hit or miss per package
    Plan {
        preset: String,

        #[arg(long)]
        json: bool,
    },

    /// The request handed to the dependency manager
    Request {
        preset: String,

        #[arg(long)]
        json: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    Configure,
    Build,
    Test,
    Package,
    Workflow,
}

impl From<KindArg> for PresetKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Configure => Self::Configure,
            KindArg::Build => Self::Build,
            KindArg::Test => Self::Test,
            KindArg::Package => Self::Package,
            KindArg::Workflow => Self::Workflow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["bcfg", "configure", "debug", "--dry-run", "-S", "/src"]);
        assert!(cli.dry_run);
        assert_eq!(cli.source_dir, Some(PathBuf::from("/src")));
        assert_eq!(
            cli.command,
            Commands::Configure {
                preset: "debug".into()
            }
        );
    }

    #[test]
    fn parse_list_kind() {
        let cli = Cli::parse_from(["bcfg", "list", "--kind", "workflow", "--json"]);
        assert_eq!(
            cli.command,
            Commands::List {
                kind: Some(KindArg::Workflow),
                all: false,
                json: true
            }
        );
    }

    #[test]
    fn parse_deps_plan() {
        let cli = Cli::parse_from(["bcfg", "deps", "plan", "release"]);
        assert!(matches!(
            cli.command,
            Commands::Deps {
                action: DepsAction::Plan { ref preset, json: false }
            } if preset == "release"
        ));
    }

    #[test]
    fn parse_completions_command() {
        let cli = Cli::parse_from(["bcfg", "completions", "bash"]);
        assert!(matches!(cli.command, Commands::Completions { .. }));
    }

    #[test]
    fn preset_is_required() {
        assert!(Cli::try_parse_from(["bcfg", "build"]).is_err());
    }
}
