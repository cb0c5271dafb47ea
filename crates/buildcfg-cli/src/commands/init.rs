//! Init command implementation

use colored::Colorize;

use buildcfg_core::{InitOptions, init};
use buildcfg_fs::NormalizedPath;

use crate::error::Result;

pub fn run_init(source_dir: &NormalizedPath, options: &InitOptions) -> Result<()> {
    println!(
        "{} Scaffolding build configuration in {}...",
        "=>".blue().bold(),
        source_dir.as_str().cyan()
    );

    let report = init(source_dir, options)?;

    for path in &report.written {
        println!("   {} {}", "wrote".green(), path);
    }
    for path in &report.skipped {
        println!("   {} {} (exists, use --force)", "kept".yellow(), path);
    }

    println!("{} Ready. Try {}", "OK".green().bold(), "bcfg workflow ci".cyan());
    Ok(())
}
