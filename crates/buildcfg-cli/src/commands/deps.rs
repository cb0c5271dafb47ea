//! deps plan and deps request

use colored::Colorize;

use buildcfg_deps::{PackageStatus, VcpkgTool};

use crate::commands::stage::with_runner;
use crate::context::Session;
use crate::error::Result;

pub fn run_plan(session: &Session, preset: &str, json: bool) -> Result<()> {
    let report = with_runner(session, true, |runner| Ok(runner.plan_dependencies(preset)?))?;

    let Some(report) = report else {
        println!("{} has no dependency manifest", preset.cyan());
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} {} at baseline {}",
        "Dependencies for".bold(),
        report.triplet.cyan(),
        report.baseline.dimmed()
    );
    for outcome in &report.packages {
        let status = match outcome.status {
            PackageStatus::Hit => "hit".green(),
            PackageStatus::Miss => "miss".yellow(),
            PackageStatus::Built => "built".blue(),
        };
        println!(
            "  {:<24} {:<6} {}",
            outcome.package.identity(),
            status,
            outcome.key.as_str().dimmed()
        );
    }
    println!(
        "{} of {} cached ({:.0}%)",
        report.hits(),
        report.packages.len(),
        report.hit_rate() * 100.0
    );
    Ok(())
}

pub fn run_request(session: &Session, preset: &str, json: bool) -> Result<()> {
    let request = with_runner(session, true, |runner| Ok(runner.dependency_request(preset)?))?;

    let Some(request) = request else {
        println!("{} has no dependency manifest", preset.cyan());
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&request)?);
        return Ok(());
    }

    let tool = VcpkgTool::new(session.settings.vcpkg_root.clone());
    for (name, value) in request.env() {
        println!("{name}={value}");
    }
    println!("{}", tool.command_line(&request).join(" "));
    Ok(())
}
