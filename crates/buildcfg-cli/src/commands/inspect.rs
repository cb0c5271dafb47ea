//! list, show and toolchain

use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;

use buildcfg_core::EffectiveConfig;
use buildcfg_meta::schema::PresetKind;
use buildcfg_toolchain::{LoadedToolchain, ToolchainField};

use crate::commands::stage::with_runner;
use crate::context::Session;
use crate::error::Result;

const ALL_KINDS: [PresetKind; 5] = [
    PresetKind::Configure,
    PresetKind::Build,
    PresetKind::Test,
    PresetKind::Package,
    PresetKind::Workflow,
];

pub fn run_list(
    session: &Session,
    kind: Option<PresetKind>,
    include_hidden: bool,
    json: bool,
) -> Result<()> {
    let kinds: Vec<PresetKind> = match kind {
        Some(kind) => vec![kind],
        None => ALL_KINDS.to_vec(),
    };
    let listing: BTreeMap<PresetKind, Vec<String>> = kinds
        .into_iter()
        .map(|kind| (kind, session.registry.names(kind, include_hidden)))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("{} {}", "Presets in".bold(), session.source_dir.as_str().dimmed());
    println!();
    for (kind, names) in &listing {
        if names.is_empty() {
            continue;
        }
        println!("{}:", format!("{kind} presets").cyan().bold());
        for name in names {
            println!("  {}", name.green());
        }
        println!();
    }
    Ok(())
}

pub fn run_show(session: &Session, preset: &str, json: bool) -> Result<()> {
    let config = session.resolver().resolve_configure(preset)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print_config(&config);
    }
    Ok(())
}

fn print_config(config: &EffectiveConfig) {
    println!("{} {}", "Preset".bold(), config.preset.cyan());
    let rows = [
        ("source dir", Some(config.source_dir.to_string())),
        ("binary dir", Some(config.binary_dir.to_string())),
        ("install dir", config.install_dir.as_ref().map(ToString::to_string)),
        ("generator", config.generator.clone()),
        ("toolchain", Some(config.toolchain_file.to_string())),
        (
            "chainload",
            config.chainload_toolchain_file.as_ref().map(ToString::to_string),
        ),
        ("build type", Some(config.build_type.clone())),
        ("triplet", Some(config.triplet.clone())),
        ("manifest", Some(config.manifest_mode.to_string())),
    ];
    for (label, value) in rows {
        if let Some(value) = value {
            println!("  {:<12} {}", label, value);
        }
    }

    println!();
    println!("{}", "Cache variables".bold());
    for (name, value) in &config.cache_variables {
        println!("  {} = {}", name.green(), value.as_string());
    }

    if !config.environment.is_empty() {
        println!();
        println!("{}", "Environment".bold());
        for (name, value) in &config.environment {
            println!("  {} = {}", name.green(), value);
        }
    }
}

#[derive(Serialize)]
struct ToolchainView<'a> {
    preset: &'a str,
    #[serde(flatten)]
    toolchain: &'a LoadedToolchain,
}

pub fn run_toolchain(session: &Session, preset: &str, json: bool) -> Result<()> {
    let toolchain = with_runner(session, true, |runner| Ok(runner.toolchain(preset)?))?;

    if json {
        let view = ToolchainView {
            preset,
            toolchain: &toolchain,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("{} {}", "Toolchain for".bold(), preset.cyan());
    for field in ToolchainField::ALL {
        match toolchain.state.provided(field) {
            Some(provided) => println!(
                "  {:<24} {} {}",
                field.cache_variable(),
                provided.value,
                format!("({})", provided.origin).dimmed()
            ),
            None => println!("  {:<24} {}", field.cache_variable(), "-".dimmed()),
        }
    }
    Ok(())
}
