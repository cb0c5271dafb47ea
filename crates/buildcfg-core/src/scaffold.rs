//! Project scaffolding for `bcfg init`
//!
//! Writes a preset file following the usual layout (hidden per-target
//! presets under a hidden base, visible leaves on top), a dependency
//! manifest, an optional registry pin, project settings, a chain-loaded
//! compiler toolchain and an overlay triplet.

use crate::error::ConfigurationError;
use crate::settings::{DEFAULT_BINARY_CACHE_DIR, DEFAULT_VCPKG_ROOT};
use crate::Result;
use buildcfg_fs::{ConfigStore, NormalizedPath, ProjectFile, io};
use buildcfg_meta::schema::is_commit_id;
use serde::Serialize;
use serde_json::{Value, json};

pub const CLANG_TOOLCHAIN_PATH: &str = "cmake/toolchains/clang.cmake";
pub const ARM64_TRIPLET_PATH: &str = "cmake/triplets/arm64-linux-gnu.cmake";
pub const SETTINGS_PATH: &str = ".buildcfg/config.toml";

const CLANG_TOOLCHAIN: &str = "\
# Compilers for builds that chain-load this file.
if(NOT CMAKE_C_COMPILER)
  set(CMAKE_C_COMPILER clang)
endif()
if(NOT CMAKE_CXX_COMPILER)
  set(CMAKE_CXX_COMPILER clang++)
endif()
";

const ARM64_TRIPLET: &str = "\
set(VCPKG_TARGET_ARCHITECTURE arm64)
set(VCPKG_CRT_LINKAGE dynamic)
set(VCPKG_LIBRARY_LINKAGE static)
set(VCPKG_CMAKE_SYSTEM_NAME Linux)
";

#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Name for the dependency manifest. Defaults to the directory name.
    pub project_name: Option<String>,
    /// Registry baseline commit to pin.
    pub baseline: Option<String>,
    /// Overwrite existing files.
    pub force: bool,
}

/// Files written and files left alone, relative to the source dir.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InitReport {
    pub written: Vec<String>,
    pub skipped: Vec<String>,
}

/// Scaffold a project in `source_dir`.
pub fn init(source_dir: &NormalizedPath, options: &InitOptions) -> Result<InitReport> {
    if let Some(baseline) = options.baseline.as_deref() {
        if !is_commit_id(baseline) {
            return Err(ConfigurationError::from(buildcfg_meta::Error::InvalidBaseline {
                baseline: baseline.to_string(),
            })
            .into());
        }
    }

    let name = options
        .project_name
        .clone()
        .or_else(|| source_dir.file_name().map(manifest_name))
        .unwrap_or_else(|| "project".to_string());

    let json_file = |relative: &'static str, value: Value| {
        to_json(&source_dir.join(relative), &value).map(|content| (relative, content))
    };
    let mut files = vec![
        json_file(ProjectFile::Presets.as_str(), presets())?,
        json_file(
            ProjectFile::DependencyManifest.as_str(),
            manifest(&name, options.baseline.as_deref()),
        )?,
    ];
    if let Some(baseline) = options.baseline.as_deref() {
        files.push(json_file(ProjectFile::RegistryPin.as_str(), registry_pin(baseline))?);
    }
    files.push((SETTINGS_PATH, settings()));
    files.push((CLANG_TOOLCHAIN_PATH, CLANG_TOOLCHAIN.to_string()));
    files.push((ARM64_TRIPLET_PATH, ARM64_TRIPLET.to_string()));

    let mut report = InitReport::default();
    for (relative, content) in files {
        let path = source_dir.join(relative);
        let written = if options.force {
            io::write_atomic(&path, content.as_bytes())?;
            true
        } else {
            io::write_new(&path, content.as_bytes())?
        };
        if written {
            tracing::info!("Wrote {relative}");
            report.written.push(relative.to_string());
        } else {
            tracing::info!("Kept existing {relative}");
            report.skipped.push(relative.to_string());
        }
    }
    Ok(report)
}

/// Manifest names are lowercase alphanumerics and dashes.
fn manifest_name(dir: &str) -> String {
    let name: String = dir
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let name = name.trim_matches('-').to_string();
    if name.is_empty() { "project".to_string() } else { name }
}

fn to_json(path: &NormalizedPath, value: &Value) -> Result<String> {
    Ok(ConfigStore::new().render(path, value)?)
}

fn presets() -> Value {
    let configure = |name: &str, build_type: &str, triplet: &str| {
        json!({
            "name": name,
            "hidden": true,
            "inherits": "base-configure",
            "cacheVariables": {
                "CMAKE_BUILD_TYPE": build_type,
                "VCPKG_TARGET_TRIPLET": triplet
            }
        })
    };

    json!({
        "version": 6,
        "configurePresets": [
            {
                "name": "base-configure",
                "hidden": true,
                "generator": "Ninja",
                "binaryDir": "${sourceDir}/build/${presetName}",
                "installDir": "${sourceDir}/install/${presetName}",
                "toolchainFile": format!("${{sourceDir}}/{DEFAULT_VCPKG_ROOT}/scripts/buildsystems/vcpkg.cmake"),
                "cacheVariables": {
                    "VCPKG_CHAINLOAD_TOOLCHAIN_FILE": format!("${{sourceDir}}/{CLANG_TOOLCHAIN_PATH}"),
                    "VCPKG_OVERLAY_TRIPLETS": "${sourceDir}/cmake/triplets",
                    "CMAKE_EXPORT_COMPILE_COMMANDS": true
                }
            },
            configure("debug-x64", "Debug", "x64-linux"),
            configure("debug-arm64", "Debug", "arm64-linux-gnu"),
            configure("release-x64", "Release", "x64-linux"),
            { "name": "debug", "displayName": "Debug", "inherits": "debug-x64" },
            { "name": "release", "displayName": "Release", "inherits": "release-x64" },
            {
                "name": "asan",
                "displayName": "Debug with sanitizers",
                "inherits": "debug-x64",
                "cacheVariables": { "SANITIZERS": "address;undefined" }
            }
        ],
        "buildPresets": [
            { "name": "debug", "configurePreset": "debug" },
            { "name": "release", "configurePreset": "release" },
            { "name": "asan", "configurePreset": "asan" }
        ],
        "testPresets": [
            {
                "name": "debug",
                "configurePreset": "debug",
                "output": { "outputOnFailure": true }
            },
            {
                "name": "asan",
                "configurePreset": "asan",
                "output": { "outputOnFailure": true }
            }
        ],
        "packagePresets": [
            { "name": "release", "configurePreset": "release", "generators": ["TGZ"] }
        ],
        "workflowPresets": [
            {
                "name": "ci",
                "steps": [
                    { "type": "configure", "name": "debug" },
                    { "type": "build", "name": "debug" },
                    { "type": "test", "name": "debug" }
                ]
            }
        ]
    })
}

fn manifest(name: &str, baseline: Option<&str>) -> Value {
    let mut manifest = json!({
        "name": name,
        "version": "0.1.0",
        "dependencies": []
    });
    if let Some(baseline) = baseline {
        manifest["builtin-baseline"] = json!(baseline);
    }
    manifest
}

fn registry_pin(baseline: &str) -> Value {
    json!({
        "default-registry": {
            "kind": "builtin",
            "baseline": baseline
        },
        "overlay-triplets": ["cmake/triplets"]
    })
}

fn settings() -> String {
    format!(
        "# Project settings for bcfg. Developer overrides go in config.local.toml.\n\
         vcpkg_root = \"{DEFAULT_VCPKG_ROOT}\"\n\
         binary_cache_dir = \"{DEFAULT_BINARY_CACHE_DIR}\"\n\
         cache_mode = \"readwrite\"\n"
    )
}
