//! Guardrails checked before any stage runs
//!
//! [`validate_effective`] rejects configurations that cannot produce a
//! meaningful build. [`ensure_out_of_source`] refuses binary directories
//! that would pollute the source tree, and runs before anything is created.

use crate::error::ConfigurationError;
use crate::preset::EffectiveConfig;
use buildcfg_fs::{NormalizedPath, ProjectFile};

const SANITIZER_LISTS: &[&str] = &["SANITIZERS", "USE_SANITIZER"];

const SANITIZER_SWITCHES: &[(&str, &str)] = &[
    ("ENABLE_ASAN", "address"),
    ("ENABLE_TSAN", "thread"),
    ("ENABLE_MSAN", "memory"),
    ("ENABLE_UBSAN", "undefined"),
];

/// CMake truthiness for a cache value.
pub fn is_truthy(value: &str) -> bool {
    let upper = value.trim().to_ascii_uppercase();
    match upper.as_str() {
        "1" | "ON" | "YES" | "TRUE" | "Y" => true,
        "" | "0" | "OFF" | "NO" | "FALSE" | "N" | "IGNORE" | "NOTFOUND" => false,
        other if other.ends_with("-NOTFOUND") => false,
        other => other.parse::<f64>().map(|n| n != 0.0).unwrap_or(false),
    }
}

/// Sanitizers requested by cache variables, sorted and deduplicated.
pub fn requested_sanitizers(config: &EffectiveConfig) -> Vec<String> {
    let mut sanitizers = Vec::new();
    for name in SANITIZER_LISTS {
        if let Some(list) = config.cache_value(name) {
            sanitizers.extend(
                list.split([';', ','])
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_ascii_lowercase()),
            );
        }
    }
    for (name, sanitizer) in SANITIZER_SWITCHES {
        if config.cache_value(name).is_some_and(|v| is_truthy(&v)) {
            sanitizers.push(sanitizer.to_string());
        }
    }
    sanitizers.sort();
    sanitizers.dedup();
    sanitizers
}

/// Why the configuration counts as optimized, if it does.
fn optimization_reason(config: &EffectiveConfig) -> Option<String> {
    if !config.build_type.eq_ignore_ascii_case("Debug") {
        return Some(format!("CMAKE_BUILD_TYPE={}", config.build_type));
    }
    if config
        .cache_value("CMAKE_INTERPROCEDURAL_OPTIMIZATION")
        .is_some_and(|v| is_truthy(&v))
    {
        return Some("CMAKE_INTERPROCEDURAL_OPTIMIZATION".to_string());
    }
    None
}

/// Required fields are non-empty and sanitizers are not combined with an
/// optimized build.
pub fn validate_effective(config: &EffectiveConfig) -> Result<(), ConfigurationError> {
    let required = [
        ("build type", config.build_type.is_empty()),
        ("triplet", config.triplet.is_empty()),
        ("toolchain file", config.toolchain_file.as_str().is_empty()),
        ("binary directory", config.binary_dir.as_str().is_empty()),
    ];
    if let Some((field, _)) = required.iter().find(|(_, empty)| *empty) {
        return Err(ConfigurationError::MissingField {
            preset: config.preset.clone(),
            field: field.to_string(),
        });
    }

    let sanitizers = requested_sanitizers(config);
    if sanitizers.is_empty() {
        return Ok(());
    }
    if let Some(reason) = optimization_reason(config) {
        return Err(ConfigurationError::SanitizerWithOptimization {
            preset: config.preset.clone(),
            sanitizers,
            reason,
        });
    }
    Ok(())
}

/// Refuse a binary directory that is the source directory, contains it, or
/// already holds a project descriptor.
pub fn ensure_out_of_source(
    source_dir: &NormalizedPath,
    binary_dir: &NormalizedPath,
) -> Result<(), ConfigurationError> {
    let source = NormalizedPath::canonical(source_dir.to_native());
    let binary = NormalizedPath::canonical(binary_dir.to_native());

    let reason = if binary == source {
        Some("it is the source directory")
    } else if source.starts_with(&binary) {
        Some("it contains the source directory")
    } else if binary.join(ProjectFile::ProjectDescriptor.as_str()).is_file() {
        Some("it already holds a CMakeLists.txt")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ConfigurationError::InSourceBuild {
            binary_dir: binary_dir.to_native(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}
