//! Preset resolution scenarios against the standard preset file.

use buildcfg_core::{ConfigurationError, Error, HostContext, PresetResolver};
use buildcfg_fs::NormalizedPath;
use buildcfg_meta::schema::PresetFile;
use buildcfg_meta::{PresetRegistry, load_project};
use buildcfg_test_utils::{STANDARD_PRESETS, TestProject};
use buildcfg_toolchain::Host;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeMap;

fn linux() -> HostContext {
    HostContext::new(Host::new("Linux", "x86_64"), BTreeMap::new())
}

fn in_memory(json: &str) -> PresetRegistry {
    let file: PresetFile = serde_json::from_str(json).unwrap();
    let mut registry = PresetRegistry::new(NormalizedPath::new("/work/app"));
    registry
        .add_file(&NormalizedPath::new("/work/app/CMakePresets.json"), file, false)
        .unwrap();
    registry
}

fn configuration_error(err: Error) -> ConfigurationError {
    match err {
        Error::Configuration(e) => e,
        other => panic!("expected a configuration error, got {other:?}"),
    }
}

#[test]
fn debug_resolves_through_arm64_parent() {
    let project = TestProject::new().with_standard_presets();
    let source = NormalizedPath::new(project.root());
    let registry = load_project(&source).unwrap();
    let host = linux();

    let config = PresetResolver::new(&registry, &host)
        .resolve_configure("debug")
        .unwrap();

    assert_eq!(config.preset, "debug");
    assert_eq!(config.build_type, "Debug");
    assert_eq!(config.triplet, "arm64-linux-gnu");
    assert_eq!(config.binary_dir, source.join("build/debug"));
    assert_eq!(config.generator.as_deref(), Some("Ninja"));
    assert_eq!(
        config.chainload_toolchain_file,
        Some(source.join("cmake/toolchains/clang.cmake"))
    );
    assert_eq!(config.overlay_triplets, vec![source.join("cmake/triplets")]);
    assert_eq!(
        config.cache_value("CMAKE_EXPORT_COMPILE_COMMANDS").as_deref(),
        Some("TRUE")
    );
}

#[test]
fn standard_presets_hide_their_bases() {
    let registry = in_memory(STANDARD_PRESETS);
    let host = linux();
    let resolver = PresetResolver::new(&registry, &host);

    assert!(matches!(
        configuration_error(resolver.resolve_configure("base-configure").unwrap_err()),
        ConfigurationError::HiddenPreset { .. }
    ));
    assert!(resolver.resolve_configure("native").is_ok());
    assert!(resolver.resolve_configure("asan").is_ok());
}

#[test]
fn cycle_reports_full_path() {
    let registry = in_memory(
        r#"{
          "version": 6,
          "configurePresets": [
            { "name": "a", "inherits": "b" },
            { "name": "b", "inherits": "c" },
            { "name": "c", "inherits": "a" }
          ]
        }"#,
    );
    let host = linux();

    let err = PresetResolver::new(&registry, &host)
        .resolve_configure("a")
        .unwrap_err();

    match configuration_error(err) {
        ConfigurationError::InheritanceCycle { path, .. } => {
            assert_eq!(path, vec!["a", "b", "c", "a"]);
        }
        other => panic!("expected a cycle, got {other:?}"),
    }
}

#[test]
fn host_condition_selects_preset() {
    let json = r#"{
      "version": 6,
      "configurePresets": [
        {
          "name": "linux-only",
          "binaryDir": "${sourceDir}/build",
          "toolchainFile": "${sourceDir}/tc.cmake",
          "condition": { "type": "equals", "lhs": "${hostSystemName}", "rhs": "Linux" },
          "cacheVariables": { "CMAKE_BUILD_TYPE": "Debug", "VCPKG_TARGET_TRIPLET": "x64-linux" }
        }
      ]
    }"#;
    let registry = in_memory(json);

    let linux = linux();
    assert!(
        PresetResolver::new(&registry, &linux)
            .resolve_configure("linux-only")
            .is_ok()
    );

    let windows = HostContext::new(Host::new("Windows", "x86_64"), BTreeMap::new());
    let err = PresetResolver::new(&registry, &windows)
        .resolve_configure("linux-only")
        .unwrap_err();
    assert!(matches!(
        configuration_error(err),
        ConfigurationError::ConditionNotMet { .. }
    ));
}

#[test]
fn sanitizer_on_release_is_rejected() {
    let registry = in_memory(STANDARD_PRESETS);
    let host = linux();

    let err = PresetResolver::new(&registry, &host)
        .resolve_configure("release-asan")
        .unwrap_err();

    match configuration_error(err) {
        ConfigurationError::SanitizerWithOptimization { sanitizers, .. } => {
            assert_eq!(sanitizers, vec!["address"]);
        }
        other => panic!("expected a sanitizer error, got {other:?}"),
    }
}

#[test]
fn env_macro_expands_from_host() {
    let json = r#"{
      "version": 6,
      "configurePresets": [
        {
          "name": "env",
          "binaryDir": "$env{BUILD_ROOT}/${presetName}",
          "toolchainFile": "${sourceDir}/tc.cmake",
          "cacheVariables": { "CMAKE_BUILD_TYPE": "Debug", "VCPKG_TARGET_TRIPLET": "x64-linux" }
        }
      ]
    }"#;
    let registry = in_memory(json);
    let host = linux().with_var("BUILD_ROOT", "/scratch");

    let config = PresetResolver::new(&registry, &host)
        .resolve_configure("env")
        .unwrap();
    assert_eq!(config.binary_dir, NormalizedPath::new("/scratch/env"));
}

fn chain_json(values: &[String]) -> String {
    let presets = values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let inherits = if index == 0 {
                String::new()
            } else {
                format!("\"inherits\": \"p{}\",", index - 1)
            };
            format!(
                r#"{{ "name": "p{index}", {inherits}
                     "binaryDir": "${{sourceDir}}/build/${{presetName}}",
                     "toolchainFile": "${{sourceDir}}/tc.cmake",
                     "cacheVariables": {{
                       "CMAKE_BUILD_TYPE": "Debug",
                       "VCPKG_TARGET_TRIPLET": "x64-linux",
                       "VALUE": "{value}",
                       "LEVEL_{index}": "set"
                     }} }}"#
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");
    format!("{{ \"version\": 6, \"configurePresets\": [{presets}] }}")
}

proptest! {
    #[test]
    fn resolution_is_deterministic_and_leaf_wins(
        values in prop::collection::vec("[a-z0-9]{1,8}", 1..6)
    ) {
        let registry = in_memory(&chain_json(&values));
        let host = linux();
        let resolver = PresetResolver::new(&registry, &host);
        let leaf = format!("p{}", values.len() - 1);

        let first = resolver.resolve_configure(&leaf).unwrap();
        let second = resolver.resolve_configure(&leaf).unwrap();
        prop_assert_eq!(&first, &second);

        prop_assert_eq!(first.cache_value("VALUE"), values.last().cloned());
        for index in 0..values.len() {
            let level = format!("LEVEL_{index}");
            let level_value = first.cache_value(&level);
            prop_assert_eq!(level_value.as_deref(), Some("set"));
        }
    }
}
