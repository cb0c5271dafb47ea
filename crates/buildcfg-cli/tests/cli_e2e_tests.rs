//! CLI end-to-end tests that invoke the compiled `bcfg` binary.
//!
//! Stage commands run with `--dry-run` or against fake tools, so no real
//! cmake, ctest or vcpkg is needed.

use assert_cmd::Command;
use buildcfg_test_utils::TestProject;
use predicates::prelude::*;
use std::path::Path;

const COMMIT: &str = "0123456789abcdef0123456789abcdef01234567";

/// `bcfg` in `dir` with the resolver's environment variables cleared.
fn bcfg(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("bcfg").unwrap();
    cmd.current_dir(dir)
        .env_remove("BUILDCFG_SOURCE_DIR")
        .env_remove("BUILDCFG_LOG")
        .env_remove("VCPKG_ROOT")
        .env_remove("VCPKG_BINARY_SOURCES")
        .env_remove("VCPKG_DEFAULT_TRIPLET")
        .env_remove("CMAKE_SYSROOT")
        .env_remove("SYSROOT")
        .env_remove("TARGET_SYSROOT")
        .env_remove("CC")
        .env_remove("CXX")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn help_exits_zero() {
    let project = TestProject::new();
    bcfg(project.root())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("workflow"));
}

#[test]
fn missing_presets_is_reported() {
    let project = TestProject::new();
    bcfg(project.root())
        .args(["list"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("CMakePresets.json"));
}

#[test]
fn list_json_hides_hidden_presets() {
    let project = TestProject::new().with_standard_presets();
    let output = bcfg(project.root())
        .args(["list", "--kind", "configure", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = listing["configure"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert!(names.contains(&"debug"));
    assert!(!names.contains(&"base-configure"));
}

#[test]
fn list_works_from_a_subdirectory() {
    let project = TestProject::new().with_standard_presets();
    project.write("src/lib/placeholder.txt", "");

    bcfg(&project.path("src/lib"))
        .args(["list", "--kind", "workflow"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ci"));
}

#[test]
fn show_reports_effective_triplet() {
    let project = TestProject::new().with_standard_presets();
    let output = bcfg(project.root())
        .args(["show", "debug", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["triplet"], "arm64-linux-gnu");
    assert_eq!(config["build_type"], "Debug");
}

#[test]
fn toolchain_names_chainloaded_compilers() {
    let project = TestProject::new()
        .with_standard_presets()
        .with_fake_compilers();
    bcfg(project.root())
        .args(["toolchain", "native"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CMAKE_CXX_COMPILER"))
        .stdout(predicate::str::contains("tools/bin/clang++"));
}

#[test]
fn sanitizer_release_preset_fails_before_cmake() {
    let project = TestProject::new().with_standard_presets();
    bcfg(project.root())
        .args(["--dry-run", "configure", "release-asan"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("cmake").not())
        .stderr(predicate::str::contains("sanitizers"));
}

#[test]
fn dry_run_workflow_prints_every_stage() {
    let project = TestProject::new()
        .with_standard_presets()
        .with_fake_compilers();
    bcfg(project.root())
        .args(["--dry-run", "workflow", "ci"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cmake -S"))
        .stdout(predicate::str::contains("cmake --build"))
        .stdout(predicate::str::contains("ctest --test-dir"));
    project.assert_file_not_exists("build/native");
}

#[test]
fn mismatched_workflow_is_refused() {
    let project = TestProject::new().with_standard_presets();
    bcfg(project.root())
        .args(["--dry-run", "workflow", "mismatched"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected 'native'"));
}

#[cfg(unix)]
#[test]
fn failing_test_stage_exits_with_tool_code() {
    let project = TestProject::new()
        .with_standard_presets()
        .with_fake_compilers();
    let cmake = buildcfg_test_utils::fake_executable(&project.path("tools/cmake"), 0, "");
    let ctest =
        buildcfg_test_utils::fake_executable(&project.path("tools/ctest"), 8, "2 tests failed");
    project.write(
        ".buildcfg/config.toml",
        &format!(
            "cmake = \"{}\"\nctest = \"{}\"\n",
            cmake.display(),
            ctest.display()
        ),
    );

    bcfg(project.root())
        .args(["workflow", "ci"])
        .assert()
        .code(8)
        .stderr(predicate::str::contains("2 tests failed"))
        .stdout(predicate::str::contains("skipped").not());
    project.assert_file_exists("build/native");
}

#[test]
fn deps_request_renders_contract() {
    let project = TestProject::new()
        .with_standard_presets()
        .with_manifest(&["fmt"], COMMIT);
    bcfg(project.root())
        .args(["deps", "request", "native"])
        .assert()
        .success()
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("--triplet=x64-linux"))
        .stdout(predicate::str::contains("vcpkg-cache"));
}

#[test]
fn deps_plan_without_manifest() {
    let project = TestProject::new().with_standard_presets();
    bcfg(project.root())
        .args(["deps", "plan", "native"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no dependency manifest"));
}

#[test]
fn init_scaffolds_and_keeps_existing_files() {
    let project = TestProject::new();
    bcfg(project.root())
        .args(["init", "--name", "demo"])
        .assert()
        .success();
    project.assert_file_contains("CMakePresets.json", "\"debug-arm64\"");
    project.assert_file_contains("vcpkg.json", "\"demo\"");

    bcfg(project.root())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("kept"));

    bcfg(project.root())
        .args(["show", "debug", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("x64-linux"));
}

#[test]
fn completions_are_generated() {
    let project = TestProject::new();
    bcfg(project.root())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bcfg"));
}
