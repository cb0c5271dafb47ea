//! [`TestProject`] builder for resolver test scenarios.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Where [`TestProject::with_fake_compilers`] puts its compilers.
pub const COMPILER_DIR: &str = "tools/bin";

/// A preset file exercising the usual shapes: a hidden base, hidden
/// per-target presets, visible leaves, a sanitizer preset, a deliberately
/// invalid sanitizer+release preset, and a `ci` workflow.
pub const STANDARD_PRESETS: &str = r#"{
  "version": 6,
  "configurePresets": [
    {
      "name": "base-configure",
      "hidden": true,
      "generator": "Ninja",
      "binaryDir": "${sourceDir}/build/${presetName}",
      "installDir": "${sourceDir}/install/${presetName}",
      "toolchainFile": "${sourceDir}/cmake/toolchains/vcpkg.cmake",
      "cacheVariables": {
        "VCPKG_CHAINLOAD_TOOLCHAIN_FILE": "${sourceDir}/cmake/toolchains/clang.cmake",
        "VCPKG_OVERLAY_TRIPLETS": "${sourceDir}/cmake/triplets",
        "CMAKE_EXPORT_COMPILE_COMMANDS": true
      }
    },
    {
      "name": "debug-x64",
      "hidden": true,
      "inherits": "base-configure",
      "cacheVariables": {
        "CMAKE_BUILD_TYPE": "Debug",
        "VCPKG_TARGET_TRIPLET": "x64-linux"
      }
    },
    {
      "name": "debug-arm64",
      "hidden": true,
      "inherits": "base-configure",
      "cacheVariables": {
        "CMAKE_BUILD_TYPE": "Debug",
        "VCPKG_TARGET_TRIPLET": "arm64-linux-gnu"
      }
    },
    {
      "name": "release-x64",
      "hidden": true,
      "inherits": "base-configure",
      "cacheVariables": {
        "CMAKE_BUILD_TYPE": "Release",
        "VCPKG_TARGET_TRIPLET": "x64-linux"
      }
    },
    { "name": "debug", "inherits": "debug-arm64" },
    { "name": "native", "inherits": "debug-x64" },
    { "name": "release", "inherits": "release-x64" },
    {
      "name": "asan",
      "inherits": "debug-x64",
      "cacheVariables": { "SANITIZERS": "address;undefined" }
    },
    {
      "name": "release-asan",
      "inherits": "release-x64",
      "cacheVariables": { "ENABLE_ASAN": "ON" }
    }
  ],
  "buildPresets": [
    { "name": "debug", "configurePreset": "debug" },
    { "name": "native", "configurePreset": "native", "jobs": 4 },
    { "name": "release", "configurePreset": "release", "targets": ["app", "lib"] }
  ],
  "testPresets": [
    {
      "name": "native",
      "configurePreset": "native",
      "output": { "outputOnFailure": true },
      "execution": { "stopOnFailure": true }
    }
  ],
  "packagePresets": [
    { "name": "release", "configurePreset": "release", "generators": ["TGZ"] }
  ],
  "workflowPresets": [
    {
      "name": "ci",
      "steps": [
        { "type": "configure", "name": "native" },
        { "type": "build", "name": "native" },
        { "type": "test", "name": "native" }
      ]
    },
    {
      "name": "mismatched",
      "steps": [
        { "type": "configure", "name": "native" },
        { "type": "build", "name": "release" }
      ]
    }
  ]
}
"#;

const VCPKG_TOOLCHAIN: &str = "# Stand-in for the dependency manager toolchain\n\
include(${VCPKG_CHAINLOAD_TOOLCHAIN_FILE})\n";

const CLANG_TOOLCHAIN: &str = "if(NOT CMAKE_C_COMPILER)\n  set(CMAKE_C_COMPILER clang)\nendif()\n\
if(NOT CMAKE_CXX_COMPILER)\n  set(CMAKE_CXX_COMPILER clang++)\nendif()\n";

const ARM64_TRIPLET: &str = "set(VCPKG_TARGET_ARCHITECTURE arm64)\n\
set(VCPKG_CRT_LINKAGE dynamic)\n\
set(VCPKG_LIBRARY_LINKAGE static)\n\
set(VCPKG_CMAKE_SYSTEM_NAME Linux)\n";

/// A temporary source tree with helper methods for setup and assertion.
///
/// # Example
///
/// ```rust,no_run
/// use buildcfg_test_utils::TestProject;
///
/// let project = TestProject::new().with_standard_presets();
/// project.assert_file_exists("CMakePresets.json");
/// ```
pub struct TestProject {
    temp_dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// An empty source tree holding only a `CMakeLists.txt`.
    pub fn new() -> Self {
        let project = Self {
            temp_dir: TempDir::new().unwrap(),
        };
        project.write(
            "CMakeLists.txt",
            "cmake_minimum_required(VERSION 3.25)\nproject(sample CXX)\n",
        );
        project
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write a file, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative)).unwrap()
    }

    pub fn with_presets(self, json: &str) -> Self {
        self.write("CMakePresets.json", json);
        self
    }

    pub fn with_user_presets(self, json: &str) -> Self {
        self.write("CMakeUserPresets.json", json);
        self
    }

    /// [`STANDARD_PRESETS`] plus the toolchain files and overlay triplet it
    /// refers to.
    pub fn with_standard_presets(self) -> Self {
        self.write("cmake/toolchains/vcpkg.cmake", VCPKG_TOOLCHAIN);
        self.write("cmake/toolchains/clang.cmake", CLANG_TOOLCHAIN);
        self.write("cmake/triplets/arm64-linux-gnu.cmake", ARM64_TRIPLET);
        self.with_presets(STANDARD_PRESETS)
    }

    /// Fake `clang`, `clang++`, `gcc` and `g++` under [`COMPILER_DIR`],
    /// listed as the compiler search path in `.buildcfg/config.local.toml`.
    pub fn with_fake_compilers(self) -> Self {
        crate::tools::fake_compiler_set(&self.path(COMPILER_DIR), &[]);
        self.write(
            ".buildcfg/config.local.toml",
            &format!("compiler_search_dirs = [\"{COMPILER_DIR}\"]\n"),
        );
        self
    }

    /// A `vcpkg.json` with the given dependency names and builtin baseline.
    pub fn with_manifest(self, dependencies: &[&str], baseline: &str) -> Self {
        let deps = dependencies
            .iter()
            .map(|d| format!("\"{d}\""))
            .collect::<Vec<_>>()
            .join(", ");
        self.write(
            "vcpkg.json",
            &format!(
                "{{\n  \"name\": \"sample\",\n  \"version\": \"0.1.0\",\n  \"dependencies\": [{deps}],\n  \"builtin-baseline\": \"{baseline}\"\n}}\n"
            ),
        );
        self
    }

    /// A baseline database under `<vcpkg_root>/versions/baseline.json`.
    pub fn with_baseline_db(self, vcpkg_root: &str, ports: &[(&str, &str)]) -> Self {
        let entries = ports
            .iter()
            .map(|(name, version)| {
                format!("    \"{name}\": {{ \"baseline\": \"{version}\", \"port-version\": 0 }}")
            })
            .collect::<Vec<_>>()
            .join(",\n");
        self.write(
            &format!("{vcpkg_root}/versions/baseline.json"),
            &format!("{{\n  \"default\": {{\n{entries}\n  }}\n}}\n"),
        );
        self
    }

    pub fn assert_file_exists(&self, relative: &str) {
        assert!(
            self.path(relative).exists(),
            "expected {relative} to exist"
        );
    }

    pub fn assert_file_not_exists(&self, relative: &str) {
        assert!(
            !self.path(relative).exists(),
            "expected {relative} not to exist"
        );
    }

    pub fn assert_file_contains(&self, relative: &str, needle: &str) {
        let content = self.read(relative);
        assert!(
            content.contains(needle),
            "expected {relative} to contain {needle:?}, got:\n{content}"
        );
    }
}
