//! Cross-crate scenarios: scaffold or hand-written preset files, resolved
//! and driven through the stage runner with recorded commands.
//!
//! Nothing here needs cmake, a compiler or the dependency manager installed.

use buildcfg_core::{
    ErrorKind, HostContext, InitOptions, RecordingExecutor, Settings, StageRunner, StageStatus,
    WorkflowState, init,
};
use buildcfg_deps::{DependencyRequest, ExternalResolver};
use buildcfg_fs::NormalizedPath;
use buildcfg_meta::{PresetRegistry, load_project};
use buildcfg_test_utils::{COMPILER_DIR, TestProject, fake_compiler_set};
use buildcfg_toolchain::{Host, ToolchainField};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::collections::BTreeMap;

const COMMIT: &str = "89abcdef0123456789abcdef0123456789abcdef";

/// A single visible preset with no chainloaded toolchain, so compilers
/// come from discovery.
const PLAIN_PRESETS: &str = r#"{
  "version": 6,
  "configurePresets": [
    {
      "name": "plain",
      "generator": "Ninja",
      "binaryDir": "${sourceDir}/out/${presetName}",
      "cacheVariables": {
        "CMAKE_BUILD_TYPE": "RelWithDebInfo",
        "VCPKG_TARGET_TRIPLET": "x64-linux"
      }
    }
  ]
}
"#;

#[derive(Default)]
struct RecordingResolver {
    requests: RefCell<Vec<DependencyRequest>>,
}

impl ExternalResolver for RecordingResolver {
    fn install(&self, request: &DependencyRequest) -> buildcfg_deps::Result<()> {
        self.requests.borrow_mut().push(request.clone());
        Ok(())
    }
}

struct Workspace {
    project: TestProject,
    registry: PresetRegistry,
    settings: Settings,
    host: HostContext,
}

impl Workspace {
    fn load(project: TestProject) -> Self {
        let project = project.with_fake_compilers();
        let source = NormalizedPath::new(project.root());
        let registry = load_project(&source).unwrap();
        let mut settings = Settings::defaults(&source);
        settings.compiler_search_dirs = vec![source.join(COMPILER_DIR)];
        Self {
            project,
            registry,
            settings,
            host: HostContext::new(Host::new("Linux", "x86_64"), BTreeMap::new()),
        }
    }

    fn runner<'a>(
        &'a self,
        executor: &'a RecordingExecutor,
        dependencies: &'a dyn ExternalResolver,
    ) -> StageRunner<'a> {
        StageRunner::new(
            &self.registry,
            &self.settings,
            &self.host,
            executor,
            dependencies,
        )
    }
}

fn scaffolded() -> Workspace {
    let project = TestProject::new();
    let options = InitOptions {
        project_name: Some("demo".to_string()),
        baseline: Some(COMMIT.to_string()),
        force: false,
    };
    init(&NormalizedPath::new(project.root()), &options).unwrap();
    Workspace::load(project)
}

#[test]
fn scaffolded_project_runs_ci_workflow() {
    let workspace = scaffolded();
    let executor = RecordingExecutor::new();
    let resolver = RecordingResolver::default();

    let report = workspace.runner(&executor, &resolver).workflow("ci").unwrap();

    assert!(report.succeeded());
    assert_eq!(report.state, WorkflowState::Succeeded);
    assert_eq!(executor.programs(), vec!["cmake", "cmake", "ctest"]);
    assert!(
        report
            .stages
            .iter()
            .all(|s| s.status == StageStatus::Succeeded)
    );

    let requests = resolver.requests.borrow();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].baseline, COMMIT);
    assert_eq!(requests[0].triplet, "x64-linux");

    let configure = &executor.commands()[0];
    let bin = NormalizedPath::new(workspace.project.root()).join(COMPILER_DIR);
    assert!(configure.has_arg(&format!("-DCMAKE_CXX_COMPILER={bin}/clang++")));
    assert!(configure.has_arg("-DCMAKE_BUILD_TYPE=Debug"));
    workspace.project.assert_file_exists("build/debug");
}

#[test]
fn scaffolded_asan_preset_keeps_sanitizers_on_debug() {
    let workspace = scaffolded();
    let executor = RecordingExecutor::new();
    let resolver = RecordingResolver::default();

    workspace.runner(&executor, &resolver).configure("asan").unwrap();

    let configure = &executor.commands()[0];
    assert!(configure.has_arg("-DSANITIZERS=address;undefined"));
    assert!(configure.has_arg("-DCMAKE_BUILD_TYPE=Debug"));
}

#[test]
fn discovery_fills_compilers_from_search_dirs() {
    let mut workspace = Workspace::load(TestProject::new().with_presets(PLAIN_PRESETS));
    let bin = fake_compiler_set(&workspace.project.path("toolchain/bin"), &["gcc", "g++"]);
    workspace.settings.compiler_search_dirs = vec![NormalizedPath::new(&bin)];
    let executor = RecordingExecutor::new();
    let resolver = RecordingResolver::default();

    let toolchain = workspace
        .runner(&executor, &resolver)
        .toolchain("plain")
        .unwrap();

    let c = toolchain.state.provided(ToolchainField::CCompiler).unwrap();
    assert!(c.value.ends_with("toolchain/bin/gcc"));
    assert_eq!(c.origin, "discovery");
    assert!(toolchain.state.cxx_compiler().unwrap().ends_with("g++"));
}

#[test]
fn missing_compiler_fails_before_cmake() {
    let mut workspace = Workspace::load(TestProject::new().with_presets(PLAIN_PRESETS));
    std::fs::create_dir_all(workspace.project.path("empty")).unwrap();
    workspace.settings.compiler_search_dirs =
        vec![NormalizedPath::new(workspace.project.path("empty"))];
    let executor = RecordingExecutor::new();
    let resolver = RecordingResolver::default();

    let err = workspace
        .runner(&executor, &resolver)
        .configure("plain")
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Toolchain);
    assert!(err.to_string().contains("C compiler"));
    assert!(executor.commands().is_empty());
    workspace.project.assert_file_not_exists("out/plain");
}

#[test]
fn chainloaded_compiler_missing_from_search_path_fails_before_cmake() {
    let mut workspace = scaffolded();
    let bin = fake_compiler_set(&workspace.project.path("gnu/bin"), &["gcc", "g++"]);
    workspace.settings.compiler_search_dirs = vec![NormalizedPath::new(&bin)];
    let executor = RecordingExecutor::new();
    let resolver = RecordingResolver::default();

    let err = workspace
        .runner(&executor, &resolver)
        .configure("debug")
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Toolchain);
    assert!(err.to_string().contains("C compiler 'clang'"));
    assert!(executor.commands().is_empty());
    workspace.project.assert_file_not_exists("build/debug");
}

#[test]
fn user_presets_override_project_presets() {
    let project = TestProject::new()
        .with_standard_presets()
        .with_user_presets(
            r#"{
  "version": 6,
  "configurePresets": [
    {
      "name": "mine",
      "inherits": "native",
      "cacheVariables": { "CMAKE_BUILD_TYPE": "RelWithDebInfo" }
    }
  ]
}
"#,
        );
    let workspace = Workspace::load(project);
    let executor = RecordingExecutor::new();
    let resolver = RecordingResolver::default();

    workspace.runner(&executor, &resolver).configure("mine").unwrap();

    let configure = &executor.commands()[0];
    assert!(configure.has_arg("-DCMAKE_BUILD_TYPE=RelWithDebInfo"));
    assert!(configure.has_arg("-DVCPKG_TARGET_TRIPLET=x64-linux"));
    workspace.project.assert_file_exists("build/mine");
}

#[cfg(unix)]
#[test]
fn dependency_tool_failure_carries_exit_code() {
    use buildcfg_deps::VcpkgTool;

    let workspace = Workspace::load(
        TestProject::new()
            .with_standard_presets()
            .with_manifest(&["fmt"], COMMIT),
    );
    buildcfg_test_utils::fake_executable(
        &workspace.project.path("external/vcpkg/vcpkg"),
        2,
        "error: no version database entry for fmt",
    );
    let tool = VcpkgTool::new(workspace.settings.vcpkg_root.clone());
    let executor = RecordingExecutor::new();

    let err = workspace
        .runner(&executor, &tool)
        .configure("native")
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DependencyResolution);
    assert_eq!(err.tool_exit_code(), Some(2));
    assert!(err.to_string().contains("no version database entry"));
    assert!(executor.commands().is_empty());
    workspace.project.assert_file_not_exists("build/native");
}
