//! Binary cache behaviour seen through the stage runner's dependency plan.

use buildcfg_core::{HostContext, RecordingExecutor, Settings, StageRunner};
use buildcfg_deps::{
    BinaryCache, CachedResolver, DependencyRequest, ExternalResolver, PackageStatus, PortBuilder,
    ResolutionInput, ResolutionReport, ResolvedPackage, VersionResolver, installed_artifact,
};
use buildcfg_fs::NormalizedPath;
use buildcfg_meta::{PresetRegistry, load_baseline, load_manifest, load_project};
use buildcfg_test_utils::{COMPILER_DIR, TestProject};
use buildcfg_toolchain::Host;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

const COMMIT: &str = "0123456789abcdef0123456789abcdef01234567";

struct NoInstall;

impl ExternalResolver for NoInstall {
    fn install(&self, _request: &DependencyRequest) -> buildcfg_deps::Result<()> {
        Ok(())
    }
}

/// Produces a deterministic artifact per package and triplet.
struct StubBuilder;

impl PortBuilder for StubBuilder {
    fn build(&self, package: &ResolvedPackage, triplet: &str) -> buildcfg_deps::Result<Vec<u8>> {
        Ok(format!("{}@{triplet}", package.identity()).into_bytes())
    }
}

struct Project {
    project: TestProject,
    registry: PresetRegistry,
    settings: Settings,
    host: HostContext,
}

impl Project {
    fn new(dependencies: &[&str]) -> Self {
        let project = TestProject::new()
            .with_standard_presets()
            .with_manifest(dependencies, COMMIT)
            .with_baseline_db(
                "external/vcpkg",
                &[("fmt", "10.2.1"), ("zlib", "1.3.1"), ("spdlog", "1.14.1")],
            )
            .with_fake_compilers();
        let source = NormalizedPath::new(project.root());
        let mut settings = Settings::defaults(&source);
        settings.compiler_search_dirs = vec![source.join(COMPILER_DIR)];
        Self {
            registry: load_project(&source).unwrap(),
            settings,
            host: HostContext::new(Host::new("Linux", "x86_64"), BTreeMap::new()),
            project,
        }
    }

    fn source(&self) -> NormalizedPath {
        NormalizedPath::new(self.project.root())
    }

    fn runner<'a>(&'a self, executor: &'a RecordingExecutor) -> StageRunner<'a> {
        StageRunner::new(&self.registry, &self.settings, &self.host, executor, &NoInstall)
    }

    /// Build everything for `preset` into the project cache, the way a
    /// host that builds ports itself would.
    fn resolve(&self, preset: &str) -> ResolutionReport {
        let executor = RecordingExecutor::new();
        let request = self
            .runner(&executor)
            .dependency_request(preset)
            .unwrap()
            .unwrap();
        let manifest = load_manifest(&self.source()).unwrap().unwrap();
        let manifest_bytes = std::fs::read(request.manifest_path.to_native()).unwrap();
        let (cache_dir, mode) = request.binary_sources.files_source().unwrap();

        let resolver = CachedResolver::new(
            VersionResolver::new(
                request.baseline.clone(),
                load_baseline(&self.settings.vcpkg_root).unwrap(),
            ),
            BinaryCache::new(NormalizedPath::new(cache_dir), mode),
            StubBuilder,
        );
        let report = resolver
            .resolve(&ResolutionInput {
                manifest_bytes: &manifest_bytes,
                manifest: &manifest,
                triplet: &request.triplet,
                install_root: &request.install_root,
            })
            .unwrap();
        assert!(report.packages.iter().all(|p| p.status != PackageStatus::Miss));

        for outcome in &report.packages {
            assert!(
                installed_artifact(&request.install_root, &request.triplet, &outcome.package)
                    .is_file()
            );
        }
        report
    }
}

#[test]
fn plan_reports_misses_then_hits_after_resolve() {
    let project = Project::new(&["fmt", "zlib"]);
    let executor = RecordingExecutor::new();

    let before = project
        .runner(&executor)
        .plan_dependencies("native")
        .unwrap()
        .unwrap();
    assert_eq!(before.misses(), 2);
    assert_eq!(before.baseline, COMMIT);

    let resolved = project.resolve("native");
    assert_eq!(resolved.built(), 2);

    let after = project
        .runner(&executor)
        .plan_dependencies("native")
        .unwrap()
        .unwrap();
    assert_eq!(after.hits(), 2);
    assert_eq!(after.hit_rate(), 1.0);

    let keys = |r: &ResolutionReport| {
        r.packages.iter().map(|p| p.key.clone()).collect::<Vec<_>>()
    };
    assert_eq!(keys(&before), keys(&after));
    project.project.assert_file_exists("build/native/vcpkg_installed/x64-linux/packages");
}

#[test]
fn configure_records_installed_packages_for_later_plans() {
    let project = Project::new(&["fmt", "zlib"]);
    let executor = RecordingExecutor::new();

    let before = project
        .runner(&executor)
        .plan_dependencies("native")
        .unwrap()
        .unwrap();
    assert_eq!(before.misses(), 2);

    project.runner(&executor).configure("native").unwrap();
    assert_eq!(executor.programs(), vec!["cmake"]);

    let after = project
        .runner(&executor)
        .plan_dependencies("native")
        .unwrap()
        .unwrap();
    assert_eq!(after.hits(), 2);
    project
        .project
        .assert_file_not_exists("build/native/vcpkg_installed/x64-linux/packages");
}

#[test]
fn recorded_entry_holds_the_installed_file_list() {
    let project = Project::new(&["fmt"]);
    let listing = "x64-linux/include/fmt/core.h\nx64-linux/lib/libfmt.a\n";
    project.project.write(
        "build/native/vcpkg_installed/vcpkg/info/fmt_10.2.1_x64-linux.list",
        listing,
    );
    let executor = RecordingExecutor::new();

    project.runner(&executor).configure("native").unwrap();

    let plan = project
        .runner(&executor)
        .plan_dependencies("native")
        .unwrap()
        .unwrap();
    let cache = BinaryCache::new(
        project.settings.binary_cache_dir.clone(),
        project.settings.cache_mode,
    );
    let artifact = cache.get(&plan.packages[0].key).unwrap().unwrap();
    assert_eq!(artifact.bytes, listing.as_bytes());
}

#[test]
fn dry_run_configure_records_nothing() {
    let project = Project::new(&["zlib"]);
    let executor = RecordingExecutor::new();

    project
        .runner(&executor)
        .dry_run(true)
        .configure("native")
        .unwrap();

    let plan = project
        .runner(&executor)
        .plan_dependencies("native")
        .unwrap()
        .unwrap();
    assert_eq!(plan.misses(), 1);
}

#[test]
fn other_triplet_does_not_share_entries() {
    let project = Project::new(&["fmt"]);
    project.resolve("native");

    let executor = RecordingExecutor::new();
    let cross = project
        .runner(&executor)
        .plan_dependencies("debug")
        .unwrap()
        .unwrap();

    assert_eq!(cross.triplet, "arm64-linux-gnu");
    assert_eq!(cross.hits(), 0);
}

#[test]
fn manifest_change_invalidates_entries() {
    let project = Project::new(&["fmt"]);
    project.resolve("native");

    project.project.write(
        "vcpkg.json",
        &format!(
            "{{\n  \"name\": \"sample\",\n  \"version\": \"0.2.0\",\n  \"dependencies\": [\"fmt\"],\n  \"builtin-baseline\": \"{COMMIT}\"\n}}\n"
        ),
    );

    let executor = RecordingExecutor::new();
    let plan = project
        .runner(&executor)
        .plan_dependencies("native")
        .unwrap()
        .unwrap();
    assert_eq!(plan.misses(), 1);
}

#[test]
fn corrupted_entry_fails_the_plan() {
    let project = Project::new(&["zlib"]);
    project.resolve("native");

    let executor = RecordingExecutor::new();
    let plan = project
        .runner(&executor)
        .plan_dependencies("native")
        .unwrap()
        .unwrap();
    let key = &plan.packages[0].key;
    let cache = BinaryCache::new(
        project.settings.binary_cache_dir.clone(),
        project.settings.cache_mode,
    );
    std::fs::write(cache.artifact_path(key).to_native(), b"tampered").unwrap();

    let err = project
        .runner(&executor)
        .plan_dependencies("native")
        .unwrap_err();
    assert!(err.to_string().contains("corruption"));
}
