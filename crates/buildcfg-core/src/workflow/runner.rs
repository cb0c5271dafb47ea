//! The stage runner
//!
//! Configure runs: resolve, guardrails, toolchain chain-load, dependency
//! stage, then `cmake`. Build, test and package resolve their preset and
//! run one tool each. A workflow resolves and checks every step up front,
//! then runs them in order and stops at the first failure.

use super::commands::{self, CommandSpec};
use super::executor::CommandExecutor;
use super::state::{Stage, WorkflowState};
use crate::guard::ensure_out_of_source;
use crate::host::HostContext;
use crate::preset::{
    EffectiveBuild, EffectiveConfig, EffectivePackage, EffectiveTest, PlannedStep, PresetResolver,
};
use crate::settings::Settings;
use crate::{Error, Result};
use buildcfg_deps::{
    BinaryCache, CachedResolver, DependencyRequest, ExternalResolver, PortBuilder,
    ResolutionInput, ResolutionReport, ResolvedPackage, VersionResolver, pinned_baseline,
};
use buildcfg_fs::{NormalizedPath, ProjectFile, io};
use buildcfg_meta::schema::RegistryPin;
use buildcfg_meta::{PresetRegistry, load_baseline, load_manifest, load_registry_pin};
use buildcfg_toolchain::{ChainLoader, LoadedToolchain, ToolchainContext, TripletRegistry};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Directory under the binary dir that receives installed dependencies.
pub const INSTALLED_DIR: &str = "vcpkg_installed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StageStatus {
    Succeeded,
    Failed {
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<i32>,
        message: String,
    },
    /// Not run because an earlier stage failed.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub preset: String,
    #[serde(flatten)]
    pub status: StageStatus,
    pub duration_ms: u64,
}

/// Outcome of a workflow run.
#[derive(Debug, Serialize)]
pub struct WorkflowReport {
    pub workflow: String,
    pub stages: Vec<StageReport>,
    pub state: WorkflowState,
    /// The error that stopped the run.
    #[serde(skip)]
    pub failure: Option<Error>,
}

impl WorkflowReport {
    pub fn succeeded(&self) -> bool {
        self.state == WorkflowState::Succeeded
    }

    /// Hand over the stopping error, if any.
    pub fn take_failure(&mut self) -> Option<Error> {
        self.failure.take()
    }
}

/// Runs stages for presets of one source tree.
pub struct StageRunner<'a> {
    registry: &'a PresetRegistry,
    settings: &'a Settings,
    host: &'a HostContext,
    executor: &'a dyn CommandExecutor,
    dependencies: &'a dyn ExternalResolver,
    chain_loader: ChainLoader,
    dry_run: bool,
}

impl<'a> StageRunner<'a> {
    pub fn new(
        registry: &'a PresetRegistry,
        settings: &'a Settings,
        host: &'a HostContext,
        executor: &'a dyn CommandExecutor,
        dependencies: &'a dyn ExternalResolver,
    ) -> Self {
        Self {
            registry,
            settings,
            host,
            executor,
            dependencies,
            chain_loader: ChainLoader::standard(),
            dry_run: false,
        }
    }

    pub fn with_chain_loader(mut self, chain_loader: ChainLoader) -> Self {
        self.chain_loader = chain_loader;
        self
    }

    /// Skip filesystem changes; commands still go to the executor.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn resolver(&self) -> PresetResolver<'a> {
        PresetResolver::new(self.registry, self.host)
            .with_default_triplet(self.settings.default_triplet.clone())
    }

    pub fn configure(&self, preset: &str) -> Result<()> {
        let config = self.resolver().resolve_configure(preset)?;
        self.run_configure(&config)
    }

    pub fn build(&self, preset: &str) -> Result<()> {
        let build = self.resolver().resolve_build(preset)?;
        self.run_build(&build)
    }

    pub fn test(&self, preset: &str) -> Result<()> {
        let test = self.resolver().resolve_test(preset)?;
        self.run_test(&test)
    }

    pub fn package(&self, preset: &str) -> Result<()> {
        let package = self.resolver().resolve_package(preset)?;
        self.run_package(&package)
    }

    /// Run a workflow preset.
    ///
    /// Problems with the workflow itself are returned as errors before
    /// anything runs. Stage failures end up in the report.
    pub fn workflow(&self, name: &str) -> Result<WorkflowReport> {
        let plan = self.resolver().resolve_workflow(name)?;
        let mut report = WorkflowReport {
            workflow: name.to_string(),
            stages: Vec::with_capacity(plan.steps.len()),
            state: WorkflowState::NotStarted,
            failure: None,
        };

        let mut steps = plan.steps.iter();
        for step in steps.by_ref() {
            let stage = Stage::from(step.kind());
            report.state = report.state.advance(stage)?;
            tracing::info!("Workflow {name}: {stage} ({})", step.preset());

            let started = Instant::now();
            let result = self.run_step(step);
            let duration_ms = whole_millis(started.elapsed());

            match result {
                Ok(()) => report.stages.push(StageReport {
                    stage,
                    preset: step.preset().to_string(),
                    status: StageStatus::Succeeded,
                    duration_ms,
                }),
                Err(err) => {
                    tracing::warn!("Workflow {name} stopped: {err}");
                    report.stages.push(StageReport {
                        stage,
                        preset: step.preset().to_string(),
                        status: StageStatus::Failed {
                            code: err.tool_exit_code(),
                            message: err.to_string(),
                        },
                        duration_ms,
                    });
                    report.state = report.state.fail();
                    report.failure = Some(err);
                    break;
                }
            }
        }

        for step in steps {
            report.stages.push(StageReport {
                stage: Stage::from(step.kind()),
                preset: step.preset().to_string(),
                status: StageStatus::Skipped,
                duration_ms: 0,
            });
        }

        if report.failure.is_none() {
            report.state = report.state.succeed()?;
        }
        Ok(report)
    }

    /// Chain-load the toolchain of a configure preset without running
    /// anything.
    pub fn toolchain(&self, preset: &str) -> Result<LoadedToolchain> {
        let config = self.resolver().resolve_configure(preset)?;
        self.load_toolchain(&config)
    }

    /// The contract handed to the dependency manager for a configure
    /// preset, or `None` when the project has no manifest.
    pub fn dependency_request(&self, preset: &str) -> Result<Option<DependencyRequest>> {
        let config = self.resolver().resolve_configure(preset)?;
        self.request_for(&config)
    }

    /// Which packages the binary cache would serve for a configure preset.
    pub fn plan_dependencies(&self, preset: &str) -> Result<Option<ResolutionReport>> {
        let config = self.resolver().resolve_configure(preset)?;
        let Some(request) = self.request_for(&config)? else {
            return Ok(None);
        };
        let Some(manifest) = load_manifest(&config.source_dir)? else {
            return Ok(None);
        };
        let manifest_bytes = io::read_bytes(&request.manifest_path)?;

        let report = self.cached_resolver(&request, PlanOnly)?.plan(&ResolutionInput {
            manifest_bytes: &manifest_bytes,
            manifest: &manifest,
            triplet: &request.triplet,
            install_root: &request.install_root,
        })?;
        Ok(Some(report))
    }

    fn run_step(&self, step: &PlannedStep) -> Result<()> {
        match step {
            PlannedStep::Configure(config) => self.run_configure(config),
            PlannedStep::Build(build) => self.run_build(build),
            PlannedStep::Test(test) => self.run_test(test),
            PlannedStep::Package(package) => self.run_package(package),
        }
    }

    fn run_configure(&self, config: &EffectiveConfig) -> Result<()> {
        ensure_out_of_source(&config.source_dir, &config.binary_dir)?;

        let toolchain = self.load_toolchain(config)?;
        let installed = self.install_dependencies(config)?;

        if !self.dry_run {
            std::fs::create_dir_all(config.binary_dir.to_native())
                .map_err(|e| buildcfg_fs::Error::io(config.binary_dir.to_native(), e))?;
        }

        let defines = commands::toolchain_defines(&toolchain.state, &self.host.host);
        let command = commands::configure(self.settings, config, &defines, installed.as_ref());
        self.execute(Stage::Configure, &command)
    }

    fn run_build(&self, build: &EffectiveBuild) -> Result<()> {
        self.execute(Stage::Build, &commands::build(self.settings, build))
    }

    fn run_test(&self, test: &EffectiveTest) -> Result<()> {
        self.execute(Stage::Test, &commands::test(self.settings, test))
    }

    fn run_package(&self, package: &EffectivePackage) -> Result<()> {
        self.execute(Stage::Package, &commands::package(self.settings, package))
    }

    fn execute(&self, stage: Stage, command: &CommandSpec) -> Result<()> {
        tracing::info!("{stage}: {command}");
        let outcome = self.executor.run(command)?;
        if outcome.is_success() {
            return Ok(());
        }
        Err(Error::StageFailure {
            stage: stage.to_string(),
            command: command.to_string(),
            code: outcome.code,
        })
    }

    fn load_toolchain(&self, config: &EffectiveConfig) -> Result<LoadedToolchain> {
        let pin = load_registry_pin(&config.source_dir)?;
        let overlays = overlay_triplets(config, pin.as_ref());
        let triplet = TripletRegistry::new(overlays).lookup(&config.triplet)?;

        let mut context = ToolchainContext::new(self.host.host.clone());
        context.cache_variables = config.cache_strings();
        context.environment = self.host.env.clone();
        context.environment.extend(config.environment.clone());
        context.chainload_toolchain_file = config.chainload_toolchain_file.clone();
        context.triplet = Some(triplet);
        if !self.settings.compiler_search_dirs.is_empty() {
            context.search_dirs = self.settings.compiler_search_dirs.clone();
        }

        Ok(self.chain_loader.load(&context)?)
    }

    /// Install dependencies ahead of configure. Returns the install root
    /// when the dependency stage ran.
    fn install_dependencies(&self, config: &EffectiveConfig) -> Result<Option<NormalizedPath>> {
        if !config.manifest_mode {
            tracing::debug!(preset = %config.preset, "Manifest mode is off, skipping dependencies");
            return Ok(None);
        }
        let Some(request) = self.request_for(config)? else {
            tracing::debug!(preset = %config.preset, "No dependency manifest");
            return Ok(None);
        };

        tracing::info!(
            "Dependencies: {} for {} at baseline {}",
            request.manifest_path,
            request.triplet,
            request.baseline
        );
        self.dependencies.install(&request)?;
        if !self.dry_run {
            match self.record_installed(config, &request) {
                Ok(report) => tracing::debug!(
                    recorded = report.built(),
                    cached = report.hits(),
                    "Recorded installed dependencies in the binary cache"
                ),
                Err(err) => tracing::warn!("Binary cache not updated: {err}"),
            }
        }
        Ok(Some(request.install_root))
    }

    /// Store cache entries for what the dependency manager just installed,
    /// so later plans serve those packages as hits.
    fn record_installed(
        &self,
        config: &EffectiveConfig,
        request: &DependencyRequest,
    ) -> Result<ResolutionReport> {
        let Some(manifest) = load_manifest(&config.source_dir)? else {
            return Ok(ResolutionReport::default());
        };
        let manifest_bytes = io::read_bytes(&request.manifest_path)?;
        let installed = InstalledPorts {
            install_root: &request.install_root,
        };

        Ok(self.cached_resolver(request, installed)?.record(&ResolutionInput {
            manifest_bytes: &manifest_bytes,
            manifest: &manifest,
            triplet: &request.triplet,
            install_root: &request.install_root,
        })?)
    }

    /// A resolver over the request's file cache, or the configured cache
    /// directory when the binary sources name none.
    fn cached_resolver<B: PortBuilder>(
        &self,
        request: &DependencyRequest,
        builder: B,
    ) -> Result<CachedResolver<B>> {
        let database = load_baseline(&self.settings.vcpkg_root)?;
        let versions = VersionResolver::new(request.baseline.clone(), database);
        let (cache_dir, mode) = match request.binary_sources.files_source() {
            Some((path, mode)) => (NormalizedPath::new(path), mode),
            None => (self.settings.binary_cache_dir.clone(), self.settings.cache_mode),
        };
        Ok(CachedResolver::new(
            versions,
            BinaryCache::new(cache_dir, mode),
            builder,
        ))
    }

    fn request_for(&self, config: &EffectiveConfig) -> Result<Option<DependencyRequest>> {
        let Some(manifest) = load_manifest(&config.source_dir)? else {
            return Ok(None);
        };
        let pin = load_registry_pin(&config.source_dir)?;
        let baseline = pinned_baseline(&manifest, pin.as_ref())?;

        let overlay_ports = pin
            .as_ref()
            .map(|p| {
                p.overlay_ports
                    .iter()
                    .map(|d| config.source_dir.join(d))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Some(DependencyRequest {
            manifest_path: config
                .source_dir
                .join(ProjectFile::DependencyManifest.as_str()),
            manifest_root: config.source_dir.clone(),
            baseline,
            triplet: config.triplet.clone(),
            overlay_triplets: overlay_triplets(config, pin.as_ref()),
            overlay_ports,
            install_root: config.binary_dir.join(INSTALLED_DIR),
            binary_sources: self.settings.binary_sources()?,
            disable_telemetry: self.settings.disable_telemetry,
        }))
    }
}

/// Overlay triplet directories of the preset, then of the registry pin.
fn overlay_triplets(config: &EffectiveConfig, pin: Option<&RegistryPin>) -> Vec<NormalizedPath> {
    let mut dirs = config.overlay_triplets.clone();
    if let Some(pin) = pin {
        for dir in &pin.overlay_triplets {
            let dir = config.source_dir.join(dir);
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
    }
    dirs
}

/// Planning never builds.
/// Saturates at `u64::MAX` instead of wrapping.
fn whole_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Artifacts for packages the dependency manager installed: the
/// package's installed file list when the tool wrote one, otherwise its
/// identity.
struct InstalledPorts<'a> {
    install_root: &'a NormalizedPath,
}

impl PortBuilder for InstalledPorts<'_> {
    fn build(&self, package: &ResolvedPackage, triplet: &str) -> buildcfg_deps::Result<Vec<u8>> {
        let listing = self.install_root.join("vcpkg/info").join(&format!(
            "{}_{}_{}.list",
            package.name, package.version, triplet
        ));
        if listing.is_file() {
            return Ok(io::read_bytes(&listing)?);
        }
        Ok(format!("{}:{triplet}\n", package.identity()).into_bytes())
    }
}

struct PlanOnly;

impl PortBuilder for PlanOnly {
    fn build(&self, package: &ResolvedPackage, triplet: &str) -> buildcfg_deps::Result<Vec<u8>> {
        Err(buildcfg_deps::Error::BuildFailed {
            package: package.name.clone(),
            triplet: triplet.to_string(),
            message: "building is not available while planning".to_string(),
        })
    }
}
