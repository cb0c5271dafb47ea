//! Command lines for each stage tool

use crate::preset::{EffectiveBuild, EffectiveConfig, EffectivePackage, EffectiveTest};
use crate::settings::Settings;
use buildcfg_fs::NormalizedPath;
use buildcfg_meta::schema::CacheValue;
use buildcfg_toolchain::{Host, ToolchainField, ToolchainState};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A program invocation: argv, extra environment and working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<NormalizedPath>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn envs(mut self, env: &BTreeMap<String, String>) -> Self {
        self.env.extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn with_cwd(mut self, cwd: NormalizedPath) -> Self {
        self.cwd = Some(cwd);
        self
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

fn quote(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains([' ', '\t', '"', '\'', ';']) {
        return arg.to_string();
    }
    format!("\"{}\"", arg.replace('"', "\\\""))
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn define(name: &str, value: &CacheValue) -> String {
    match value.type_name() {
        Some(kind) => format!("-D{name}:{kind}={}", value.as_string()),
        None => format!("-D{name}={}", value.as_string()),
    }
}

/// Cache variables contributed by a loaded toolchain.
///
/// The target system is left out for native builds, since setting
/// `CMAKE_SYSTEM_NAME` switches CMake into cross-compiling mode.
pub fn toolchain_defines(state: &ToolchainState, host: &Host) -> BTreeMap<String, String> {
    let native = state.system_name() == Some(host.system_name.as_str())
        && state.system_processor() == Some(host.processor.as_str());
    let mut defines = state.cache_variables();
    if native {
        defines.remove(ToolchainField::SystemName.cache_variable());
        defines.remove(ToolchainField::SystemProcessor.cache_variable());
    }
    defines
}

/// `cmake -S <src> -B <bin> [-G <gen>] -D...`
///
/// Toolchain values fill in cache variables the preset left unset. When
/// dependencies were installed ahead of configure, the toolchain file is
/// told not to install them again.
pub fn configure(
    settings: &Settings,
    config: &EffectiveConfig,
    toolchain: &BTreeMap<String, String>,
    installed_dir: Option<&NormalizedPath>,
) -> CommandSpec {
    let mut variables = config.cache_variables.clone();
    for (name, value) in toolchain {
        variables
            .entry(name.clone())
            .or_insert_with(|| CacheValue::String(value.clone()));
    }
    if let Some(installed_dir) = installed_dir {
        variables.insert(
            "VCPKG_MANIFEST_INSTALL".to_string(),
            CacheValue::Bool(false),
        );
        variables.insert(
            "VCPKG_INSTALLED_DIR".to_string(),
            CacheValue::from(installed_dir.as_str()),
        );
    }

    let mut command = CommandSpec::new(&settings.cmake)
        .args(["-S", config.source_dir.as_str(), "-B", config.binary_dir.as_str()]);
    if let Some(generator) = &config.generator {
        command = command.args(["-G", generator.as_str()]);
    }
    command
        .args(variables.iter().map(|(name, value)| define(name, value)))
        .envs(&config.environment)
}

/// `cmake --build <bin> ...`
pub fn build(settings: &Settings, build: &EffectiveBuild) -> CommandSpec {
    let mut command = CommandSpec::new(&settings.cmake)
        .args(["--build", build.configure.binary_dir.as_str()]);
    if let Some(configuration) = &build.configuration {
        command = command.args(["--config", configuration.as_str()]);
    }
    if !build.targets.is_empty() {
        command = command.arg("--target").args(build.targets.iter().cloned());
    }
    if let Some(jobs) = build.jobs {
        command = command.args(["--parallel".to_string(), jobs.to_string()]);
    }
    if build.clean_first {
        command = command.arg("--clean-first");
    }
    command.envs(&build.environment)
}

/// `ctest --test-dir <bin> ...`
pub fn test(settings: &Settings, test: &EffectiveTest) -> CommandSpec {
    let mut command = CommandSpec::new(&settings.ctest)
        .args(["--test-dir", test.configure.binary_dir.as_str()]);
    if let Some(configuration) = &test.configuration {
        command = command.args(["-C", configuration.as_str()]);
    }
    if test.output_on_failure {
        command = command.arg("--output-on-failure");
    }
    match test.verbosity.as_deref() {
        Some("verbose") => command = command.arg("-V"),
        Some("extra") => command = command.arg("-VV"),
        _ => {}
    }
    if let Some(name) = &test.include_name {
        command = command.args(["-R", name.as_str()]);
    }
    if let Some(label) = &test.include_label {
        command = command.args(["-L", label.as_str()]);
    }
    if let Some(jobs) = test.jobs {
        command = command.args(["-j".to_string(), jobs.to_string()]);
    }
    if test.stop_on_failure {
        command = command.arg("--stop-on-failure");
    }
    command.envs(&test.environment)
}

/// `cpack --config <bin>/CPackConfig.cmake ...`
pub fn package(settings: &Settings, package: &EffectivePackage) -> CommandSpec {
    let config = package.configure.binary_dir.join("CPackConfig.cmake");
    let mut command = CommandSpec::new(&settings.cpack).args(["--config", config.as_str()]);
    if !package.generators.is_empty() {
        command = command.args(["-G".to_string(), package.generators.join(";")]);
    }
    if !package.configurations.is_empty() {
        command = command.args(["-C".to_string(), package.configurations.join(";")]);
    }
    if let Some(dir) = &package.package_directory {
        command = command.args(["-B", dir.as_str()]);
    }
    command
        .envs(&package.environment)
        .with_cwd(package.configure.binary_dir.clone())
}
