//! Layered resolver settings
//!
//! Settings are merged from these sources, later ones winning:
//! 1. Built-in defaults
//! 2. Global config (`<config_dir>/buildcfg/config.toml`)
//! 3. Project config (`.buildcfg/config.toml`)
//! 4. Local overrides (`.buildcfg/config.local.toml`)
//! 5. `VCPKG_*` environment variables
//!
//! Missing files are skipped. A file that does not parse is an error.

use crate::error::ConfigurationError;
use crate::guard::is_truthy;
use crate::Result;
use buildcfg_deps::{BinarySources, CacheMode};
use buildcfg_fs::{NormalizedPath, ProjectFile, io};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const DEFAULT_VCPKG_ROOT: &str = "external/vcpkg";
pub const DEFAULT_BINARY_CACHE_DIR: &str = "external/vcpkg-cache";

/// One settings file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SettingsLayer {
    cmake: Option<String>,
    ctest: Option<String>,
    cpack: Option<String>,
    vcpkg_root: Option<String>,
    binary_cache_dir: Option<String>,
    binary_sources: Option<String>,
    cache_mode: Option<CacheMode>,
    disable_telemetry: Option<bool>,
    compiler_search_dirs: Option<Vec<String>>,
    default_triplet: Option<String>,
}

/// Effective settings for one source tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub cmake: String,
    pub ctest: String,
    pub cpack: String,
    /// Checkout of the dependency manager, pinned as a submodule.
    pub vcpkg_root: NormalizedPath,
    pub binary_cache_dir: NormalizedPath,
    /// Raw binary source spec; replaces the files-only default when set.
    pub binary_sources: Option<String>,
    pub cache_mode: CacheMode,
    pub disable_telemetry: bool,
    /// Overrides the compiler discovery directories when non-empty.
    pub compiler_search_dirs: Vec<NormalizedPath>,
    pub default_triplet: Option<String>,
}

impl Settings {
    /// Built-in defaults with paths under `source_dir`.
    pub fn defaults(source_dir: &NormalizedPath) -> Self {
        Self {
            cmake: "cmake".to_string(),
            ctest: "ctest".to_string(),
            cpack: "cpack".to_string(),
            vcpkg_root: source_dir.join(DEFAULT_VCPKG_ROOT),
            binary_cache_dir: source_dir.join(DEFAULT_BINARY_CACHE_DIR),
            binary_sources: None,
            cache_mode: CacheMode::ReadWrite,
            disable_telemetry: true,
            compiler_search_dirs: Vec::new(),
            default_triplet: None,
        }
    }

    /// Binary sources handed to the dependency manager.
    ///
    /// Without an explicit spec this is `clear;files,<binary_cache_dir>,<mode>`
    /// so only the project cache is consulted.
    pub fn binary_sources(&self) -> Result<BinarySources> {
        match &self.binary_sources {
            Some(spec) => Ok(BinarySources::parse(spec)?),
            None => Ok(BinarySources::files_only(
                self.binary_cache_dir.as_str(),
                self.cache_mode,
            )),
        }
    }

    fn apply(&mut self, layer: SettingsLayer, source_dir: &NormalizedPath) {
        if let Some(cmake) = layer.cmake {
            self.cmake = cmake;
        }
        if let Some(ctest) = layer.ctest {
            self.ctest = ctest;
        }
        if let Some(cpack) = layer.cpack {
            self.cpack = cpack;
        }
        if let Some(root) = layer.vcpkg_root {
            self.vcpkg_root = source_dir.join(&root);
        }
        if let Some(dir) = layer.binary_cache_dir {
            self.binary_cache_dir = source_dir.join(&dir);
        }
        if let Some(spec) = layer.binary_sources {
            self.binary_sources = Some(spec);
        }
        if let Some(mode) = layer.cache_mode {
            self.cache_mode = mode;
        }
        if let Some(disable) = layer.disable_telemetry {
            self.disable_telemetry = disable;
        }
        if let Some(dirs) = layer.compiler_search_dirs {
            self.compiler_search_dirs = dirs.iter().map(|d| source_dir.join(d)).collect();
        }
        if let Some(triplet) = layer.default_triplet {
            self.default_triplet = Some(triplet);
        }
    }
}

/// Resolves [`Settings`] for a source tree.
pub struct SettingsResolver {
    source_dir: NormalizedPath,
    /// When `None`, `dirs::config_dir()` is used.
    global_config_dir_override: Option<PathBuf>,
    env: BTreeMap<String, String>,
}

impl SettingsResolver {
    pub fn new(source_dir: NormalizedPath) -> Self {
        Self {
            source_dir,
            global_config_dir_override: None,
            env: BTreeMap::new(),
        }
    }

    /// Use a custom global config directory instead of the user's.
    pub fn with_global_config_dir(source_dir: NormalizedPath, global_config_dir: PathBuf) -> Self {
        Self {
            source_dir,
            global_config_dir_override: Some(global_config_dir),
            env: BTreeMap::new(),
        }
    }

    /// Environment consulted by the last layer.
    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    fn global_config_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.global_config_dir_override {
            return Some(dir.clone());
        }
        dirs::config_dir().map(|d| d.join("buildcfg"))
    }

    pub fn resolve(&self) -> Result<Settings> {
        let mut settings = Settings::defaults(&self.source_dir);

        let settings_dir = self.source_dir.join(ProjectFile::SettingsDir.as_str());
        let mut layers = Vec::new();
        if let Some(global) = self.global_config_dir() {
            layers.push(NormalizedPath::new(global.join("config.toml")));
        }
        layers.push(settings_dir.join("config.toml"));
        layers.push(settings_dir.join("config.local.toml"));

        for path in layers {
            if !path.is_file() {
                tracing::debug!(%path, "No settings file, skipping");
                continue;
            }
            tracing::debug!(%path, "Loading settings");
            let layer = parse_layer(&path)?;
            settings.apply(layer, &self.source_dir);
        }

        self.apply_env(&mut settings);
        Ok(settings)
    }

    fn apply_env(&self, settings: &mut Settings) {
        let var = |name: &str| self.env.get(name).filter(|v| !v.is_empty());

        if let Some(root) = var("VCPKG_ROOT") {
            settings.vcpkg_root = self.source_dir.join(root);
        }
        if let Some(spec) = var("VCPKG_BINARY_SOURCES") {
            settings.binary_sources = Some(spec.clone());
        }
        if let Some(flag) = self.env.get("VCPKG_DISABLE_METRICS") {
            settings.disable_telemetry = flag.is_empty() || is_truthy(flag);
        }
        if let Some(triplet) = var("VCPKG_DEFAULT_TRIPLET") {
            settings.default_triplet = Some(triplet.clone());
        }
    }
}

fn parse_layer(path: &NormalizedPath) -> Result<SettingsLayer> {
    let content = io::read_text(path)?;
    toml::from_str(&content).map_err(|e| {
        ConfigurationError::Settings {
            path: path.to_native(),
            message: e.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        source: NormalizedPath,
        global: PathBuf,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let source = NormalizedPath::new(temp.path().join("src"));
        let global = temp.path().join("global");
        fs::create_dir_all(source.join(".buildcfg").to_native()).unwrap();
        fs::create_dir_all(&global).unwrap();
        Fixture {
            _temp: temp,
            source,
            global,
        }
    }

    fn resolver(f: &Fixture) -> SettingsResolver {
        SettingsResolver::with_global_config_dir(f.source.clone(), f.global.clone())
    }

    #[test]
    fn defaults_point_into_source_tree() {
        let f = fixture();
        let settings = resolver(&f).resolve().unwrap();

        assert_eq!(settings.vcpkg_root, f.source.join("external/vcpkg"));
        assert_eq!(settings.binary_cache_dir, f.source.join("external/vcpkg-cache"));
        assert_eq!(settings.cache_mode, CacheMode::ReadWrite);
        assert!(settings.disable_telemetry);
        assert_eq!(
            settings.binary_sources().unwrap().to_string(),
            format!("clear;files,{},readwrite", f.source.join("external/vcpkg-cache"))
        );
    }

    #[test]
    fn later_layers_win() {
        let f = fixture();
        fs::write(
            f.global.join("config.toml"),
            "cmake = \"/opt/cmake/bin/cmake\"\ncache_mode = \"read\"\n",
        )
        .unwrap();
        fs::write(
            f.source.join(".buildcfg/config.toml").to_native(),
            "cache_mode = \"write\"\nbinary_cache_dir = \"/var/cache/bcfg\"\n",
        )
        .unwrap();
        fs::write(
            f.source.join(".buildcfg/config.local.toml").to_native(),
            "disable_telemetry = false\n",
        )
        .unwrap();

        let settings = resolver(&f).resolve().unwrap();

        assert_eq!(settings.cmake, "/opt/cmake/bin/cmake");
        assert_eq!(settings.cache_mode, CacheMode::Write);
        assert_eq!(settings.binary_cache_dir, NormalizedPath::new("/var/cache/bcfg"));
        assert!(!settings.disable_telemetry);
    }

    #[test]
    fn environment_overrides_files() {
        let f = fixture();
        fs::write(
            f.source.join(".buildcfg/config.toml").to_native(),
            "default_triplet = \"x64-linux\"\n",
        )
        .unwrap();
        let env = BTreeMap::from([
            ("VCPKG_DEFAULT_TRIPLET".to_string(), "arm64-linux".to_string()),
            ("VCPKG_ROOT".to_string(), "/opt/vcpkg".to_string()),
            (
                "VCPKG_BINARY_SOURCES".to_string(),
                "clear;files,/mnt/cache,read".to_string(),
            ),
        ]);

        let settings = resolver(&f).with_env(env).resolve().unwrap();

        assert_eq!(settings.default_triplet.as_deref(), Some("arm64-linux"));
        assert_eq!(settings.vcpkg_root, NormalizedPath::new("/opt/vcpkg"));
        assert_eq!(
            settings.binary_sources().unwrap().to_string(),
            "clear;files,/mnt/cache,read"
        );
    }

    #[test]
    fn unknown_key_is_reported_with_path() {
        let f = fixture();
        fs::write(
            f.source.join(".buildcfg/config.toml").to_native(),
            "cmak = \"typo\"\n",
        )
        .unwrap();

        let err = resolver(&f).resolve().unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Configuration(ConfigurationError::Settings { .. })
        ));
    }
}
