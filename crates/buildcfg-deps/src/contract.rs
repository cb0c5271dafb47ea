//! Inputs handed to the external dependency manager

use crate::sources::BinarySources;
use crate::{Error, Result};
use buildcfg_fs::NormalizedPath;
use buildcfg_meta::schema::{DependencyManifest, RegistryPin, is_commit_id};
use serde::Serialize;
use std::collections::BTreeMap;

/// Everything the dependency manager needs for one resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyRequest {
    pub manifest_path: NormalizedPath,
    pub manifest_root: NormalizedPath,
    /// Registry baseline commit.
    pub baseline: String,
    pub triplet: String,
    pub overlay_triplets: Vec<NormalizedPath>,
    pub overlay_ports: Vec<NormalizedPath>,
    pub install_root: NormalizedPath,
    pub binary_sources: BinarySources,
    pub disable_telemetry: bool,
}

impl DependencyRequest {
    /// Arguments after the tool name, e.g. `install --triplet=x64-linux ...`.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "install".to_string(),
            format!("--x-manifest-root={}", self.manifest_root),
            format!("--x-install-root={}", self.install_root),
            format!("--triplet={}", self.triplet),
        ];
        for dir in &self.overlay_triplets {
            args.push(format!("--overlay-triplets={dir}"));
        }
        for dir in &self.overlay_ports {
            args.push(format!("--overlay-ports={dir}"));
        }
        args.push(format!("--binarysource={}", self.binary_sources));
        if self.disable_telemetry {
            args.push("--disable-metrics".to_string());
        }
        args
    }

    /// Environment variables set for the tool process.
    pub fn env(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert(
            "VCPKG_BINARY_SOURCES".to_string(),
            self.binary_sources.to_string(),
        );
        env.insert("VCPKG_DEFAULT_TRIPLET".to_string(), self.triplet.clone());
        if self.disable_telemetry {
            env.insert("VCPKG_DISABLE_METRICS".to_string(), "1".to_string());
        }
        env
    }
}

/// The baseline commit in effect: the registry pin's default-registry
/// baseline, else the manifest's `builtin-baseline`.
pub fn pinned_baseline(
    manifest: &DependencyManifest,
    pin: Option<&RegistryPin>,
) -> Result<String> {
    if let Some(baseline) = pin.map(RegistryPin::default_baseline).transpose()?.flatten() {
        return Ok(baseline.to_string());
    }
    match manifest.builtin_baseline.as_deref() {
        Some(baseline) if is_commit_id(baseline) => Ok(baseline.to_string()),
        Some(baseline) => Err(buildcfg_meta::Error::InvalidBaseline {
            baseline: baseline.to_string(),
        }
        .into()),
        None => Err(Error::MissingBaseline),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::CacheMode;
    use pretty_assertions::assert_eq;

    const COMMIT: &str = "0123456789abcdef0123456789abcdef01234567";

    fn request() -> DependencyRequest {
        DependencyRequest {
            manifest_path: NormalizedPath::new("/src/vcpkg.json"),
            manifest_root: NormalizedPath::new("/src"),
            baseline: COMMIT.to_string(),
            triplet: "x64-linux".to_string(),
            overlay_triplets: vec![NormalizedPath::new("/src/cmake/triplets")],
            overlay_ports: vec![],
            install_root: NormalizedPath::new("/src/build/debug/vcpkg_installed"),
            binary_sources: BinarySources::files_only(
                "/src/external/vcpkg-cache",
                CacheMode::ReadWrite,
            ),
            disable_telemetry: true,
        }
    }

    #[test]
    fn renders_arguments() {
        assert_eq!(
            request().args(),
            vec![
                "install",
                "--x-manifest-root=/src",
                "--x-install-root=/src/build/debug/vcpkg_installed",
                "--triplet=x64-linux",
                "--overlay-triplets=/src/cmake/triplets",
                "--binarysource=clear;files,/src/external/vcpkg-cache,readwrite",
                "--disable-metrics",
            ]
        );
    }

    #[test]
    fn renders_environment() {
        let env = request().env();
        assert_eq!(
            env["VCPKG_BINARY_SOURCES"],
            "clear;files,/src/external/vcpkg-cache,readwrite"
        );
        assert_eq!(env["VCPKG_DISABLE_METRICS"], "1");
    }

    #[test]
    fn telemetry_left_alone_when_not_disabled() {
        let mut request = request();
        request.disable_telemetry = false;
        assert!(!request.env().contains_key("VCPKG_DISABLE_METRICS"));
        assert!(!request.args().contains(&"--disable-metrics".to_string()));
    }

    #[test]
    fn baseline_prefers_registry_pin() {
        let pin: RegistryPin = serde_json::from_str(&format!(
            r#"{{"default-registry": {{"kind": "builtin", "baseline": "{COMMIT}"}}}}"#
        ))
        .unwrap();
        let manifest = DependencyManifest {
            builtin_baseline: Some("f".repeat(40)),
            ..Default::default()
        };

        assert_eq!(pinned_baseline(&manifest, Some(&pin)).unwrap(), COMMIT);
        assert_eq!(pinned_baseline(&manifest, None).unwrap(), "f".repeat(40));
    }

    #[test]
    fn no_baseline_anywhere_is_an_error() {
        let err = pinned_baseline(&DependencyManifest::default(), None).unwrap_err();
        assert!(matches!(err, Error::MissingBaseline));
    }
}
