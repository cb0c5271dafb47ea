//! Triplets and overlay lookup
//!
//! A triplet names the target of dependency builds: architecture,
//! operating system and library linkage. Lookup checks every overlay
//! directory for `<name>.cmake`; exactly one hit wins, more than one is
//! ambiguous, none falls back to the built-in set.

use crate::script::ToolchainScript;
use crate::{Error, Result};
use buildcfg_fs::NormalizedPath;
use serde::Serialize;

const BUILTIN_ARCHS: &[&str] = &["x64", "x86", "arm64", "arm"];
const BUILTIN_SYSTEMS: &[&str] = &["linux", "windows", "osx"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    Static,
    Dynamic,
}

impl Linkage {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "static" => Some(Self::Static),
            "dynamic" => Some(Self::Dynamic),
            _ => None,
        }
    }
}

/// Where a triplet definition came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "path")]
pub enum TripletSource {
    Builtin,
    Overlay(NormalizedPath),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Triplet {
    pub name: String,
    /// vcpkg architecture name: `x64`, `x86`, `arm64`, `arm`
    pub architecture: String,
    /// CMake system name: `Linux`, `Windows`, `Darwin`
    pub system_name: String,
    pub library_linkage: Linkage,
    pub crt_linkage: Linkage,
    pub chainload_toolchain_file: Option<NormalizedPath>,
    pub source: TripletSource,
}

impl Triplet {
    /// `CMAKE_SYSTEM_PROCESSOR` for the triplet's architecture.
    pub fn system_processor(&self) -> &str {
        match self.architecture.as_str() {
            "x64" => "x86_64",
            "x86" => "i686",
            "arm64" => "aarch64",
            "arm" => "armv7",
            other => other,
        }
    }

    /// GNU tool prefix used when cross compiling on a Linux host, e.g.
    /// `aarch64-linux-gnu-`.
    pub fn gnu_prefix(&self) -> Option<String> {
        if self.system_name != "Linux" {
            return None;
        }
        let prefix = match self.architecture.as_str() {
            "x64" => "x86_64-linux-gnu-",
            "x86" => "i686-linux-gnu-",
            "arm64" => "aarch64-linux-gnu-",
            "arm" => "arm-linux-gnueabihf-",
            _ => return None,
        };
        Some(prefix.to_string())
    }

    /// Parse a built-in triplet name like `arm64-linux` or `x64-windows-static`.
    pub fn builtin(name: &str) -> Option<Self> {
        let mut parts = name.splitn(3, '-');
        let arch = parts.next()?;
        let system = parts.next()?;
        let variant = parts.next();

        if !BUILTIN_ARCHS.contains(&arch) || !BUILTIN_SYSTEMS.contains(&system) {
            return None;
        }

        let default_linkage = if system == "windows" {
            Linkage::Dynamic
        } else {
            Linkage::Static
        };
        let library_linkage = match variant {
            None => default_linkage,
            Some(v) => Linkage::parse(v)?,
        };

        Some(Self {
            name: name.to_string(),
            architecture: arch.to_string(),
            system_name: cmake_system_name(system).to_string(),
            library_linkage,
            crt_linkage: default_linkage,
            chainload_toolchain_file: None,
            source: TripletSource::Builtin,
        })
    }

    /// Read an overlay triplet file.
    pub fn from_overlay(name: &str, path: &NormalizedPath) -> Result<Self> {
        let script = ToolchainScript::load(path)?;

        let architecture = script
            .get("VCPKG_TARGET_ARCHITECTURE")
            .ok_or_else(|| Error::IncompleteTriplet {
                path: path.to_native(),
                variable: "VCPKG_TARGET_ARCHITECTURE".to_string(),
            })?
            .to_string();

        // vcpkg treats an empty system name as Windows.
        let system_name = match script.get("VCPKG_CMAKE_SYSTEM_NAME") {
            None => "Windows".to_string(),
            Some(system) => system.to_string(),
        };

        let library_linkage = script
            .get("VCPKG_LIBRARY_LINKAGE")
            .and_then(Linkage::parse)
            .unwrap_or(Linkage::Static);
        let crt_linkage = script
            .get("VCPKG_CRT_LINKAGE")
            .and_then(Linkage::parse)
            .unwrap_or(Linkage::Dynamic);

        let base = path.parent().unwrap_or_else(|| path.clone());
        let chainload_toolchain_file = script
            .get("VCPKG_CHAINLOAD_TOOLCHAIN_FILE")
            .map(|file| base.join(file));

        Ok(Self {
            name: name.to_string(),
            architecture,
            system_name,
            library_linkage,
            crt_linkage,
            chainload_toolchain_file,
            source: TripletSource::Overlay(path.clone()),
        })
    }
}

fn cmake_system_name(system: &str) -> &str {
    match system {
        "linux" => "Linux",
        "windows" => "Windows",
        "osx" => "Darwin",
        other => other,
    }
}

/// Resolves triplet names against overlay directories and built-ins.
#[derive(Debug, Clone, Default)]
pub struct TripletRegistry {
    overlay_dirs: Vec<NormalizedPath>,
}

impl TripletRegistry {
    pub fn new(overlay_dirs: Vec<NormalizedPath>) -> Self {
        Self { overlay_dirs }
    }

    pub fn overlay_dirs(&self) -> &[NormalizedPath] {
        &self.overlay_dirs
    }

    pub fn lookup(&self, name: &str) -> Result<Triplet> {
        let file_name = format!("{name}.cmake");
        let mut candidates: Vec<NormalizedPath> = self
            .overlay_dirs
            .iter()
            .map(|dir| dir.join(&file_name))
            .filter(|path| path.is_file())
            .collect();
        candidates.dedup();

        match candidates.as_slice() {
            [single] => {
                tracing::debug!(triplet = name, path = %single, "Using overlay triplet");
                Triplet::from_overlay(name, single)
            }
            [] => Triplet::builtin(name).ok_or_else(|| Error::UnknownTriplet {
                name: name.to_string(),
            }),
            _ => Err(Error::AmbiguousTriplet {
                name: name.to_string(),
                candidates: candidates.iter().map(NormalizedPath::to_native).collect(),
            }),
        }
    }
}
