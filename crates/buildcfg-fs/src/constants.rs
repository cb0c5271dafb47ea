//! Well-known project files.

use std::path::Path;

/// Files the resolver looks for in a source tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectFile {
    /// `CMakeLists.txt`, the project descriptor
    ProjectDescriptor,
    /// `CMakePresets.json`, the checked-in preset registry
    Presets,
    /// `CMakeUserPresets.json`, developer-local presets
    UserPresets,
    /// `vcpkg.json`, the dependency manifest
    DependencyManifest,
    /// `vcpkg-configuration.json`, the registry pin
    RegistryPin,
    /// `.buildcfg`, the settings directory
    SettingsDir,
}

impl ProjectFile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectDescriptor => "CMakeLists.txt",
            Self::Presets => "CMakePresets.json",
            Self::UserPresets => "CMakeUserPresets.json",
            Self::DependencyManifest => "vcpkg.json",
            Self::RegistryPin => "vcpkg-configuration.json",
            Self::SettingsDir => ".buildcfg",
        }
    }
}

impl AsRef<Path> for ProjectFile {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for ProjectFile {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for ProjectFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
