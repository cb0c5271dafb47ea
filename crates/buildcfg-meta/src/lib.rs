//! Schemas for the documents that drive a build configuration.
//!
//! - [`schema::PresetFile`]: `CMakePresets.json` / `CMakeUserPresets.json`
//! - [`schema::DependencyManifest`]: `vcpkg.json`
//! - [`schema::RegistryPin`]: `vcpkg-configuration.json`
//! - [`schema::BaselineDatabase`]: `versions/baseline.json` in a registry checkout
//!
//! [`loader::load_project`] reads a source tree's preset files (following
//! `include` chains) into a [`registry::PresetRegistry`].

pub mod error;
pub mod loader;
pub mod registry;
pub mod schema;

pub use error::{Error, Result};
pub use loader::{PresetLoader, load_baseline, load_manifest, load_project, load_registry_pin};
pub use registry::{PresetEntry, PresetRegistry};
