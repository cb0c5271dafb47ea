//! Dependency resolution for a build configuration
//!
//! The external dependency manager is a black box with a contract: given a
//! [`DependencyRequest`] it resolves the manifest deterministically and
//! reuses cached artifacts. This crate renders that contract, and also
//! provides an in-process [`CachedResolver`] with the same guarantees for
//! planning and for hosts that build ports themselves.

pub mod cache;
pub mod contract;
pub mod error;
pub mod resolver;
pub mod sources;
pub mod tool;
pub mod version;

pub use cache::{BinaryCache, CacheKey, CachedArtifact, EntryMetadata};
pub use contract::{DependencyRequest, pinned_baseline};
pub use error::{Error, Result};
pub use resolver::{
    CachedResolver, PackageOutcome, PackageStatus, PortBuilder, ResolutionInput,
    ResolutionReport, installed_artifact,
};
pub use sources::{BinarySource, BinarySources, CacheMode};
pub use tool::{ExternalResolver, VcpkgTool};
pub use version::{ResolvedPackage, VersionResolver, compare_versions};
