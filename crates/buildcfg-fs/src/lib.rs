//! Filesystem helpers for the build configuration resolver
//!
//! Provides normalized path handling, project-file markers, content digests,
//! atomic writes, and loading of JSON and TOML project documents.

pub mod checksum;
pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod path;

pub use checksum::{Digest256, compute_bytes_checksum, compute_content_checksum};
pub use config::{ConfigStore, DocumentFormat};
pub use constants::ProjectFile;
pub use error::{Error, Result};
pub use path::NormalizedPath;
