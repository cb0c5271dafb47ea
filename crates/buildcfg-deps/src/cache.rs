//! Content-addressed binary cache
//!
//! ```text
//! <root>/
//!   3f/
//!     3fa1...e9.zip    prebuilt package artifact
//!     3fa1...e9.json   metadata sidecar
//! ```
//!
//! Entries are immutable: a changed input produces a new key and a new
//! entry, an existing entry is never rewritten, and nothing is evicted.

use crate::sources::CacheMode;
use crate::version::ResolvedPackage;
use crate::{Error, Result};
use buildcfg_fs::{Digest256, NormalizedPath, compute_bytes_checksum, io};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hex SHA-256 over manifest contents, baseline, triplet and package identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn compute(
        manifest: &[u8],
        baseline: &str,
        triplet: &str,
        package: &ResolvedPackage,
    ) -> Self {
        let digest = Digest256::new()
            .field("manifest", manifest)
            .field("baseline", baseline)
            .field("triplet", triplet)
            .field("package", &package.name)
            .field("version", &package.version)
            .field("port-version", package.port_version.to_string())
            .field("features", package.features.join(","))
            .finish_hex();
        Self(digest)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-character fan-out directory.
    pub fn shard(&self) -> &str {
        &self.0[..2.min(self.0.len())]
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sidecar stored next to each artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub key: CacheKey,
    pub package: String,
    pub version: String,
    pub triplet: String,
    /// `sha256:<hex>` of the artifact bytes.
    pub sha256: String,
    pub created: DateTime<Utc>,
}

/// An artifact read back from the cache, digest already verified.
#[derive(Debug, Clone)]
pub struct CachedArtifact {
    pub metadata: EntryMetadata,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct BinaryCache {
    root: NormalizedPath,
    mode: CacheMode,
}

impl BinaryCache {
    pub fn new(root: NormalizedPath, mode: CacheMode) -> Self {
        Self { root, mode }
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    pub fn artifact_path(&self, key: &CacheKey) -> NormalizedPath {
        self.root.join(key.shard()).join(&format!("{key}.zip"))
    }

    pub fn metadata_path(&self, key: &CacheKey) -> NormalizedPath {
        self.root.join(key.shard()).join(&format!("{key}.json"))
    }

    /// Whether a complete entry exists. Ignores the cache mode.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.artifact_path(key).is_file() && self.metadata_path(key).is_file()
    }

    /// Read an entry. Returns `None` on a miss or when the mode forbids reads.
    ///
    /// A present entry whose artifact does not match its recorded digest is
    /// corruption and fails the lookup.
    pub fn get(&self, key: &CacheKey) -> Result<Option<CachedArtifact>> {
        if !self.mode.can_read() {
            return Ok(None);
        }
        if !self.contains(key) {
            tracing::debug!(%key, "Binary cache miss");
            return Ok(None);
        }

        let metadata = self.read_metadata(key)?;
        let bytes = io::read_bytes(&self.artifact_path(key))?;
        let actual = compute_bytes_checksum(&bytes);
        if actual != metadata.sha256 {
            return Err(Error::CacheCorruption {
                key: key.to_string(),
                expected: metadata.sha256,
                actual,
            });
        }

        tracing::debug!(%key, package = %metadata.package, "Binary cache hit");
        Ok(Some(CachedArtifact { metadata, bytes }))
    }

    /// Store an artifact. Returns `false` when nothing was written, either
    /// because the mode forbids writes or the entry already exists.
    pub fn put(
        &self,
        key: &CacheKey,
        package: &ResolvedPackage,
        triplet: &str,
        bytes: &[u8],
    ) -> Result<bool> {
        if !self.mode.can_write() {
            return Ok(false);
        }
        if self.contains(key) {
            return Ok(false);
        }

        let metadata = EntryMetadata {
            key: key.clone(),
            package: package.name.clone(),
            version: package.version.clone(),
            triplet: triplet.to_string(),
            sha256: compute_bytes_checksum(bytes),
            created: Utc::now(),
        };
        let sidecar = serde_json::to_vec_pretty(&metadata).map_err(|e| Error::CacheMetadata {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        // Artifact first: the sidecar marks the entry complete.
        io::write_new(&self.artifact_path(key), bytes)?;
        let written = io::write_new(&self.metadata_path(key), &sidecar)?;

        tracing::debug!(%key, package = %package.name, "Stored binary cache entry");
        Ok(written)
    }

    fn read_metadata(&self, key: &CacheKey) -> Result<EntryMetadata> {
        let content = io::read_text(&self.metadata_path(key))?;
        serde_json::from_str(&content).map_err(|e| Error::CacheMetadata {
            key: key.to_string(),
            message: e.to_string(),
        })
    }
}
