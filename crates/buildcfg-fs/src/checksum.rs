//! SHA-256 digests
//!
//! Two flavours are produced: the canonical `sha256:<hex>` form recorded next
//! to cached artifacts, and bare hex keys built from labelled fields, used to
//! address binary cache entries.

use sha2::{Digest, Sha256};
use std::path::Path;

const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of string content as `sha256:<hex>`.
pub fn compute_content_checksum(content: &str) -> String {
    compute_bytes_checksum(content.as_bytes())
}

/// Compute the SHA-256 checksum of raw bytes as `sha256:<hex>`.
pub fn compute_bytes_checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Compute the SHA-256 checksum of a file's contents as `sha256:<hex>`.
pub fn compute_file_checksum(path: &Path) -> std::io::Result<String> {
    let content = std::fs::read(path)?;
    Ok(compute_bytes_checksum(&content))
}

/// Incremental digest over labelled, length-prefixed fields.
///
/// Each field contributes its label, its byte length and its bytes, so
/// `("ab", "c")` and `("a", "bc")` never collide.
#[derive(Clone, Default)]
pub struct Digest256 {
    hasher: Sha256,
}

impl Digest256 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, label: &str, value: impl AsRef<[u8]>) -> Self {
        let value = value.as_ref();
        self.hasher.update(label.as_bytes());
        self.hasher.update(b"\0");
        self.hasher.update((value.len() as u64).to_le_bytes());
        self.hasher.update(value);
        self
    }

    /// Finish and return lowercase hex without the `sha256:` prefix.
    pub fn finish_hex(self) -> String {
        format!("{:x}", self.hasher.finalize())
    }
}
