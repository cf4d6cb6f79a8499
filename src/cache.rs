//! Output cache for incremental builds.
//!
//! Rendering is cheap, but rewriting every HTML file on every build touches
//! every modification time in the output directory, which makes `rsync` and
//! similar deploy tools re-upload the whole site. This module lets the generate
//! stage skip writing a page whose rendered bytes are identical to what the
//! previous build wrote.
//!
//! ## Cache keys
//!
//! Entries map an output path (relative to the output directory) to the
//! SHA-256 of the bytes last written there. A page is skipped when:
//! 1. An entry for its output path exists with the same hash
//! 2. The output file is still on disk
//!
//! The hash is of the *rendered* output, so a change to config, a partial, or
//! the page itself is picked up without tracking dependencies.
//!
//! ## Storage
//!
//! The cache manifest is a JSON file at `<output_dir>/.sitefold-cache.json`.
//!
//! ## Bypassing the cache
//!
//! Pass `--no-cache` to `build` or `generate` to write every page.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the cache manifest file within the output directory.
const MANIFEST_FILENAME: &str = ".sitefold-cache.json";

/// Version of the cache manifest format. Bump this to invalidate all
/// existing caches when the format or key computation changes.
const MANIFEST_VERSION: u32 = 1;

/// On-disk map of output path → content hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: BTreeMap<String, String>,
}

impl CacheManifest {
    /// Create an empty manifest (used for `--no-cache` or first build).
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: BTreeMap::new(),
        }
    }

    /// Load from the output directory. Returns an empty manifest if the
    /// file doesn't exist or can't be parsed (version mismatch, corruption).
    pub fn load(output_dir: &Path) -> Self {
        let content = match std::fs::read_to_string(manifest_path(output_dir)) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(m) if m.version == MANIFEST_VERSION => m,
            _ => Self::empty(),
        }
    }

    /// Save to the output directory.
    pub fn save(&self, output_dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(manifest_path(output_dir), json)
    }

    /// Whether `output_path` already holds content with `content_hash`.
    pub fn is_current(&self, output_path: &str, content_hash: &str, output_dir: &Path) -> bool {
        self.entries
            .get(output_path)
            .is_some_and(|h| h == content_hash)
            && output_dir.join(output_path).is_file()
    }

    pub fn insert(&mut self, output_path: String, content_hash: String) {
        self.entries.insert(output_path, content_hash);
    }

    /// Forget an output path, e.g. after its page failed to render.
    pub fn remove(&mut self, output_path: &str) {
        self.entries.remove(output_path);
    }
}

/// SHA-256 of a byte slice, returned as a hex string.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Summary of cache behavior for a build run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub unchanged: u32,
    pub written: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.unchanged += 1;
    }

    pub fn miss(&mut self) {
        self.written += 1;
    }

    pub fn total(&self) -> u32 {
        self.unchanged + self.written
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unchanged > 0 {
            write!(
                f,
                "{} unchanged, {} written ({} total)",
                self.unchanged,
                self.written,
                self.total()
            )
        } else {
            write!(f, "{} written", self.written)
        }
    }
}

/// Resolve the cache manifest path for an output directory.
pub fn manifest_path(output_dir: &Path) -> PathBuf {
    output_dir.join(MANIFEST_FILENAME)
}
