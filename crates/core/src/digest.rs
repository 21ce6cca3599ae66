//! Content digests and the persisted digest file
//!
//! Digests detect whether a test's or contract's logic changed since the
//! last proof. The file is a single JSON map keyed by qualified test
//! name; a missing entry is treated identically to a stale one.

use crate::result::{Error, Result};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Hex digest over an ordered sequence of byte chunks.
pub fn hash_hex(chunks: &[&[u8]]) -> String {
    let mut hasher = Sha3_256::new();
    for chunk in chunks {
        hasher.update(chunk);
    }
    hex::encode(hasher.finalize())
}

/// Stored digests for one qualified test name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestEntry {
    /// Digest of the method: signature, AST, and storage layout (plus the
    /// contract content hash for everything except `setUp`).
    pub method: String,
    /// Digest of the contract's own content.
    pub contract: String,
}

/// The persisted digest file.
#[derive(Debug, Clone)]
pub struct DigestFile {
    path: PathBuf,
    entries: BTreeMap<String, DigestEntry>,
}

impl DigestFile {
    /// Loads the digest file, treating a missing file as empty.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => {
                return Err(Error::DigestRead {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        Ok(Self { path, entries })
    }

    /// Writes the file atomically (temp file, then rename).
    pub fn save(&self) -> Result<()> {
        let write_err = |source| Error::DigestWrite {
            path: self.path.display().to_string(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let text = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&tmp, text).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }

    /// The stored entry for a qualified test name.
    pub fn entry(&self, test: &str) -> Option<&DigestEntry> {
        self.entries.get(test)
    }

    /// True when the stored method digest matches `current`. Absent
    /// entries are stale by definition.
    pub fn method_current(&self, test: &str, current: &DigestEntry) -> bool {
        self.entries
            .get(test)
            .is_some_and(|stored| stored.method == current.method)
    }

    /// True when the stored contract digest matches `current`.
    pub fn contract_current(&self, test: &str, current: &DigestEntry) -> bool {
        self.entries
            .get(test)
            .is_some_and(|stored| stored.contract == current.contract)
    }

    /// Records the current digests for a test. Callers persist with
    /// [`DigestFile::save`] before exploration starts, so a crash
    /// mid-proof cannot leave a stale-looking digest behind.
    pub fn update(&mut self, test: impl Into<String>, entry: DigestEntry) {
        self.entries.insert(test.into(), entry);
    }

    /// Path this file loads from and saves to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
