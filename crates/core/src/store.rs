//! Persisted proof storage
//!
//! One proof is one addressable JSON record under the store root, keyed
//! by its identity. Records are written atomically (temp file, then
//! rename) so a mutating operation either applies fully or leaves the
//! on-disk record untouched.

use crate::proof::{Proof, ProofData, ProofId};
use crate::result::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory-backed proof store, partitioned by proof id.
#[derive(Debug, Clone)]
pub struct ProofStore {
    root: PathBuf,
}

impl ProofStore {
    /// Opens a store rooted at `root`; the directory is created lazily on
    /// first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, id: &ProofId) -> PathBuf {
        self.root.join(format!("{}.json", id.file_stem()))
    }

    /// True when a record for the identity exists on disk.
    pub fn contains(&self, id: &ProofId) -> bool {
        self.record_path(id).is_file()
    }

    /// Persists the whole proof record atomically.
    pub fn save(&self, proof: &Proof) -> Result<()> {
        let path = self.record_path(&proof.id);
        let write_err = |source| Error::ProofWrite {
            path: path.display().to_string(),
            source,
        };
        fs::create_dir_all(&self.root).map_err(write_err)?;
        let tmp = path.with_extension("json.tmp");
        let text = serde_json::to_string(&proof.to_data())?;
        fs::write(&tmp, text).map_err(write_err)?;
        fs::rename(&tmp, &path).map_err(write_err)?;
        tracing::debug!(proof = %proof.id, path = %path.display(), "persisted proof record");
        Ok(())
    }

    /// Loads and rebuilds the proof for the identity.
    pub fn load(&self, id: &ProofId) -> Result<Proof> {
        let path = self.record_path(id);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::UnknownProof(id.to_string()));
            }
            Err(source) => {
                return Err(Error::ProofRead {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        let data: ProofData = serde_json::from_str(&text)?;
        Proof::from_data(data)
    }

    /// All persisted versions for a qualified test, ascending.
    pub fn versions(&self, contract: &str, signature: &str) -> Vec<u32> {
        let mut versions: Vec<u32> = Vec::new();
        let Ok(entries) = fs::read_dir(&self.root) else {
            return versions;
        };
        let prefix = ProofId::new(contract, signature, 0).file_stem();
        // file_stem ends with "_0" for version 0; strip it to get the
        // shared prefix every version of this test starts with.
        let prefix = prefix
            .strip_suffix('0')
            .map(str::to_string)
            .unwrap_or(prefix);
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(stem) = name.to_str().and_then(|name| name.strip_suffix(".json")) else {
                continue;
            };
            if let Some(rest) = stem.strip_prefix(&prefix)
                && let Ok(version) = rest.parse::<u32>()
            {
                versions.push(version);
            }
        }
        versions.sort_unstable();
        versions
    }

    /// Highest persisted version for a qualified test.
    pub fn latest_version(&self, contract: &str, signature: &str) -> Option<u32> {
        self.versions(contract, signature).into_iter().next_back()
    }
}
