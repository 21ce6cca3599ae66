//! Proof version resolution
//!
//! Maps a qualified test name to a stable version number by comparing
//! the method's current content digest against the persisted digest
//! file. A matching digest reuses the latest on-disk proof; a stale or
//! absent digest (or an explicit reinit) allocates the next version and
//! forces fresh construction.

use crate::contract::{Contract, Method};
use crate::{Error, Result};
use athanor_core::digest::DigestFile;
use athanor_core::store::ProofStore;
use athanor_core::ProofId;

/// Resolves the version to prove for `method` of `contract`.
///
/// `reinit` and `requested` are mutually exclusive. The digest file is
/// only read here; recording the current digests before exploration is
/// the runner's responsibility.
pub fn resolve_proof_version(
    store: &ProofStore,
    digests: &DigestFile,
    contract: &Contract,
    method: &Method,
    reinit: bool,
    requested: Option<u32>,
) -> Result<u32> {
    if reinit && requested.is_some() {
        return Err(Error::VersionConflict);
    }

    let signature = method.signature();
    let test = format!("{}.{}", contract.name, signature);
    let current = contract.digest_entry(method);
    let latest = store.latest_version(&contract.name, &signature);

    if reinit {
        let version = latest.map_or(0, |latest| latest + 1);
        tracing::debug!(%test, version, "reinit requested, allocating fresh version");
        return Ok(version);
    }

    if let Some(version) = requested {
        let id = ProofId::new(&contract.name, &signature, version);
        if !store.contains(&id) {
            return Err(Error::UnknownVersion { test, version });
        }
        if !digests.method_current(&test, &current) {
            tracing::warn!(
                %test,
                version,
                "method digest changed since this version was proved; results may be stale"
            );
        }
        return Ok(version);
    }

    if !digests.method_current(&test, &current) {
        let version = latest.map_or(0, |latest| latest + 1);
        tracing::debug!(%test, version, "digest stale or absent, allocating fresh version");
        return Ok(version);
    }

    match latest {
        Some(version) => {
            if !digests.contract_current(&test, &current) {
                tracing::warn!(
                    %test,
                    version,
                    "contract digest changed while the method digest is unchanged; \
                     reusing the proof, but results may not reflect the current contract"
                );
            }
            Ok(version)
        }
        None => Ok(0),
    }
}
