//! Contract and method inputs
//!
//! Athanor consumes compilation artifacts already reduced to the fields
//! the proof pipeline needs: bytecode, typed method parameters, AST
//! text, and the storage layout. A manifest is the JSON bundle of those
//! reduced contracts produced by the build tooling.

use crate::{Error, Result};
use alloy::json_abi::Param;
use alloy::primitives::keccak256;
use athanor_core::digest::{hash_hex, DigestEntry};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A method (or constructor) of a contract under verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Method {
    /// Bare method name, e.g. `test_transfer`.
    pub name: String,
    /// Declared input parameters.
    #[serde(default)]
    pub inputs: Vec<Param>,
    /// Whether the method accepts value.
    #[serde(default)]
    pub payable: bool,
    /// AST text of the method body, when the compiler provided one.
    #[serde(default)]
    pub ast: Option<String>,
}

impl Method {
    /// Canonical signature, e.g. `test_transfer(uint256,address)`.
    pub fn signature(&self) -> String {
        let types = self.inputs.iter().map(|input| input.selector_type()).join(",");
        format!("{}({})", self.name, types)
    }

    /// Four-byte ABI selector of the canonical signature.
    pub fn selector(&self) -> [u8; 4] {
        let hash = keccak256(self.signature().as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    /// True for the special `setUp` method.
    pub fn is_setup(&self) -> bool {
        self.name == "setUp"
    }
}

/// A contract reduced to its verification inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    /// Contract name.
    pub name: String,
    /// Creation bytecode.
    #[serde(with = "hex::serde", default)]
    pub init_bytecode: Vec<u8>,
    /// Deployed runtime bytecode.
    #[serde(with = "hex::serde")]
    pub deployed_bytecode: Vec<u8>,
    /// Storage layout description as emitted by the compiler.
    #[serde(default)]
    pub storage_layout: String,
    /// Callable methods.
    #[serde(default)]
    pub methods: Vec<Method>,
    /// Constructor, when the contract declares one.
    #[serde(default)]
    pub constructor: Option<Method>,
}

impl Contract {
    /// Finds a method by bare name or canonical signature.
    pub fn method(&self, name_or_signature: &str) -> Result<&Method> {
        self.methods
            .iter()
            .find(|method| {
                method.name == name_or_signature || method.signature() == name_or_signature
            })
            .ok_or_else(|| Error::UnknownMethod {
                contract: self.name.clone(),
                method: name_or_signature.to_string(),
            })
    }

    /// The contract's `setUp` method, if declared.
    pub fn setup_method(&self) -> Option<&Method> {
        self.methods.iter().find(|method| method.is_setup())
    }

    /// Content hash over both bytecode sections.
    pub fn content_hash(&self) -> String {
        hash_hex(&[&self.init_bytecode, &self.deployed_bytecode])
    }

    /// Current digests for a method of this contract.
    ///
    /// The method digest covers the signature, the AST (empty when
    /// unavailable), and the storage-layout hash; every method except
    /// `setUp` additionally folds in the contract's own content hash, so
    /// `setUp` reinitializes independently of unrelated contract
    /// changes.
    pub fn digest_entry(&self, method: &Method) -> DigestEntry {
        let signature = method.signature();
        let ast = method.ast.as_deref().unwrap_or_default();
        let storage_hash = hash_hex(&[self.storage_layout.as_bytes()]);
        let base = hash_hex(&[
            signature.as_bytes(),
            ast.as_bytes(),
            storage_hash.as_bytes(),
        ]);
        let contract = self.content_hash();
        let method_digest = if method.is_setup() {
            base
        } else {
            format!("{base}{contract}")
        };
        DigestEntry {
            method: method_digest,
            contract,
        }
    }
}

/// The JSON bundle of contracts a batch run operates over.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// All contracts visible to the run.
    pub contracts: Vec<Contract>,
}

impl Manifest {
    /// Loads a manifest from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::ManifestRead {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Finds a contract by name.
    pub fn contract(&self, name: &str) -> Result<&Contract> {
        self.contracts
            .iter()
            .find(|contract| contract.name == name)
            .ok_or_else(|| Error::UnknownContract(name.to_string()))
    }
}
