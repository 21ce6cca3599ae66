//! Proof records and lifecycle
//!
//! A proof owns exactly one graph plus the bookkeeping that turns the
//! graph into a claim: the init and target nodes, the stuck/failing
//! sets maintained by the exploration driver, refutation associations,
//! and subproof dependencies.

use crate::kcfg::{Kcfg, KcfgData, NodeId};
use crate::result::{Error, Result};
use crate::term::FreshVars;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

/// Proof identity: `{contract}.{method signature}:{version}`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProofId {
    /// Contract name.
    pub contract: String,
    /// Canonical method signature, e.g. `test_transfer(uint256,address)`.
    pub signature: String,
    /// Resolved version.
    pub version: u32,
}

impl ProofId {
    /// Builds an identity from its parts.
    pub fn new(contract: impl Into<String>, signature: impl Into<String>, version: u32) -> Self {
        Self {
            contract: contract.into(),
            signature: signature.into(),
            version,
        }
    }

    /// Qualified test name without the version, `{contract}.{signature}`.
    pub fn test_name(&self) -> String {
        format!("{}.{}", self.contract, self.signature)
    }

    /// Parses `Contract.method(args):version`.
    pub fn parse(text: &str) -> Result<Self> {
        let (name, version) = text
            .rsplit_once(':')
            .ok_or_else(|| Error::InvalidProofId(text.to_string()))?;
        let version: u32 = version
            .parse()
            .map_err(|_| Error::InvalidProofId(text.to_string()))?;
        let (contract, signature) = name
            .split_once('.')
            .ok_or_else(|| Error::InvalidProofId(text.to_string()))?;
        if contract.is_empty() || signature.is_empty() {
            return Err(Error::InvalidProofId(text.to_string()));
        }
        Ok(Self::new(contract, signature, version))
    }

    /// Filesystem-safe stem for the persisted record.
    pub fn file_stem(&self) -> String {
        let raw = format!("{}.{}_{}", self.contract, self.signature, self.version);
        raw.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl fmt::Display for ProofId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}:{}", self.contract, self.signature, self.version)
    }
}

/// Where the proof stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofStatus {
    /// Open: pending nodes or unresolved refutations remain.
    Pending,
    /// Every terminal state is subsumed by the target and nothing is open.
    Passed,
    /// At least one terminal state excludes the target predicate.
    Failed,
}

impl fmt::Display for ProofStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProofStatus::Pending => write!(f, "pending"),
            ProofStatus::Passed => write!(f, "passed"),
            ProofStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One verification attempt: a graph plus its claim bookkeeping.
#[derive(Debug, Clone)]
pub struct Proof {
    /// Identity of this proof.
    pub id: ProofId,
    /// The proof graph.
    pub kcfg: Kcfg,
    /// Root node of the graph.
    pub init: NodeId,
    /// The success configuration every branch must reach or imply.
    pub target: NodeId,
    /// Current status; refreshed by [`Proof::update_status`].
    pub status: ProofStatus,
    /// Leaves the engine could not advance further.
    pub stuck: BTreeSet<NodeId>,
    /// Terminal nodes whose constraints exclude the target predicate.
    pub failing: BTreeSet<NodeId>,
    /// Node id to the refutation subproof deferred from it.
    pub refutations: BTreeMap<NodeId, ProofId>,
    /// Other proofs this one depends on.
    pub subproofs: Vec<ProofId>,
    /// Accumulated exploration wall-clock time.
    pub exec_time: Duration,
    /// Iterations consumed by the most recent exploration run.
    pub iterations: u64,
    /// Fresh-variable source shared by merges and splits on this graph.
    pub fresh: FreshVars,
}

impl Proof {
    /// Creates a pending proof over a seeded graph. The init and target
    /// nodes must already exist and be distinct.
    pub fn new(id: ProofId, kcfg: Kcfg, init: NodeId, target: NodeId) -> Result<Self> {
        kcfg.node(init)?;
        kcfg.node(target)?;
        debug_assert_ne!(init, target, "init and target must be distinct");
        Ok(Self {
            id,
            kcfg,
            init,
            target,
            status: ProofStatus::Pending,
            stuck: BTreeSet::new(),
            failing: BTreeSet::new(),
            refutations: BTreeMap::new(),
            subproofs: Vec::new(),
            exec_time: Duration::ZERO,
            iterations: 0,
            fresh: FreshVars::default(),
        })
    }

    /// The frontier: leaves that are not the target, not stuck, and not
    /// refuted. Covered nodes are never leaves, so subsumption removes
    /// nodes from this set automatically.
    pub fn pending(&self) -> Vec<NodeId> {
        self.kcfg
            .leaves()
            .into_iter()
            .filter(|id| {
                *id != self.target
                    && !self.stuck.contains(id)
                    && !self.refutations.contains_key(id)
            })
            .collect()
    }

    /// True when the node is currently pending.
    pub fn is_pending(&self, id: NodeId) -> bool {
        self.pending().contains(&id)
    }

    /// Records subsumption, rejecting covers on refuted nodes.
    pub fn cover(&mut self, source: NodeId, target: NodeId) -> Result<()> {
        if self.refutations.contains_key(&source) {
            return Err(Error::CoveredWhileRefuted(source));
        }
        self.kcfg.create_cover(source, target)
    }

    /// Defers the node's obligation to an independent subproof. The node
    /// must be pending; it is removed from the frontier but not deleted.
    pub fn refute(&mut self, node: NodeId, subproof: ProofId) -> Result<()> {
        if !self.is_pending(node) {
            if !self.kcfg.contains(node) {
                return Err(Error::NodeMissing(node));
            }
            return Err(Error::AlreadyTerminal(node));
        }
        self.refutations.insert(node, subproof);
        Ok(())
    }

    /// Deletes the refutation association, restoring pendency.
    pub fn unrefute(&mut self, node: NodeId) -> Result<ProofId> {
        self.refutations.remove(&node).ok_or(Error::NotRefuted(node))
    }

    /// Prunes a node and everything reachable only through it, cleaning
    /// the stuck/failing/refutation bookkeeping for removed nodes. The
    /// init and target nodes are protected.
    pub fn remove_node(&mut self, node: NodeId) -> Result<Vec<NodeId>> {
        if node == self.init {
            return Err(Error::ProtectedNode(node, "init"));
        }
        if node == self.target {
            return Err(Error::ProtectedNode(node, "target"));
        }
        let keep = BTreeSet::from([self.init, self.target]);
        let removed = self.kcfg.prune(node, &keep)?;
        for id in &removed {
            self.stuck.remove(id);
            self.failing.remove(id);
            if let Some(subproof) = self.refutations.remove(id) {
                self.subproofs.retain(|candidate| *candidate != subproof);
            }
        }
        self.update_status();
        Ok(removed)
    }

    /// Recomputes the status from the stuck/failing/refutation sets.
    pub fn update_status(&mut self) {
        self.status = if !self.failing.is_empty() {
            ProofStatus::Failed
        } else if self.pending().is_empty() && self.refutations.is_empty() {
            ProofStatus::Passed
        } else {
            ProofStatus::Pending
        };
    }

    /// One-line shape summary for logging.
    pub fn summary(&self) -> String {
        format!(
            "{}: {} ({} nodes, {} edges, {} pending, {} failing)",
            self.id,
            self.status,
            self.kcfg.node_count(),
            self.kcfg.edge_count(),
            self.pending().len(),
            self.failing.len()
        )
    }

    /// Flattens the proof into its serializable record.
    pub fn to_data(&self) -> ProofData {
        ProofData {
            id: self.id.clone(),
            kcfg: self.kcfg.to_data(),
            init: self.init,
            target: self.target,
            status: self.status,
            stuck: self.stuck.clone(),
            failing: self.failing.clone(),
            refutations: self.refutations.clone(),
            subproofs: self.subproofs.clone(),
            exec_time_secs: self.exec_time.as_secs_f64(),
            iterations: self.iterations,
            fresh: self.fresh.clone(),
        }
    }

    /// Rebuilds a proof from its persisted record.
    pub fn from_data(data: ProofData) -> Result<Self> {
        let kcfg = Kcfg::from_data(data.kcfg)?;
        kcfg.node(data.init)?;
        kcfg.node(data.target)?;
        Ok(Self {
            id: data.id,
            kcfg,
            init: data.init,
            target: data.target,
            status: data.status,
            stuck: data.stuck,
            failing: data.failing,
            refutations: data.refutations,
            subproofs: data.subproofs,
            exec_time: Duration::from_secs_f64(data.exec_time_secs),
            iterations: data.iterations,
            fresh: data.fresh,
        })
    }
}

/// Persisted proof record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofData {
    /// Identity.
    pub id: ProofId,
    /// Flattened graph.
    pub kcfg: KcfgData,
    /// Root node.
    pub init: NodeId,
    /// Target node.
    pub target: NodeId,
    /// Status at save time.
    pub status: ProofStatus,
    /// Stuck set.
    pub stuck: BTreeSet<NodeId>,
    /// Failing set.
    pub failing: BTreeSet<NodeId>,
    /// Refutation associations.
    pub refutations: BTreeMap<NodeId, ProofId>,
    /// Subproof dependencies.
    pub subproofs: Vec<ProofId>,
    /// Accumulated exploration time in seconds.
    pub exec_time_secs: f64,
    /// Iterations consumed by the most recent run.
    pub iterations: u64,
    /// Fresh-variable counter state.
    pub fresh: FreshVars,
}
