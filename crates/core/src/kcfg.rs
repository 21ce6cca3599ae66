//! Proof graph store
//!
//! The KCFG is a directed graph of symbolic configurations connected by
//! verified multi-step rewrites (edges) and subsumption links (covers).
//! Node payloads carry a stable integer id assigned from a monotone
//! counter, so public identity never depends on the backing graph's index
//! allocation and survives serialization round-trips.

use crate::result::{Error, Result};
use crate::term::CTerm;
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt;

/// Stable node identifier, unique within one graph for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node: stable id plus symbolic configuration and path constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KNode {
    /// Stable identifier.
    pub id: NodeId,
    /// The node's configuration.
    pub cterm: CTerm,
}

/// Relation between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KEdge {
    /// A verified multi-step rewrite of the given depth.
    Step {
        /// Number of rewrite steps the engine took along this edge.
        depth: usize,
    },
    /// Subsumption: the source's state is implied by the target's.
    Cover,
    /// A manual case split: the target refines the source by one added
    /// branch condition. No rewrite is claimed.
    Split,
}

/// The proof graph.
#[derive(Debug, Clone, Default)]
pub struct Kcfg {
    graph: StableDiGraph<KNode, KEdge>,
    index: HashMap<NodeId, NodeIndex>,
    next_id: u64,
}

impl Kcfg {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates and stores a new node; no implicit edges.
    pub fn create_node(&mut self, cterm: CTerm) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        let idx = self.graph.add_node(KNode { id, cterm });
        self.index.insert(id, idx);
        id
    }

    /// Number of ids handed out so far; the floor for fresh-variable
    /// counters resumed from a persisted graph.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Returns the node for `id`.
    pub fn node(&self, id: NodeId) -> Result<&KNode> {
        self.idx(id).map(|idx| &self.graph[idx])
    }

    /// Returns true when the node exists.
    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// Replaces a node's configuration in place, preserving its id and
    /// every edge and cover referencing it.
    pub fn let_node(&mut self, id: NodeId, cterm: CTerm) -> Result<()> {
        let idx = self.idx(id)?;
        self.graph[idx].cterm = cterm;
        Ok(())
    }

    /// Records a verified multi-step transition. Multiple outgoing step
    /// edges are allowed (engine branching); a covered source is not.
    pub fn create_edge(&mut self, source: NodeId, target: NodeId, depth: usize) -> Result<()> {
        if depth < 1 {
            return Err(Error::InvalidDepth(depth));
        }
        let src = self.idx(source)?;
        let dst = self.idx(target)?;
        if self.is_covered(source) {
            return Err(Error::AlreadyTerminal(source));
        }
        self.graph.add_edge(src, dst, KEdge::Step { depth });
        Ok(())
    }

    /// Records subsumption. A node reaches exactly one terminal
    /// disposition: the call fails if the source already has any outgoing
    /// edge or cover.
    pub fn create_cover(&mut self, source: NodeId, target: NodeId) -> Result<()> {
        let src = self.idx(source)?;
        let dst = self.idx(target)?;
        if self
            .graph
            .edges_directed(src, Direction::Outgoing)
            .next()
            .is_some()
        {
            return Err(Error::AlreadyTerminal(source));
        }
        self.graph.add_edge(src, dst, KEdge::Cover);
        Ok(())
    }

    /// Records a case split from `source` into its refining branches.
    /// Like a cover, a split is a terminal disposition for its source:
    /// the call fails if the source already has any outgoing relation.
    pub fn create_split(&mut self, source: NodeId, branches: &[NodeId]) -> Result<()> {
        let src = self.idx(source)?;
        let targets: Vec<NodeIndex> = branches
            .iter()
            .map(|branch| self.idx(*branch))
            .collect::<Result<_>>()?;
        if self
            .graph
            .edges_directed(src, Direction::Outgoing)
            .next()
            .is_some()
        {
            return Err(Error::AlreadyTerminal(source));
        }
        for dst in targets {
            self.graph.add_edge(src, dst, KEdge::Split);
        }
        Ok(())
    }

    /// Depth of the step edge between two nodes, if one exists.
    pub fn edge_depth(&self, source: NodeId, target: NodeId) -> Option<usize> {
        let (src, dst) = (self.idx(source).ok()?, self.idx(target).ok()?);
        self.graph.edges_connecting(src, dst).find_map(|edge| {
            if let KEdge::Step { depth } = edge.weight() {
                Some(*depth)
            } else {
                None
            }
        })
    }

    /// Removes the step edge between two nodes.
    pub fn remove_edge(&mut self, source: NodeId, target: NodeId) -> Result<()> {
        let (src, dst) = (self.idx(source)?, self.idx(target)?);
        let edge = self
            .graph
            .edges_connecting(src, dst)
            .find(|edge| matches!(edge.weight(), KEdge::Step { .. }))
            .map(|edge| edge.id())
            .ok_or(Error::EdgeMissing { src: source, target })?;
        self.graph.remove_edge(edge);
        Ok(())
    }

    /// Outgoing relations of a node as `(target, edge)` pairs.
    pub fn out_edges(&self, id: NodeId) -> Vec<(NodeId, KEdge)> {
        let Ok(idx) = self.idx(id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|edge| (self.graph[edge.target()].id, edge.weight().clone()))
            .collect()
    }

    /// Incoming relations of a node as `(source, edge)` pairs.
    pub fn in_edges(&self, id: NodeId) -> Vec<(NodeId, KEdge)> {
        let Ok(idx) = self.idx(id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .map(|edge| (self.graph[edge.source()].id, edge.weight().clone()))
            .collect()
    }

    /// True when the node has an outgoing cover.
    pub fn is_covered(&self, id: NodeId) -> bool {
        self.idx(id).is_ok_and(|idx| {
            self.graph
                .edges_directed(idx, Direction::Outgoing)
                .any(|edge| matches!(edge.weight(), KEdge::Cover))
        })
    }

    /// True when the node has no outgoing edge or cover.
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.idx(id).is_ok_and(|idx| {
            self.graph
                .edges_directed(idx, Direction::Outgoing)
                .next()
                .is_none()
        })
    }

    /// All leaf node ids in ascending order.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = self
            .graph
            .node_indices()
            .filter(|idx| {
                self.graph
                    .edges_directed(*idx, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .map(|idx| self.graph[idx].id)
            .collect();
        out.sort();
        out
    }

    /// Sources of covers into `target` (the "final reachable" states
    /// grafting copies forward).
    pub fn covers_into(&self, target: NodeId) -> Vec<NodeId> {
        let Ok(idx) = self.idx(target) else {
            return Vec::new();
        };
        let mut out: Vec<NodeId> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .filter(|edge| matches!(edge.weight(), KEdge::Cover))
            .map(|edge| self.graph[edge.source()].id)
            .collect();
        out.sort();
        out
    }

    /// All node ids in ascending order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = self.index.keys().copied().collect();
        out.sort();
        out
    }

    /// Node count.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Edge count, covers included.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Removes `id` and every node reachable exclusively through it,
    /// returning the removed ids in ascending order. A descendant that is
    /// also reachable from outside the removed region survives, along
    /// with its subtree. Nodes in `keep` are never removed (callers pass
    /// the proof's init and target).
    pub fn prune(&mut self, id: NodeId, keep: &BTreeSet<NodeId>) -> Result<Vec<NodeId>> {
        let root = self.idx(id)?;

        // Everything below the pruned node is a removal candidate.
        let mut candidates = BTreeSet::new();
        let mut queue = VecDeque::from([root]);
        while let Some(idx) = queue.pop_front() {
            if !candidates.insert(idx) {
                continue;
            }
            for edge in self.graph.edges_directed(idx, Direction::Outgoing) {
                queue.push_back(edge.target());
            }
        }

        // Rescue candidates with a live predecessor outside the removed
        // region, then everything below them, to a fixpoint.
        let mut rescued: BTreeSet<NodeIndex> = candidates
            .iter()
            .copied()
            .filter(|idx| *idx != root && keep.contains(&self.graph[*idx].id))
            .collect();
        loop {
            let mut changed = false;
            for &idx in &candidates {
                if idx == root || rescued.contains(&idx) {
                    continue;
                }
                let live = self.graph.edges_directed(idx, Direction::Incoming).any(
                    |edge| {
                        let pred = edge.source();
                        !candidates.contains(&pred) || rescued.contains(&pred)
                    },
                );
                if live {
                    rescued.insert(idx);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        let mut removed: Vec<NodeId> = Vec::new();
        for idx in candidates {
            if rescued.contains(&idx) {
                continue;
            }
            let node_id = self.graph[idx].id;
            self.graph.remove_node(idx);
            self.index.remove(&node_id);
            removed.push(node_id);
        }
        removed.sort();
        Ok(removed)
    }

    /// Collapses interior bookkeeping nodes: a non-protected node with
    /// exactly one incoming and one outgoing step edge (and no covers
    /// touching it) is replaced by a single direct edge whose depth is
    /// the sum of the two. Returns the removed ids.
    pub fn minimize(&mut self, protected: &BTreeSet<NodeId>) -> Vec<NodeId> {
        let mut removed = Vec::new();
        loop {
            let Some((idx, pred, succ, depth)) = self.collapsible(protected) else {
                break;
            };
            let node_id = self.graph[idx].id;
            self.graph.remove_node(idx);
            self.index.remove(&node_id);
            self.graph.add_edge(pred, succ, KEdge::Step { depth });
            removed.push(node_id);
        }
        removed.sort();
        removed
    }

    fn collapsible(
        &self,
        protected: &BTreeSet<NodeId>,
    ) -> Option<(NodeIndex, NodeIndex, NodeIndex, usize)> {
        for idx in self.graph.node_indices() {
            if protected.contains(&self.graph[idx].id) {
                continue;
            }
            let incoming: Vec<_> = self
                .graph
                .edges_directed(idx, Direction::Incoming)
                .collect();
            let outgoing: Vec<_> = self
                .graph
                .edges_directed(idx, Direction::Outgoing)
                .collect();
            if incoming.len() != 1 || outgoing.len() != 1 {
                continue;
            }
            let (KEdge::Step { depth: depth_in }, KEdge::Step { depth: depth_out }) =
                (incoming[0].weight(), outgoing[0].weight())
            else {
                continue;
            };
            let (pred, succ) = (incoming[0].source(), outgoing[0].target());
            if pred == idx || succ == idx {
                continue;
            }
            return Some((idx, pred, succ, depth_in + depth_out));
        }
        None
    }

    /// Flattens the graph into serializable data.
    pub fn to_data(&self) -> KcfgData {
        let mut nodes: Vec<NodeData> = self
            .graph
            .node_indices()
            .map(|idx| {
                let node = &self.graph[idx];
                NodeData {
                    id: node.id,
                    cterm: node.cterm.clone(),
                }
            })
            .collect();
        nodes.sort_by_key(|node| node.id);

        let mut edges = Vec::new();
        let mut covers = Vec::new();
        let mut splits = Vec::new();
        for edge in self.graph.edge_references() {
            let source = self.graph[edge.source()].id;
            let target = self.graph[edge.target()].id;
            match edge.weight() {
                KEdge::Step { depth } => edges.push(EdgeData {
                    source,
                    target,
                    depth: *depth,
                }),
                KEdge::Cover => covers.push(CoverData { source, target }),
                KEdge::Split => splits.push(CoverData { source, target }),
            }
        }
        edges.sort_by_key(|edge| (edge.source, edge.target));
        covers.sort_by_key(|cover| (cover.source, cover.target));
        splits.sort_by_key(|split| (split.source, split.target));

        KcfgData {
            next_id: self.next_id,
            nodes,
            edges,
            covers,
            splits,
        }
    }

    /// Rebuilds a graph from persisted data, validating every reference.
    pub fn from_data(data: KcfgData) -> Result<Self> {
        let mut kcfg = Kcfg::new();
        for node in data.nodes {
            let idx = kcfg.graph.add_node(KNode {
                id: node.id,
                cterm: node.cterm,
            });
            kcfg.index.insert(node.id, idx);
        }
        kcfg.next_id = data.next_id;
        for edge in data.edges {
            let (src, dst) = (kcfg.idx(edge.source)?, kcfg.idx(edge.target)?);
            kcfg.graph.add_edge(src, dst, KEdge::Step { depth: edge.depth });
        }
        for cover in data.covers {
            let (src, dst) = (kcfg.idx(cover.source)?, kcfg.idx(cover.target)?);
            kcfg.graph.add_edge(src, dst, KEdge::Cover);
        }
        for split in data.splits {
            let (src, dst) = (kcfg.idx(split.source)?, kcfg.idx(split.target)?);
            kcfg.graph.add_edge(src, dst, KEdge::Split);
        }
        Ok(kcfg)
    }

    fn idx(&self, id: NodeId) -> Result<NodeIndex> {
        self.index.get(&id).copied().ok_or(Error::NodeMissing(id))
    }
}

/// Serializable node record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    /// Stable identifier.
    pub id: NodeId,
    /// The node's configuration.
    pub cterm: CTerm,
}

/// Serializable step-edge record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeData {
    /// Source node.
    pub source: NodeId,
    /// Target node.
    pub target: NodeId,
    /// Step depth.
    pub depth: usize,
}

/// Serializable cover record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverData {
    /// Covered node.
    pub source: NodeId,
    /// Covering node.
    pub target: NodeId,
}

/// Flat graph representation stored inside a proof record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KcfgData {
    /// Id counter floor for the rebuilt graph.
    pub next_id: u64,
    /// All nodes in id order.
    pub nodes: Vec<NodeData>,
    /// All step edges.
    pub edges: Vec<EdgeData>,
    /// All covers.
    pub covers: Vec<CoverData>,
    /// All split relations.
    #[serde(default)]
    pub splits: Vec<CoverData>,
}
