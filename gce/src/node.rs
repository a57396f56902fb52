//! GC Node — mutable scratch over one occurrence of a GC within a
//! composition, and the arena (`NodeGraph`) that owns all of them.
//!
//! Grounded on `original_source/gc_node.py`'s `GCNode` class and its
//! two iterators. The arena/handle design follows `spec.md` §9's own
//! recommendation and `gce_util::IndexVec`; there is no `NULL_GC_NODE`
//! sentinel object here, only `Option<NodeId>`.

use gce_util::{define_idx, IndexVec};

use crate::connection::CodeConnection;
use crate::function_info::FunctionInfo;
use crate::record::GcRecord;
use std::sync::Arc;

define_idx!(NodeId);

/// A node's position relative to its parent: the function root itself,
/// or one of the two children of a composition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    I,
    A,
    B,
}

/// One occurrence of a GC within a composition being assessed.
///
/// See `spec.md` §3 for the field-by-field contract.
pub struct GcNode {
    pub gc: Arc<GcRecord>,
    pub parent: Option<NodeId>,
    pub role: Role,
    pub gca_node: Option<NodeId>,
    pub gcb_node: Option<NodeId>,

    pub is_codon: bool,
    pub unknown: bool,
    pub exists: bool,
    pub assess: bool,
    pub write: bool,
    pub terminal: bool,

    /// Guards the conditional control connection so it is pushed at
    /// most once per node (`spec.md` §4.4 point 3).
    pub f_connection: bool,

    pub function_info: FunctionInfo,
    pub num_lines: u32,

    /// Populated only for nodes marked `write` (`spec.md` §3).
    pub terminal_connections: Vec<CodeConnection>,

    /// Per-node local-variable counter, used by the emitter when
    /// minting `t{n}` names (`spec.md` §4.5).
    pub local_counter: u32,
}

impl GcNode {
    /// Construct a node, deriving `is_codon`/`unknown`/`terminal`/
    /// `num_lines` from the record and the caller-supplied
    /// `FunctionInfo` snapshot (`NULL` if this signature has never
    /// been emitted).
    ///
    /// See `spec.md` §4.2 points 1 and 3.
    pub fn new(
        gc: Arc<GcRecord>,
        parent: Option<NodeId>,
        role: Role,
        function_info: FunctionInfo,
    ) -> Self {
        let exists = !function_info.is_null();
        let mut node = GcNode {
            gc: gc.clone(),
            parent,
            role,
            gca_node: None,
            gcb_node: None,
            is_codon: false,
            unknown: false,
            exists,
            assess: true,
            write: false,
            terminal: false,
            f_connection: gc.is_conditional,
            num_lines: function_info.line_count,
            function_info,
            terminal_connections: Vec::new(),
            local_counter: 0,
        };

        if gc.is_codon {
            debug_assert!(gc.gca.is_null() && gc.gcb.is_null(), "codon must have NULL children");
            node.is_codon = true;
            node.assess = false;
            node.terminal = true;
            node.num_lines = 1;
        } else if exists && (!matches!(gc.gca, crate::record::SubGc::Null) && is_unresolved(&gc.gca)
            || !matches!(gc.gcb, crate::record::SubGc::Null) && is_unresolved(&gc.gcb))
        {
            // spec.md §4.2 point 3: exists but substructure unresolved.
            node.unknown = true;
            node.terminal = true;
            node.assess = false;
            node.num_lines = 1;
        }

        node
    }
}

fn is_unresolved(sub: &crate::record::SubGc) -> bool {
    matches!(sub, crate::record::SubGc::Signature(_))
}

/// The arena owning every `GcNode` built while assessing one root GC.
/// Discarded after emission (`spec.md` §3 Lifecycle).
pub struct NodeGraph {
    pub nodes: IndexVec<NodeId, GcNode>,
    pub root: NodeId,
}

impl NodeGraph {
    pub(crate) fn with_root(root_node: GcNode) -> Self {
        let mut nodes = IndexVec::new();
        let root = nodes.push(root_node);
        NodeGraph { nodes, root }
    }

    pub fn push(&mut self, node: GcNode) -> NodeId {
        self.nodes.push(node)
    }

    /// A diagnostic identifier for a node, unique within this graph.
    pub fn uid(&self, id: NodeId) -> String {
        format!("n{:x}", id.0)
    }
}

impl std::ops::Index<NodeId> for NodeGraph {
    type Output = GcNode;
    fn index(&self, id: NodeId) -> &GcNode {
        &self.nodes[id]
    }
}

impl std::ops::IndexMut<NodeId> for NodeGraph {
    fn index_mut(&mut self, id: NodeId) -> &mut GcNode {
        &mut self.nodes[id]
    }
}

/// Post-order (GCA-then-GCB) iterator over an entire subtree: visits
/// every node, codons and terminal leaves included.
///
/// Explicit-stack, cycle-safe via a visited set (`spec.md` §4.6,
/// `spec.md` §9 "Iterators and generators").
pub struct GcNodeIter<'g> {
    graph: &'g NodeGraph,
    stack: Vec<(NodeId, bool)>,
    visited: gce_util::FxHashSet<NodeId>,
}

impl<'g> GcNodeIter<'g> {
    pub fn new(graph: &'g NodeGraph, root: NodeId) -> Self {
        GcNodeIter {
            graph,
            stack: vec![(root, false)],
            visited: Default::default(),
        }
    }
}

impl<'g> Iterator for GcNodeIter<'g> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some((id, expanded)) = self.stack.pop() {
            if expanded {
                return Some(id);
            }
            if !self.visited.insert(id) {
                continue;
            }
            self.stack.push((id, true));
            let node = &self.graph[id];
            if let Some(b) = node.gcb_node {
                self.stack.push((b, false));
            }
            if let Some(a) = node.gca_node {
                self.stack.push((a, false));
            }
        }
        None
    }
}

/// Like [`GcNodeIter`], but never descends into a node marked `write`
/// (except the subtree root itself), so an emitted function sees
/// nested calls as leaves (`spec.md` §4.6).
pub struct GcNodeCodeIter<'g> {
    graph: &'g NodeGraph,
    root: NodeId,
    stack: Vec<(NodeId, bool)>,
    visited: gce_util::FxHashSet<NodeId>,
}

impl<'g> GcNodeCodeIter<'g> {
    pub fn new(graph: &'g NodeGraph, root: NodeId) -> Self {
        GcNodeCodeIter {
            graph,
            root,
            stack: vec![(root, false)],
            visited: Default::default(),
        }
    }

    fn stops_here(&self, id: NodeId) -> bool {
        id != self.root && {
            let n = &self.graph[id];
            n.write || n.terminal
        }
    }
}

impl<'g> Iterator for GcNodeCodeIter<'g> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some((id, expanded)) = self.stack.pop() {
            if expanded {
                return Some(id);
            }
            if !self.visited.insert(id) {
                continue;
            }
            self.stack.push((id, true));
            if self.stops_here(id) {
                continue;
            }
            let node = &self.graph[id];
            if let Some(b) = node.gcb_node {
                self.stack.push((b, false));
            }
            if let Some(a) = node.gca_node {
                self.stack.push((a, false));
            }
        }
        None
    }
}
