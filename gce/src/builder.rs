//! Graph Builder — constructs the bidirectional node graph from a root
//! GC, pulling sub-GCs from the store on demand (`spec.md` §4.2).

use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::{ExecutorError, Result};
use crate::function_info::FunctionInfo;
use crate::node::{GcNode, NodeGraph, NodeId, Role};
use crate::record::{GcRecord, SubGc};
use crate::store::GcStore;

fn resolve_sub(store: &dyn GcStore, sub: &SubGc) -> Result<Option<Arc<GcRecord>>> {
    match sub {
        SubGc::Null => Ok(None),
        SubGc::Record(r) => Ok(Some(r.clone())),
        SubGc::Signature(sig) => store
            .get(*sig)
            .map(Some)
            .ok_or(ExecutorError::MissingSignature(*sig)),
    }
}

fn lookup_info(function_map: &indexmap::IndexMap<crate::record::Signature, FunctionInfo>, sig: crate::record::Signature) -> FunctionInfo {
    function_map.get(&sig).cloned().unwrap_or_else(|| FunctionInfo::null(sig))
}

/// Builds the node graph rooted at `gc`, per `spec.md` §4.2.
pub fn build(
    store: &dyn GcStore,
    function_map: &indexmap::IndexMap<crate::record::Signature, FunctionInfo>,
    half_limit: u32,
    limit: u32,
    gc: Arc<GcRecord>,
) -> Result<NodeGraph> {
    let root_info = lookup_info(function_map, gc.signature);
    let root_node = GcNode::new(gc, None, Role::I, root_info);
    let mut graph = NodeGraph::with_root(root_node);

    let mut queue: VecDeque<NodeId> = VecDeque::new();
    queue.push_back(graph.root);

    while let Some(node_id) = queue.pop_front() {
        let (is_codon, unknown) = {
            let n = &graph[node_id];
            (n.is_codon, n.unknown)
        };
        if is_codon || unknown {
            continue;
        }

        for role in [Role::A, Role::B] {
            let sub = match role {
                Role::A => graph[node_id].gc.gca.clone(),
                Role::B => graph[node_id].gc.gcb.clone(),
                Role::I => unreachable!(),
            };
            let Some(child_gc) = resolve_sub(store, &sub)? else {
                continue;
            };

            let info = lookup_info(function_map, child_gc.signature);
            log::debug!(
                "builder: node {} resolving {:?} child {} (exists={})",
                graph.uid(node_id),
                role,
                child_gc.signature,
                !info.is_null()
            );

            if !info.is_null() {
                if info.line_count > limit {
                    return Err(ExecutorError::InvalidComposition {
                        uid: graph.uid(node_id),
                        detail: format!(
                            "existing function for {} has line count {} exceeding limit {}",
                            child_gc.signature, info.line_count, limit
                        ),
                    });
                }
                if info.line_count < half_limit {
                    let child_id = graph.push(GcNode::new(child_gc, Some(node_id), role, info));
                    set_child(&mut graph, node_id, role, child_id);
                    queue.push_back(child_id);
                } else {
                    let mut child = GcNode::new(child_gc, Some(node_id), role, info);
                    child.assess = false;
                    child.exists = true;
                    child.terminal = true;
                    // Calling an already-large existing function costs
                    // the parent exactly one line, regardless of that
                    // function's own (unchanged) line count.
                    child.num_lines = 1;
                    let child_id = graph.push(child);
                    set_child(&mut graph, node_id, role, child_id);
                    // Do not descend.
                }
            } else {
                let child_id = graph.push(GcNode::new(child_gc, Some(node_id), role, info));
                set_child(&mut graph, node_id, role, child_id);
                queue.push_back(child_id);
            }
        }
    }

    Ok(graph)
}

fn set_child(graph: &mut NodeGraph, parent: NodeId, role: Role, child: NodeId) {
    match role {
        Role::A => graph[parent].gca_node = Some(child),
        Role::B => graph[parent].gcb_node = Some(child),
        Role::I => unreachable!(),
    }
}
