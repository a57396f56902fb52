//! Line-Budget Scheduler — assigns `num_lines` to every node and picks
//! the subset that becomes its own emitted function (`spec.md` §4.3).

use crate::error::{ExecutorError, Result};
use crate::node::{NodeGraph, NodeId};

/// Runs the scheduler over `graph`, rooted at `graph.root`, against
/// `limit`. Non-recursive: an explicit loop walks down to the next
/// unassessed child and back up, mirroring a post-order traversal
/// without call-stack recursion (`spec.md` §9).
pub fn line_count(graph: &mut NodeGraph, limit: u32) -> Result<()> {
    let root = graph.root;
    graph[root].write = !graph[root].exists;

    let mut node = root;
    while graph[node].assess {
        if let Some(gca) = graph[node].gca_node {
            if graph[gca].assess {
                node = gca;
                continue;
            }
        }
        if let Some(gcb) = graph[node].gcb_node {
            if graph[gcb].assess {
                node = gcb;
                continue;
            }
        }

        assess_node(graph, node, limit)?;
        graph[node].assess = false;

        log::debug!(
            "scheduler: node {} num_lines={} write={}",
            graph.uid(node),
            graph[node].num_lines,
            graph[node].write
        );

        match graph[node].parent {
            Some(parent) => node = parent,
            None => break,
        }
    }

    Ok(())
}

fn assess_node(graph: &mut NodeGraph, node: NodeId, limit: u32) -> Result<()> {
    let gca = graph[node].gca_node;
    let gcb = graph[node].gcb_node;

    let a = gca.map(|id| graph[id].num_lines).unwrap_or(0);

    let Some(gcb_id) = gcb else {
        if a > limit {
            return Err(ExecutorError::InvalidComposition {
                uid: graph.uid(node),
                detail: format!("single-child node line count {a} exceeds limit {limit}"),
            });
        }
        graph[node].num_lines = a;
        return Ok(());
    };
    let b = graph[gcb_id].num_lines;
    let gca_id = gca.expect("a composed node with a b-child also has an a-child");

    if a > limit || b > limit {
        return Err(ExecutorError::InvalidComposition {
            uid: graph.uid(node),
            detail: format!("child line count exceeds limit {limit} (a={a}, b={b})"),
        });
    }

    if a == b && a == limit {
        mark_write_terminal(graph, gca_id);
        mark_write_terminal(graph, gcb_id);
        graph[node].num_lines = 2;
    } else if a + b > limit {
        let (bigger, other_lines) = if a < b { (gcb_id, a) } else { (gca_id, b) };
        mark_write_terminal(graph, bigger);
        graph[node].num_lines = 1 + other_lines;
    } else {
        graph[node].num_lines = a + b;
    }

    Ok(())
}

fn mark_write_terminal(graph: &mut NodeGraph, id: NodeId) {
    if !graph[id].exists {
        graph[id].write = true;
    }
    graph[id].terminal = true;
}
