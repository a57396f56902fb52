//! Code Endpoint / Code Connection, and the Connection Resolver.
//!
//! Grounded on `original_source/executor.py`'s `CodeEndPoint`,
//! `CodeConnection`, `code_connection_from_iface` and `code_graph`.
//! See `SPEC_FULL.md` §4.4 for the one generalisation made here (a
//! re-dispatch loop instead of an inlined single-step shortcut when
//! threading an `I` row through an ancestor chain).

use gce_util::FxHashSet;

use crate::cgraph::Row;
use crate::error::{ExecutorError, Result};
use crate::node::{GcNode, NodeGraph, NodeId, Role};
use crate::record::SubGc;

/// A single slot `(node, row, idx)` plus whether it is terminal
/// (`spec.md` §3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CodeEndPoint {
    pub node: NodeId,
    pub row: Row,
    pub idx: u16,
    pub terminal: bool,
}

/// A `(src, dst, var_name)` edge discovered while resolving one
/// emitted function's connections. `var_name` is filled in later by
/// the emitter's naming pass.
#[derive(Clone, Debug)]
pub struct CodeConnection {
    pub src: CodeEndPoint,
    pub dst: CodeEndPoint,
    pub var_name: Option<String>,
}

/// Builds the seed connections for one destination interface of
/// `node`: `row == A` or `row == B` gives the inputs of that child
/// (destination is the child's own `I` row); any other row (used for
/// the function root's own outputs, or for re-seeding a
/// freshly-terminalised node's own inputs) gives `node`'s own
/// destination-connection array for that row.
///
/// Mirrors `code_connection_from_iface` in `original_source/executor.py`.
fn connections_from_iface(graph: &NodeGraph, node: NodeId, row: Row) -> Vec<CodeConnection> {
    let (dst_node, dst_row, refs): (NodeId, Row, &[crate::cgraph::EndPointRef]) = match row {
        Row::A => (
            graph[node].gca_node.expect("role A interface requested with no gca_node"),
            Row::I,
            &graph[node].gc.cgraph.ad,
        ),
        Row::B => (
            graph[node].gcb_node.expect("role B interface requested with no gcb_node"),
            Row::I,
            &graph[node].gc.cgraph.bd,
        ),
        _ => (node, Row::O, &graph[node].gc.cgraph.od),
    };

    refs.iter()
        .enumerate()
        .map(|(i, r)| CodeConnection {
            src: CodeEndPoint {
                node,
                row: r.row,
                idx: r.idx,
                terminal: false,
            },
            dst: CodeEndPoint {
                node: dst_node,
                row: dst_row,
                idx: i as u16,
                terminal: true,
            },
            var_name: None,
        })
        .collect()
}

fn uid(graph: &NodeGraph, node: NodeId) -> String {
    graph.uid(node)
}

/// Seeds identity connections for a function whose entire body is one
/// codon: each input and output names itself, with no threading.
fn seed_codon_root(graph: &mut NodeGraph, function: NodeId) {
    let (num_inputs, num_outputs) = {
        let gc = &graph[function].gc;
        (gc.num_inputs, gc.num_outputs)
    };
    let conns = &mut graph[function].terminal_connections;
    for idx in 0..num_inputs {
        let point = CodeEndPoint {
            node: function,
            row: Row::I,
            idx,
            terminal: true,
        };
        conns.push(CodeConnection {
            src: point,
            dst: point,
            var_name: None,
        });
    }
    for idx in 0..num_outputs {
        let point = CodeEndPoint {
            node: function,
            row: Row::O,
            idx,
            terminal: true,
        };
        conns.push(CodeConnection {
            src: point,
            dst: point,
            var_name: None,
        });
    }
}

/// Resolves `function`'s `terminal_connections`: every destination
/// endpoint inside the emitted function threaded back to its ultimate
/// (terminal) source (`spec.md` §4.4).
pub fn resolve(graph: &mut NodeGraph, function: NodeId) -> Result<()> {
    if graph[function].is_codon {
        // Nothing to thread: the root itself is the terminal producer
        // and consumer of its own interface (`spec.md` §8 "zero-I/O
        // codon" boundary case, generalised to any-arity codon root).
        seed_codon_root(graph, function);
        return Ok(());
    }

    let mut stack: Vec<CodeConnection> = connections_from_iface(graph, function, Row::O);
    let mut visited: FxHashSet<NodeId> = FxHashSet::default();
    visited.insert(function);

    while let Some(mut conn) = stack.pop() {
        if conn.src.terminal {
            return Err(ExecutorError::InvalidComposition {
                uid: uid(graph, conn.src.node),
                detail: "top-of-stack source already terminal before processing".into(),
            });
        }

        let stepping_from = conn.src.node;
        thread_one_step(graph, function, &mut conn.src)?;

        if conn.src.terminal {
            let src_node = conn.src.node;
            graph[function].terminal_connections.push(conn);

            if visited.insert(src_node) {
                // Re-seed this newly-discovered terminal's own inputs,
                // threaded from the position it occupies in its
                // *parent*'s connection graph (`A`/`B` row) — or, for
                // `function` itself (already visited at initialisation,
                // so unreachable here in practice regardless of its
                // `Role` in the wider graph), from its own `O` row by
                // the same wildcard the initial seed uses.
                let pushed = match graph[src_node].role {
                    Role::A | Role::B => {
                        let parent = graph[src_node].parent.expect("non-root node has a parent");
                        connections_from_iface(graph, parent, graph[src_node].role_as_row())
                    }
                    Role::I => connections_from_iface(graph, src_node, Row::O),
                };
                stack.extend(pushed);
            }
        } else {
            stack.push(conn);
        }

        // Pushed once per node regardless of which branch was taken
        // above; `f_connection` itself guards against re-firing for a
        // node touched across more than one threading step.
        maybe_push_control_connection(graph, &mut stack, stepping_from);
    }

    Ok(())
}

impl GcNode {
    /// The row under which this node's own inputs are discoverable
    /// from *its* parent's point of view: `A`/`B` for a child, `O` for
    /// the function root itself (the default branch of
    /// `code_connection_from_iface`).
    fn role_as_row(&self) -> Row {
        match self.role {
            Role::A => Row::A,
            Role::B => Row::B,
            Role::I => Row::O,
        }
    }
}

/// Advances `src` by exactly one threading step, per `spec.md` §4.4.
/// Leaves `src.terminal` set if the new position is terminal;
/// otherwise the caller loops again (the connection stays on the
/// stack) until it is. `function` is the root of the *currently
/// emitted* function being resolved — not necessarily the overall
/// `NodeGraph`'s root, since `resolve` is called once per write node
/// (`context.rs`'s `write_executable`) and a write node may be an
/// interior split-off node (`scheduler::mark_write_terminal`).
/// Boundary checks below must stop at `function`, mirroring
/// `original_source/.../execution_context.py`'s `code_graph(self,
/// function)`, which checks `node is not function` rather than any
/// notion of a graph-wide root.
fn thread_one_step(graph: &mut NodeGraph, function: NodeId, src: &mut CodeEndPoint) -> Result<()> {
    match src.row {
        Row::A | Row::B => {
            let child = if src.row == Row::A {
                graph[src.node].gca_node
            } else {
                graph[src.node].gcb_node
            }
            .ok_or_else(|| ExecutorError::InvalidComposition {
                uid: uid(graph, src.node),
                detail: format!("no child on row {:?}", src.row),
            })?;

            let terminal = graph[child].terminal;
            src.node = child;
            src.row = Row::O;
            src.terminal = terminal;

            if !terminal {
                if graph[child].is_codon {
                    // A codon is always terminal (`spec.md` §3); reaching
                    // here means that invariant was violated upstream.
                    return Err(ExecutorError::CodonIntrospected { uid: uid(graph, child) });
                }
                let r = graph[child].gc.cgraph.od[src.idx as usize];
                src.row = r.row;
                src.idx = r.idx;
            }
            Ok(())
        }
        Row::I => {
            if src.node == function {
                // Threading called directly on the current function's
                // own I row only happens when the function's output
                // forwards one of its own inputs: genuinely terminal.
                src.terminal = true;
                return Ok(());
            }

            let parent = graph[src.node].parent.ok_or_else(|| ExecutorError::UnreachableSource {
                uid: uid(graph, src.node),
                row: Row::I,
                idx: src.idx,
            })?;

            let iam = graph[src.node].role;
            let refs = match iam {
                Role::A => &graph[parent].gc.cgraph.ad,
                Role::B => &graph[parent].gc.cgraph.bd,
                Role::I => {
                    return Err(ExecutorError::InvalidComposition {
                        uid: uid(graph, src.node),
                        detail: "non-root node with role I".into(),
                    })
                }
            };
            let r = refs[src.idx as usize];

            match r.row {
                Row::I => {
                    src.node = parent;
                    src.row = Row::I;
                    src.idx = r.idx;
                    // Terminal iff parent is itself a write/terminal
                    // boundary, or parent is the current function's root.
                    src.terminal = parent == function || graph[parent].terminal;
                    Ok(())
                }
                Row::A | Row::B => {
                    src.node = parent;
                    src.row = r.row;
                    src.idx = r.idx;
                    Ok(())
                }
                other => Err(ExecutorError::InvalidComposition {
                    uid: uid(graph, parent),
                    detail: format!("unexpected producer row {other:?} in ancestor translation"),
                }),
            }
        }
        other => Err(ExecutorError::UnreachableSource {
            uid: uid(graph, src.node),
            row: other,
            idx: src.idx,
        }),
    }
}

/// Pushes the conditional control connection for `node`, at most once
/// (`spec.md` §4.4 point 3). `node` may be genuinely absent from the
/// graph's concerns if it has no control interface at all.
fn maybe_push_control_connection(graph: &mut NodeGraph, stack: &mut Vec<CodeConnection>, node: NodeId) {
    if !graph[node].f_connection {
        return;
    }
    let Some(control_row) = graph[node].gc.control_row else {
        graph[node].f_connection = false;
        return;
    };
    let Some(ctrl_ref) = graph[node].gc.cgraph.control_ref(control_row) else {
        graph[node].f_connection = false;
        return;
    };

    graph[node].f_connection = false;
    stack.push(CodeConnection {
        src: CodeEndPoint {
            node,
            row: Row::I,
            idx: ctrl_ref.idx,
            terminal: false,
        },
        dst: CodeEndPoint {
            node,
            row: control_row,
            idx: 0,
            terminal: true,
        },
        var_name: None,
    });
}
