//! Code Emitter — names connections, emits function body text, and
//! builds the callable actually installed into the context namespace.
//!
//! Grounded on `original_source/executor.py`'s `GCNode.name_connections`
//! / `inline_cstr` / `function_def` / `code_lines`. See `SPEC_FULL.md`
//! §13 for why this module produces two artifacts (text and a closure)
//! from the same `terminal_connections` data instead of one.

use std::collections::HashMap;

use indexmap::IndexSet;

use crate::cgraph::Row;
use crate::error::{ExecutorError, Result};
use crate::function_info::Executable;
use crate::node::{GcNodeCodeIter, NodeGraph, NodeId};
use crate::record::{ImportDef, Value};

const UNUSED_VAR_NAME: &str = "_";
const MAX_TEMPORARIES: u32 = 99_999;

/// Options controlling the textual ABI surface (`spec.md` §6).
#[derive(Clone, Copy, Debug, Default)]
pub struct EmitOptions {
    pub emit_type_hints: bool,
    pub emit_docstring: bool,
}

/// Both artifacts produced for one written node.
pub struct EmittedFunction {
    pub text: String,
    pub callable: Executable,
}

fn connection_key(row: Row, dst_row: Row) -> u8 {
    if row == Row::I {
        0
    } else if dst_row == Row::O {
        1
    } else {
        2
    }
}

/// Sorts `terminal_connections` by the stable key from `spec.md` §4.5
/// point 1 and assigns every connection a `var_name`, reusing a name
/// whenever its source endpoint was already named.
pub fn name_connections(graph: &mut NodeGraph, function: NodeId) -> Result<()> {
    let conns = &mut graph[function].terminal_connections;
    conns.sort_by_key(|c| connection_key(c.src.row, c.dst.row));

    let mut named: HashMap<crate::connection::CodeEndPoint, String> = HashMap::new();
    let mut counter: u32 = 0;

    for conn in conns.iter_mut() {
        let name = if let Some(existing) = named.get(&conn.src) {
            existing.clone()
        } else if conn.src.row == Row::I {
            format!("i[{}]", conn.src.idx)
        } else if conn.dst.row == Row::O {
            format!("o{}", conn.dst.idx)
        } else {
            counter += 1;
            if counter > MAX_TEMPORARIES {
                return Err(ExecutorError::LimitExceeded(format!(
                    "function exceeds {MAX_TEMPORARIES} temporaries"
                )));
            }
            format!("t{counter}")
        };
        named.insert(conn.src, name.clone());
        conn.var_name = Some(name);
    }

    Ok(())
}

struct Lookups {
    /// `(producer node, output idx) -> variable name`, for terminal
    /// producers whose output is actually consumed.
    out_name: HashMap<(NodeId, u16), String>,
    /// `(consumer node, input idx) -> variable name` feeding that input.
    in_name: HashMap<(NodeId, u16), String>,
    /// `function output idx -> variable name` for the return statement.
    return_name: HashMap<u16, String>,
}

fn build_lookups(graph: &NodeGraph, function: NodeId) -> Lookups {
    let mut out_name = HashMap::new();
    let mut in_name = HashMap::new();
    let mut return_name = HashMap::new();

    for conn in &graph[function].terminal_connections {
        let name = conn.var_name.clone().expect("connections must be named before emission");
        if conn.src.row == Row::O {
            out_name.insert((conn.src.node, conn.src.idx), name.clone());
        }
        match conn.dst.row {
            Row::I => {
                in_name.insert((conn.dst.node, conn.dst.idx), name.clone());
            }
            Row::O if conn.dst.node == function => {
                return_name.insert(conn.dst.idx, name.clone());
            }
            _ => {}
        }
    }

    Lookups {
        out_name,
        in_name,
        return_name,
    }
}

fn substitute_inline(template: &str, inputs: &[String]) -> String {
    let mut out = template.to_string();
    for (k, name) in inputs.iter().enumerate() {
        out = out.replace(&format!("{{i{k}}}"), name);
    }
    out
}

/// Emits one source line for `id` (a codon or a call to an
/// already-/to-be-emitted function), per `spec.md` §4.5 point 2.
fn emit_line(
    graph: &NodeGraph,
    lookups: &Lookups,
    imports: &mut IndexSet<ImportDef>,
    id: NodeId,
) -> Result<String> {
    let node = &graph[id];
    let gc = &node.gc;

    let lhs_names: Vec<String> = (0..gc.num_outputs)
        .map(|k| {
            lookups
                .out_name
                .get(&(id, k))
                .cloned()
                .unwrap_or_else(|| UNUSED_VAR_NAME.to_string())
        })
        .collect();
    let lhs = if lhs_names.is_empty() {
        String::new()
    } else {
        format!("{} = ", lhs_names.join(", "))
    };

    let input_names: Vec<String> = (0..gc.num_inputs)
        .map(|k| {
            lookups
                .in_name
                .get(&(id, k))
                .cloned()
                .unwrap_or_else(|| UNUSED_VAR_NAME.to_string())
        })
        .collect();

    let rhs = if node.is_codon {
        let template = gc
            .inline
            .as_deref()
            .ok_or_else(|| ExecutorError::InvalidComposition {
                uid: graph.uid(id),
                detail: "codon missing inline template".into(),
            })?;
        for imp in &gc.imports {
            imports.insert(imp.clone());
        }
        substitute_inline(template, &input_names)
    } else {
        let idx = node.function_info.global_index;
        if idx < 0 {
            return Err(ExecutorError::InvalidComposition {
                uid: graph.uid(id),
                detail: "call to function with unreserved global index".into(),
            });
        }
        if input_names.is_empty() {
            format!("f_{idx:x}()")
        } else {
            format!("f_{idx:x}(({},))", input_names.join(", "))
        }
    };

    Ok(format!("{lhs}{rhs}"))
}

/// Builds the ordered body lines for `function`, per `spec.md` §4.5.
fn code_lines(graph: &NodeGraph, lookups: &Lookups, imports: &mut IndexSet<ImportDef>, function: NodeId) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for id in GcNodeCodeIter::new(graph, function) {
        if id == function && !graph[id].is_codon {
            continue;
        }
        lines.push(emit_line(graph, lookups, imports, id)?);
    }
    Ok(lines)
}

/// Builds the header line: `def f_{hex}(i[: tuple[...]]) [-> tuple[...]]:`
fn function_def(graph: &NodeGraph, function: NodeId, global_index: i64, opts: EmitOptions) -> String {
    let gc = &graph[function].gc;
    let params = if gc.num_inputs == 0 {
        String::new()
    } else if opts.emit_type_hints {
        let types = (0..gc.num_inputs).map(|_| "T").collect::<Vec<_>>().join(", ");
        format!("i: ({types},)")
    } else {
        "i".to_string()
    };

    let ret = if gc.num_outputs == 0 {
        String::new()
    } else if opts.emit_type_hints {
        let types = (0..gc.num_outputs).map(|_| "T").collect::<Vec<_>>().join(", ");
        format!(" -> ({types},)")
    } else {
        String::new()
    };

    format!("def f_{global_index:x}({params}){ret}:")
}

fn return_line(graph: &NodeGraph, lookups: &Lookups, function: NodeId) -> Option<String> {
    let gc = &graph[function].gc;
    if gc.num_outputs == 0 {
        return None;
    }
    let names: Vec<String> = (0..gc.num_outputs)
        .map(|k| lookups.return_name.get(&k).cloned().expect("every function output must be named"))
        .collect();
    Some(format!("return {}", names.join(", ")))
}

/// Emits the full text and builds the executable closure for one
/// written node. `global_index` must already be reserved.
pub fn emit(
    graph: &mut NodeGraph,
    imports: &mut IndexSet<ImportDef>,
    function: NodeId,
    global_index: i64,
    opts: EmitOptions,
) -> Result<EmittedFunction> {
    name_connections(graph, function)?;
    let lookups = build_lookups(graph, function);

    let body_lines = code_lines(graph, &lookups, imports, function)?;
    let header = function_def(graph, function, global_index, opts);
    let ret = return_line(graph, &lookups, function);

    let mut text = String::new();
    text.push_str(&header);
    text.push('\n');
    for line in &body_lines {
        text.push('\t');
        text.push_str(line);
        text.push('\n');
    }
    if let Some(ret) = &ret {
        text.push('\t');
        text.push_str(ret);
        text.push('\n');
    }

    let callable = build_executable(graph, &lookups, function)?;

    Ok(EmittedFunction { text, callable })
}

/// Where a runtime value comes from when evaluating one op.
#[derive(Clone, Copy)]
enum Source {
    Input(u16),
    Local(usize),
}

struct CompiledOp {
    codon_fn: Option<crate::record::CodonFn>,
    call: Option<Executable>,
    inputs: Vec<Source>,
    /// One slot per declared output; `None` means unused (`_`).
    output_slots: Vec<Option<usize>>,
}

fn resolve_name(name: &str, slots: &mut HashMap<String, usize>, next_slot: &mut usize) -> Source {
    if let Some(rest) = name.strip_prefix("i[") {
        let idx: u16 = rest.trim_end_matches(']').parse().expect("well-formed i[k] name");
        return Source::Input(idx);
    }
    if let Some(slot) = slots.get(name) {
        return Source::Local(*slot);
    }
    let slot = *next_slot;
    *next_slot += 1;
    slots.insert(name.to_string(), slot);
    Source::Local(slot)
}

/// Builds the closure actually invoked by `ExecutionContext::execute`,
/// from the same `terminal_connections` data used for `text` above
/// (`SPEC_FULL.md` §13).
fn build_executable(graph: &NodeGraph, lookups: &Lookups, function: NodeId) -> Result<Executable> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut next_slot: usize = 0;

    let mut ops: Vec<CompiledOp> = Vec::new();
    for id in GcNodeCodeIter::new(graph, function) {
        if id == function && !graph[id].is_codon {
            continue;
        }
        let node = &graph[id];
        let gc = &node.gc;

        let inputs: Vec<Source> = (0..gc.num_inputs)
            .map(|k| {
                let name = lookups
                    .in_name
                    .get(&(id, k))
                    .cloned()
                    .unwrap_or_else(|| UNUSED_VAR_NAME.to_string());
                resolve_name(&name, &mut slots, &mut next_slot)
            })
            .collect();

        let output_slots: Vec<Option<usize>> = (0..gc.num_outputs)
            .map(|k| {
                lookups.out_name.get(&(id, k)).map(|name| {
                    match resolve_name(name, &mut slots, &mut next_slot) {
                        Source::Local(slot) => slot,
                        Source::Input(_) => unreachable!("an output cannot alias an input name"),
                    }
                })
            })
            .collect();

        if node.is_codon {
            let codon_fn = gc.codon_fn.clone().ok_or_else(|| ExecutorError::InvalidComposition {
                uid: graph.uid(id),
                detail: "codon missing runtime implementation".into(),
            })?;
            ops.push(CompiledOp {
                codon_fn: Some(codon_fn),
                call: None,
                inputs,
                output_slots,
            });
        } else {
            ops.push(CompiledOp {
                codon_fn: None,
                call: Some(node.function_info.callable.clone()),
                inputs,
                output_slots,
            });
        }
    }

    let gc = &graph[function].gc;
    let return_sources: Vec<Source> = (0..gc.num_outputs)
        .map(|k| {
            let name = lookups.return_name.get(&k).cloned().expect("every function output must be named");
            resolve_name(&name, &mut slots, &mut next_slot)
        })
        .collect();

    let num_locals = next_slot;

    Ok(std::sync::Arc::new(move |args: &[Value]| -> Vec<Value> {
        let mut locals: Vec<Option<Value>> = vec![None; num_locals];
        for op in &ops {
            let inputs: Vec<Value> = op
                .inputs
                .iter()
                .map(|s| match s {
                    Source::Input(k) => args[*k as usize].clone(),
                    Source::Local(slot) => locals[*slot].clone().expect("local read before write"),
                })
                .collect();
            let outputs = if let Some(f) = &op.codon_fn {
                f(&inputs)
            } else {
                (op.call.as_ref().expect("op is either a codon or a call"))(&inputs)
            };
            for (k, slot) in op.output_slots.iter().enumerate() {
                if let Some(slot) = slot {
                    locals[*slot] = Some(outputs[k].clone());
                }
            }
        }
        return_sources
            .iter()
            .map(|s| match s {
                Source::Input(k) => args[*k as usize].clone(),
                Source::Local(slot) => locals[*slot].clone().expect("return local not computed"),
            })
            .collect()
    }))
}
