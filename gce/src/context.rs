//! Execution Context — the orchestrating public API (`spec.md` §4.1).
//!
//! Grounded on `original_source/.../execution_context.py`'s
//! `ExecutionContext` class: owns the namespace of compiled functions,
//! the monotonic global index, and the `GcStore` used to resolve new
//! signatures.

use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::IndexSet;

use crate::builder;
use crate::connection;
use crate::emitter::{self, EmitOptions};
use crate::error::{ExecutorError, Result};
use crate::function_info::FunctionInfo;
use crate::node::{GcNodeIter, NodeGraph, NodeId};
use crate::opt::Pass;
use crate::record::{GcRecord, ImportDef, Signature, Value};
use crate::scheduler;
use crate::store::GcStore;

/// Tunables an embedder of this crate actually has to decide between,
/// bundled independently of any file/CLI configuration format
/// (`SPEC_FULL.md` §12).
pub struct ExecutorConfig {
    /// Bounds on a single emitted function's line count (`spec.md` §4.3).
    pub line_limit: u16,
    /// Whether emitted function headers carry type-hint placeholders
    /// (`spec.md` §4.5 point 3).
    pub emit_type_hints: bool,
    /// Whether emitted functions carry a docstring line (`spec.md` §6).
    pub emit_docstring: bool,
    /// Optimisation passes run over each function before emission.
    pub passes: Vec<Box<dyn Pass>>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig {
            line_limit: 64,
            emit_type_hints: false,
            emit_docstring: false,
            passes: Vec::new(),
        }
    }
}

/// The result of successfully writing an executable: every function
/// installed in this call, root first... well, root last — callers
/// only ever need the root's signature to invoke `execute`.
pub struct WriteReport {
    pub root_signature: Signature,
    pub functions_emitted: usize,
    /// `(signature, emitted text)` for every function installed by this
    /// call, in emission order. The textual ABI surface is not retained
    /// by the context itself (only the callable survives in
    /// `function_map`), so a caller that wants to inspect or golden-test
    /// it must capture it here.
    pub texts: Vec<(Signature, String)>,
}

/// Owns the compiled-function namespace and the `GcStore` used to
/// resolve new signatures. `Send`, not `Sync` — no internal locking
/// (`spec.md` §5): callers do not share one context across threads
/// concurrently.
pub struct ExecutionContext {
    store: Box<dyn GcStore>,
    function_map: IndexMap<Signature, FunctionInfo>,
    imports: IndexSet<ImportDef>,
    next_global_index: i64,
    line_limit: u16,
    emit_options: EmitOptions,
    passes: Vec<Box<dyn Pass>>,
}

impl ExecutionContext {
    /// Primitive constructor, matching `spec.md` §4.1's public surface
    /// exactly: a line limit and nothing else.
    pub fn new(store: Box<dyn GcStore>, line_limit: u16) -> Self {
        ExecutionContext {
            store,
            function_map: IndexMap::new(),
            imports: IndexSet::new(),
            next_global_index: 0,
            line_limit,
            emit_options: EmitOptions::default(),
            passes: Vec::new(),
        }
    }

    /// Additive convenience built from [`ExecutionContext::new`]
    /// (`SPEC_FULL.md` §12).
    pub fn with_config(store: Box<dyn GcStore>, config: ExecutorConfig) -> Self {
        let mut ctx = ExecutionContext::new(store, config.line_limit);
        ctx.emit_options = EmitOptions {
            emit_type_hints: config.emit_type_hints,
            emit_docstring: config.emit_docstring,
        };
        ctx.passes = config.passes;
        ctx
    }

    pub fn line_limit(&self) -> u16 {
        self.line_limit
    }

    /// Compiles `gc` (and every not-yet-emitted sub-GC it transitively
    /// needs) into this context's namespace, per `spec.md` §4.1/§7.
    ///
    /// Idempotent: if `gc.signature` is already installed, this is a
    /// cheap lookup and no new function is emitted. On any fatal error
    /// the context is left exactly as it was before the call — nothing
    /// is staged into `self.function_map` until the whole batch
    /// succeeds (`spec.md` §7 rollback policy).
    pub fn write_executable(&mut self, gc: Arc<GcRecord>) -> Result<WriteReport> {
        let root_signature = gc.signature;

        if self.function_map.contains_key(&root_signature) {
            log::warn!("write_executable: reusing existing function for {root_signature}");
            return Ok(WriteReport {
                root_signature,
                functions_emitted: 0,
                texts: Vec::new(),
            });
        }

        let half_limit = self.line_limit as u32 / 2;
        let mut graph = builder::build(
            self.store.as_ref(),
            &self.function_map,
            half_limit,
            self.line_limit as u32,
            gc,
        )?;

        scheduler::line_count(&mut graph, self.line_limit as u32)?;

        let write_nodes: Vec<NodeId> = GcNodeIter::new(&graph, graph.root)
            .filter(|&id| graph[id].write)
            .collect();

        let mut staged_functions: IndexMap<Signature, FunctionInfo> = IndexMap::new();
        let mut staged_imports: IndexSet<ImportDef> = IndexSet::new();
        let mut staged_texts: Vec<(Signature, String)> = Vec::new();
        let mut next_index = self.next_global_index;

        for &id in &write_nodes {
            let reserved_index = next_index;
            next_index += 1;
            graph[id].function_info.global_index = reserved_index;
        }

        for &id in &write_nodes {
            let signature = graph[id].gc.signature;
            let global_index = graph[id].function_info.global_index;

            for pass in &self.passes {
                pass.apply(&mut graph, id);
            }

            connection::resolve(&mut graph, id)?;

            let emitted = emitter::emit(&mut graph, &mut staged_imports, id, global_index, self.emit_options)
                .map_err(|e| {
                    log::error!("emission failed for {signature} (f_{global_index:x}): {e}");
                    e
                })?;

            // Write the real callable back into the graph immediately:
            // an ancestor write-node processed later in this same
            // post-order pass may call `id` as a nested function and
            // needs its real closure, not the `NULL_EXECUTABLE`
            // placeholder `FunctionInfo::null` started out with.
            graph[id].function_info.callable = emitted.callable.clone();
            graph[id].function_info.line_count = graph[id].num_lines;

            let info = FunctionInfo {
                callable: emitted.callable.clone(),
                global_index,
                line_count: graph[id].num_lines,
                signature,
            };
            staged_functions.insert(signature, info);
            staged_texts.push((signature, emitted.text));
        }

        let functions_emitted = staged_functions.len();
        self.imports.extend(staged_imports);
        self.function_map.extend(staged_functions);
        self.next_global_index = next_index;

        log::info!(
            "write_executable: installed {functions_emitted} function(s) for {root_signature}, next_global_index={}",
            self.next_global_index
        );

        Ok(WriteReport {
            root_signature,
            functions_emitted,
            texts: staged_texts,
        })
    }

    /// Runs the function installed for `signature` against `args`.
    pub fn execute(&self, signature: Signature, args: &[Value]) -> Result<Vec<Value>> {
        let info = self
            .function_map
            .get(&signature)
            .ok_or(ExecutorError::MissingSignature(signature))?;
        Ok((info.callable)(args))
    }

    /// Whether `signature` already has a compiled function installed.
    pub fn is_installed(&self, signature: Signature) -> bool {
        self.function_map.contains_key(&signature)
    }

    pub fn imports(&self) -> impl Iterator<Item = &ImportDef> {
        self.imports.iter()
    }
}
