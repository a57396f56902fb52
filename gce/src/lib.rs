//! gce - Genetic Code Executor
//!
//! Compiles a recursive composition of "genetic code" (GC) records —
//! primitive codons and binary compositions of sub-GCs wired together
//! by a typed connection graph — into a namespace of callable
//! functions bounded by a per-function line budget.
//!
//! Pipeline, one `write_executable` call at a time:
//! 1. [`builder`] walks the composition breadth-first, pulling
//!    unresolved sub-GCs from a [`store::GcStore`] and building a
//!    [`node::NodeGraph`].
//! 2. [`scheduler`] assigns every node a line count and marks the
//!    subset that becomes its own emitted function.
//! 3. [`connection`] threads every destination endpoint inside one
//!    emitted function back to its terminal source.
//! 4. [`emitter`] names those connections, emits the function's source
//!    text, and builds the closure actually installed into the
//!    context.
//!
//! [`context::ExecutionContext`] is the public entry point tying all of
//! the above together.

pub mod builder;
pub mod cgraph;
pub mod connection;
pub mod context;
pub mod emitter;
pub mod error;
pub mod function_info;
pub mod node;
pub mod opt;
pub mod record;
pub mod scheduler;
pub mod store;

#[cfg(test)]
mod edge_cases;

pub use cgraph::{ConnectionGraph, EndPointRef, Row};
pub use context::{ExecutionContext, ExecutorConfig, WriteReport};
pub use error::{ExecutorError, Result};
pub use function_info::{Executable, FunctionInfo};
pub use node::{GcNode, NodeGraph, NodeId};
pub use record::{CodonFn, GcRecord, ImportDef, Signature, SubGc, Value};
pub use store::GcStore;
