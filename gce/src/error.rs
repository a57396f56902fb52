//! Error types for the genetic code executor.
//!
//! One `thiserror` enum for the whole crate, in the style of
//! `faxc-gen`'s `CodeGenError`: every variant carries enough context
//! (a signature, a node uid, an interface row) to pinpoint the fault
//! without the caller needing to re-derive it.

use thiserror::Error;

use crate::cgraph::Row;
use crate::record::Signature;

/// Error type for the genetic code executor.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// A sub-GC slot holds neither a record, a signature, nor `NULL`,
    /// or a line-count invariant was violated.
    #[error("invalid composition at node {uid}: {detail}")]
    InvalidComposition { uid: String, detail: String },

    /// The GC store returned nothing for a required signature.
    #[error("missing signature {0}")]
    MissingSignature(Signature),

    /// The resolver attempted to step into a codon's sub-graph.
    #[error("attempted to introspect codon at node {uid}")]
    CodonIntrospected { uid: String },

    /// The resolver could not make a source endpoint terminal after
    /// exhausting the composition.
    #[error("source endpoint unreachable at node {uid}, row {row:?}, idx {idx}")]
    UnreachableSource { uid: String, row: Row, idx: u16 },

    /// A function would exceed 99,999 temporaries, 256 inputs, or 256
    /// outputs.
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// The emitted function body violates the textual ABI contract.
    #[error("emission failed for function f_{global_index:x}: {detail}")]
    EmissionFailure { global_index: i64, detail: String },
}

/// Result alias for the executor crate.
pub type Result<T> = std::result::Result<T, ExecutorError>;
