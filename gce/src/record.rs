//! GC Record — the external, immutable data the executor consumes.
//!
//! Everything in this module is produced elsewhere (the GC store, the
//! connection-graph validator) and is never mutated by the executor.

use std::fmt;
use std::sync::Arc;

use crate::cgraph::ConnectionGraph;

/// 32-byte content hash identifying a GC record.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature(pub [u8; 32]);

impl Signature {
    /// Last 8 hex characters, used in node `uid`s and diagnostics.
    pub fn short_hex(&self) -> String {
        let hex: String = self.0.iter().map(|b| format!("{b:02x}")).collect();
        hex[hex.len() - 8..].to_string()
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.short_hex())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_hex())
    }
}

/// A GCA/GCB sub-GC slot: either a fully-hydrated record, an
/// unresolved signature that must be fetched from the store, or the
/// absence of a child branch.
///
/// See `spec.md` §9 ("Dual representation of sub-GC slots").
#[derive(Clone)]
pub enum SubGc {
    Null,
    Signature(Signature),
    Record(Arc<GcRecord>),
}

impl SubGc {
    pub fn is_null(&self) -> bool {
        matches!(self, SubGc::Null)
    }
}

/// An import declaration a codon's inline template depends on (e.g. a
/// module path that must be brought into scope exactly once per
/// context before the template's first use).
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ImportDef(pub String);

/// A runtime value flowing through an emitted function.
///
/// Deliberately small: just enough to express the codon set this
/// crate is grounded against (`xor`, `rshift1`, `rand64`, `lit1`) and
/// any composition of them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(u64),
    Tuple(Vec<Value>),
}

impl Value {
    pub fn as_int(&self) -> u64 {
        match self {
            Value::Int(v) => *v,
            other => panic!("expected Value::Int, got {other:?}"),
        }
    }
}

/// The runtime semantics of a codon: given its input values (in input
/// index order), produce its output values (in output index order).
///
/// See `SPEC_FULL.md` §13: in the absence of an embedded compiler, a
/// codon's `inline` template gives the textual ABI while `codon_fn`
/// gives the behaviour the installed closure actually runs.
pub type CodonFn = Arc<dyn Fn(&[Value]) -> Vec<Value> + Send + Sync>;

/// A frozen GC record, consumed but never mutated by the executor.
///
/// See `spec.md` §3.
pub struct GcRecord {
    pub signature: Signature,
    pub cgraph: ConnectionGraph,
    pub gca: SubGc,
    pub gcb: SubGc,
    pub is_codon: bool,
    pub is_conditional: bool,
    /// Which control interface a conditional node carries, if any.
    /// `spec.md` names `F`, `L` or `W`; `None` for non-conditional GCs.
    pub control_row: Option<crate::cgraph::Row>,
    pub num_inputs: u16,
    pub num_outputs: u16,
    pub inline: Option<String>,
    pub imports: Vec<ImportDef>,
    pub num_codons: u64,
    pub codon_fn: Option<CodonFn>,
}

impl fmt::Debug for GcRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcRecord")
            .field("signature", &self.signature)
            .field("is_codon", &self.is_codon)
            .field("is_conditional", &self.is_conditional)
            .field("num_inputs", &self.num_inputs)
            .field("num_outputs", &self.num_outputs)
            .field("num_codons", &self.num_codons)
            .finish()
    }
}
