//! GC Store — the external, read-only collaborator the executor pulls
//! sub-GCs from on demand (`spec.md` §6). Only the contract matters
//! here; the actual store (DB-backed, cached, whatever) lives outside
//! this crate.

use std::sync::Arc;

use crate::record::{GcRecord, Signature};

/// Resolves a signature to its GC record.
///
/// Must return a consistent record for the same signature across one
/// execution context's lifetime.
pub trait GcStore {
    fn get(&self, signature: Signature) -> Option<Arc<GcRecord>>;
}
