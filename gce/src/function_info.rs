//! Function Info — per-compiled-function descriptor.
//!
//! Grounded on `original_source/executor.py`'s `FunctionInfo`
//! dataclass and `NULL_FUNCTION_MAP` sentinel. Unlike the original,
//! this is an owned, cheaply-cloned value (the callable is behind an
//! `Arc`) rather than one object aliased by every node referencing the
//! same signature — see `DESIGN.md`, Open Question resolution 5.

use std::sync::Arc;

use crate::record::{Signature, Value};

/// An installed, callable emitted function.
pub type Executable = Arc<dyn Fn(&[Value]) -> Vec<Value> + Send + Sync>;

/// Sentinel meaning "nothing installed for this signature yet".
pub fn null_executable() -> Executable {
    Arc::new(|_: &[Value]| -> Vec<Value> {
        panic!("NULL_EXECUTABLE invoked: function was never emitted")
    })
}

/// Per-compiled-function descriptor (`spec.md` §3).
#[derive(Clone)]
pub struct FunctionInfo {
    pub callable: Executable,
    /// Monotonic id, unique within one context. `-1` means "name
    /// reserved, not yet emitted".
    pub global_index: i64,
    /// Positive, `<=` the context's line limit; `0` before emission.
    pub line_count: u32,
    pub signature: Signature,
}

impl FunctionInfo {
    /// The `NULL_FUNCTION_MAP` sentinel: no function emitted yet for
    /// this signature.
    pub fn null(signature: Signature) -> Self {
        FunctionInfo {
            callable: null_executable(),
            global_index: -1,
            line_count: 0,
            signature,
        }
    }

    pub fn is_null(&self) -> bool {
        self.global_index < 0
    }
}
