//! Optimisation hooks — declared per `spec.md` §4.5/§9, shipped as
//! no-ops with a stable contract so an implementer may realise them
//! later without changing the public API.

use crate::node::{NodeGraph, NodeId};

/// A pure transformation over one emitted function's node tree. Must
/// preserve semantics and may only remove or replace lines, never
/// reorder observable side effects across sequence points.
pub trait Pass {
    fn name(&self) -> &'static str;

    /// Apply the pass to `function`'s subtree within `graph`.
    fn apply(&self, graph: &mut NodeGraph, function: NodeId);
}

/// Constant-evaluation: fold codons whose inputs are all compile-time
/// constants. Not yet realised.
pub struct ConstFold;

impl Pass for ConstFold {
    fn name(&self) -> &'static str {
        "const-fold"
    }
    fn apply(&self, _graph: &mut NodeGraph, _function: NodeId) {}
}

/// Common-subexpression elimination across a function's terminal
/// connections. Not yet realised.
pub struct Cse;

impl Pass for Cse {
    fn name(&self) -> &'static str {
        "cse"
    }
    fn apply(&self, _graph: &mut NodeGraph, _function: NodeId) {}
}

/// Algebraic simplification of codon chains. Not yet realised.
pub struct Simplify;

impl Pass for Simplify {
    fn name(&self) -> &'static str {
        "simplify"
    }
    fn apply(&self, _graph: &mut NodeGraph, _function: NodeId) {}
}
