//! Small arena and hashing utilities shared by the crates in this workspace.
//!
//! [`index_vec`] provides a `Vec<T>` wrapper indexed by a typed handle instead
//! of a bare `usize`, which is how the node graph and connection graph in
//! `gce` avoid self-referential / reference-counted node structures.

pub mod index_vec;

pub use index_vec::{Idx, IndexVec};

/// A fast, non-cryptographic hash map, aliased so callers don't need to
/// depend on `rustc-hash` directly.
pub type FxHashMap<K, V> = std::collections::HashMap<K, V, rustc_hash::FxBuildHasher>;

/// A fast, non-cryptographic hash set.
pub type FxHashSet<T> = std::collections::HashSet<T, rustc_hash::FxBuildHasher>;
