//! Width-1 and width-2 tuple encodings used as the keys of a novelty table.
//!
//! Grounded on `original_source/.../iw.hxx`'s `Width1Tuple`/`Width2Tuple`
//! aliases over `lapkt::novelty`, and on the teacher's `SmallTuple`
//! (`search/small_tuple.rs`) for representing small fixed-arity tuples
//! backed by `smallvec` rather than a heap `Vec`.

use crate::model::FeatureValue;
use smallvec::SmallVec;

/// A single `(feature index, value)` pair: a width-1 "tuple".
pub type Width1Tuple = (u32, FeatureValue);

/// Two distinct `(feature index, value)` pairs in canonical (index-sorted)
/// order: a width-2 "tuple".
pub type Width2Tuple = (Width1Tuple, Width1Tuple);

/// Small inline buffer of indices that differ between a node and its
/// parent, used by the parent-aware novelty evaluation optimization.
pub type ChangedIndices = SmallVec<[u32; 8]>;

/// The indices at which `child` and `parent` differ. Assumes both vectors
/// have the same length, which holds as long as a single [`crate::model::FeatureSet`]
/// produces every vector in a search.
pub fn changed_indices(child: &[FeatureValue], parent: &[FeatureValue]) -> ChangedIndices {
    debug_assert_eq!(child.len(), parent.len());
    child
        .iter()
        .zip(parent.iter())
        .enumerate()
        .filter_map(|(i, (c, p))| (c != p).then_some(i as u32))
        .collect()
}

/// Build the canonical width-2 tuple from two width-1 tuples, regardless of
/// argument order.
pub fn canonical_pair(a: Width1Tuple, b: Width1Tuple) -> Width2Tuple {
    if a.0 <= b.0 {
        (a, b)
    } else {
        (b, a)
    }
}
