//! bookqa-vector
//!
//! Exact L2 dense index over chunk embeddings with a packed on-disk format.
//! See `index` for search semantics and `persist` for the file layout.

pub mod index;
pub mod persist;

pub use index::DenseIndex;
pub use persist::{read_meta, DenseMeta};
