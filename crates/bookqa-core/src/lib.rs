//! bookqa-core
//!
//! Shared domain types, the error taxonomy, the embedder and searcher seams,
//! configuration loading and the immutable chunk store.

pub mod chunk_store;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use chunk_store::ChunkStore;
pub use error::{Error, Result};
