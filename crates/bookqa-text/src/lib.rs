//! bookqa-text
//!
//! Tantivy-based lexical index: BM25 term matching ranked below exact-phrase hits,
//! replace-by-id inserts, and on-disk or in-memory storage.

pub mod tantivy_utils;
pub mod query;
pub mod index;

pub use index::LexicalIndex;
