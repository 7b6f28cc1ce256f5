//! bookqa-hybrid
//!
//! Query-time half of bookqa. [`HybridRetriever`] unions dense and lexical
//! candidates and reranks the sentences inside them; [`FallbackGenerator`]
//! answers when nothing clears the bar; [`Engine`] ties both to the indexes
//! and the corpus.

pub mod engine;
pub mod fallback;
pub mod retriever;
pub mod sentence;

pub use engine::{Answer, Engine};
pub use fallback::FallbackGenerator;
pub use retriever::{merge_hits, Candidate, HybridRetriever};
pub use sentence::UnicodeSentenceSplitter;
