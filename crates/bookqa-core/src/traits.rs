use crate::error::Result;
use crate::types::SearchHit;

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

/// Splits a chunk into sentences. Returned slices borrow from `text`.
pub trait SentenceSplitter: Send + Sync {
    fn split<'a>(&self, text: &'a str) -> Vec<&'a str>;
}

/// Dense lookup. Hits carry distances, ascending.
pub trait VectorSearcher: Send + Sync {
    fn search_vec(&self, query_vec: &[f32], k: usize) -> Result<Vec<SearchHit>>;
}

/// Lexical lookup. Hits carry relevance scores, descending.
pub trait TextSearcher: Send + Sync {
    fn search_text(&self, query: &str, k: usize) -> Result<Vec<SearchHit>>;
}
