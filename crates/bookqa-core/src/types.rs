//! Domain types shared by the dense index, the lexical index and the retriever.

use serde::{Deserialize, Serialize};

/// Position of a chunk in the [`crate::ChunkStore`] and in the dense vector array.
pub type ChunkId = usize;

/// A pre-segmented span of corpus text, the unit both indexes are built over.
///
/// `id` is dense and 0-based: `store.get(i).id == i` for every chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
}

/// A document as stored by the lexical index.
///
/// The embedding is carried redundantly when the caller has one at hand;
/// nothing in the retrieval path reads it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalDocument {
    pub id: ChunkId,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl LexicalDocument {
    pub fn new(id: ChunkId, text: impl Into<String>) -> Self {
        Self { id, text: text.into(), embedding: None }
    }

    #[must_use]
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

impl From<&Chunk> for LexicalDocument {
    fn from(chunk: &Chunk) -> Self {
        Self::new(chunk.id, chunk.text.clone())
    }
}

/// Indicates which index produced a hit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Dense,
    Lexical,
}

/// The minimal surface returned by both indexes.
///
/// `score` is index-specific and NOT comparable across sources: dense hits
/// carry a squared L2 distance (lower is closer), lexical hits a relevance
/// score (higher is better).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: ChunkId,
    pub score: f32,
    pub source: SourceKind,
}

impl SearchHit {
    pub fn dense(id: ChunkId, distance: f32) -> Self {
        Self { id, score: distance, source: SourceKind::Dense }
    }

    pub fn lexical(id: ChunkId, score: f32) -> Self {
        Self { id, score, source: SourceKind::Lexical }
    }
}

/// A sentence taken from a candidate chunk, scored against the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceCandidate {
    pub text: String,
    pub score: f32,
}

/// Outcome of a retrieval call.
///
/// `Empty` is an expected result, routed by the caller to the fallback
/// generator; it is never reported as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Retrieval {
    Found(Vec<String>),
    Empty,
}

impl Retrieval {
    pub fn from_sentences(sentences: Vec<String>) -> Self {
        if sentences.is_empty() { Self::Empty } else { Self::Found(sentences) }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn sentences(&self) -> &[String] {
        match self {
            Self::Found(sentences) => sentences,
            Self::Empty => &[],
        }
    }

    pub fn into_sentences(self) -> Vec<String> {
        match self {
            Self::Found(sentences) => sentences,
            Self::Empty => Vec::new(),
        }
    }
}
