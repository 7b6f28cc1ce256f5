use std::path::Path;
use std::sync::Arc;

use rand::Rng;

use bookqa_core::config::Settings;
use bookqa_core::error::{Error, Result};
use bookqa_core::traits::Embedder;
use bookqa_core::types::{LexicalDocument, Retrieval, SentenceCandidate};
use bookqa_core::ChunkStore;
use bookqa_text::LexicalIndex;
use bookqa_vector::DenseIndex;

use crate::fallback::FallbackGenerator;
use crate::retriever::HybridRetriever;
use crate::sentence::UnicodeSentenceSplitter;

pub const DENSE_DIR: &str = "dense";
pub const LEXICAL_DIR: &str = "lexical";

/// What a question gets back: retrieved sentences, or a fallback line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Sentences(Vec<String>),
    Fallback(String),
}

/// Owns the embedder, both indexes and the corpus for the life of the
/// process. Queries take `&self`; share it across threads behind an `Arc`.
pub struct Engine {
    retriever: HybridRetriever<DenseIndex, LexicalIndex>,
    fallback: FallbackGenerator,
    settings: Settings,
}

impl Engine {
    /// Embed every chunk in `embedding.batch_size` batches and build both
    /// indexes in memory. `progress` is called with `(embedded, total)`.
    pub fn build(
        settings: &Settings,
        embedder: Arc<dyn Embedder>,
        chunks: ChunkStore,
        mut progress: impl FnMut(usize, usize),
    ) -> Result<Self> {
        settings.validate()?;
        if chunks.is_empty() {
            return Err(Error::CorpusEmpty);
        }
        let total = chunks.len();
        let dim = embedder.dim();
        let texts = chunks.texts();
        let mut vectors = Vec::with_capacity(total);
        for batch in texts.chunks(settings.embedding.batch_size) {
            for v in embedder.embed_batch(batch).map_err(Error::embedder)? {
                if v.len() != dim {
                    return Err(Error::DimensionMismatch { expected: dim, actual: v.len() });
                }
                vectors.push(v);
            }
            progress(vectors.len(), total);
        }
        if vectors.len() != total {
            return Err(Error::Embedder(format!("embedded {} of {total} chunks", vectors.len())));
        }

        let dense = DenseIndex::build(&vectors)?;
        let lexical = if settings.retrieval.use_lexical {
            let mut lexical = LexicalIndex::in_memory()?;
            lexical.build(&lexical_documents(&chunks, &dense))?;
            Some(lexical)
        } else {
            None
        };
        tracing::info!(chunks = total, dim, lexical = lexical.is_some(), "engine built");
        Ok(Self::assemble(settings, embedder, chunks, dense, lexical))
    }

    /// Load indexes written by [`Engine::save`] from `index_dir`.
    pub fn open(settings: &Settings, embedder: Arc<dyn Embedder>, chunks: ChunkStore, index_dir: &Path) -> Result<Self> {
        settings.validate()?;
        let dense = DenseIndex::load(&index_dir.join(DENSE_DIR))?;
        if dense.len() != chunks.len() {
            return Err(Error::CorruptIndex(format!(
                "dense index holds {} vectors but the corpus has {} chunks",
                dense.len(),
                chunks.len()
            )));
        }
        if let Some(dim) = dense.dim() {
            if dim != embedder.dim() {
                return Err(Error::DimensionMismatch { expected: dim, actual: embedder.dim() });
            }
        }
        let lexical = if settings.retrieval.use_lexical {
            Some(LexicalIndex::open(&index_dir.join(LEXICAL_DIR))?)
        } else {
            None
        };
        tracing::info!(dir = %index_dir.display(), chunks = chunks.len(), "engine opened");
        Ok(Self::assemble(settings, embedder, chunks, dense, lexical))
    }

    fn assemble(
        settings: &Settings,
        embedder: Arc<dyn Embedder>,
        chunks: ChunkStore,
        dense: DenseIndex,
        lexical: Option<LexicalIndex>,
    ) -> Self {
        let retriever = HybridRetriever::new(
            chunks,
            embedder,
            dense,
            lexical,
            Box::new(UnicodeSentenceSplitter),
            settings.retrieval.clone(),
        );
        Self {
            retriever,
            fallback: FallbackGenerator::new(settings.fallback.subject.clone()),
            settings: settings.clone(),
        }
    }

    /// Write `dense/` and, when lexical retrieval is on, `lexical/` under
    /// `index_dir`. The on-disk lexical index is rebuilt from the corpus.
    pub fn save(&self, index_dir: &Path) -> Result<()> {
        self.dense().save(&index_dir.join(DENSE_DIR))?;
        if self.retriever.lexical().is_some() {
            let mut lexical = LexicalIndex::create_in_dir(&index_dir.join(LEXICAL_DIR))?;
            lexical.build(&lexical_documents(self.chunks(), self.dense()))?;
        }
        tracing::info!(dir = %index_dir.display(), "engine saved");
        Ok(())
    }

    pub fn retrieve(&self, query: &str, top_k: usize) -> Result<Retrieval> {
        self.retriever.retrieve(query, top_k)
    }

    pub fn retrieve_scored(&self, query: &str, top_k: usize) -> Result<Vec<SentenceCandidate>> {
        self.retriever.retrieve_scored(query, top_k)
    }

    pub fn fallback(&self, query: &str) -> String {
        self.fallback.generate(query)
    }

    pub fn fallback_with<R: Rng + ?Sized>(&self, query: &str, rng: &mut R) -> String {
        self.fallback.generate_with(query, rng)
    }

    /// Retrieve, falling back to a templated line when nothing is found.
    pub fn answer(&self, query: &str, top_k: usize) -> Result<Answer> {
        Ok(match self.retrieve(query, top_k)? {
            Retrieval::Found(sentences) => Answer::Sentences(sentences),
            Retrieval::Empty => {
                tracing::debug!(query, "no sentences retrieved, using fallback");
                Answer::Fallback(self.fallback(query))
            }
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn chunks(&self) -> &ChunkStore {
        self.retriever.chunks()
    }

    pub fn dense(&self) -> &DenseIndex {
        self.retriever.dense()
    }

    pub fn lexical(&self) -> Option<&LexicalIndex> {
        self.retriever.lexical()
    }
}

fn lexical_documents(chunks: &ChunkStore, dense: &DenseIndex) -> Vec<LexicalDocument> {
    chunks
        .iter()
        .map(|chunk| {
            let doc = LexicalDocument::from(chunk);
            match dense.vector(chunk.id) {
                Some(v) => doc.with_embedding(v.to_vec()),
                None => doc,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn engine_is_shareable_across_threads() {
        assert_send_sync::<Engine>();
    }
}
