use std::sync::Arc;

use bookqa_core::config::RetrievalSettings;
use bookqa_core::error::{Error, Result};
use bookqa_core::traits::{Embedder, SentenceSplitter, TextSearcher, VectorSearcher};
use bookqa_core::types::{ChunkId, Retrieval, SearchHit, SentenceCandidate, SourceKind};
use bookqa_core::ChunkStore;

/// A chunk nominated by at least one index.
///
/// `hits` lists every index that returned the chunk, the first one decides
/// its place in the candidate order. Only [`merge_hits`] builds candidates,
/// so `hits` is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    id: ChunkId,
    hits: Vec<SearchHit>,
}

impl Candidate {
    pub fn id(&self) -> ChunkId {
        self.id
    }

    pub fn hits(&self) -> &[SearchHit] {
        &self.hits
    }

    pub fn source(&self) -> SourceKind {
        self.hits.first().map_or(SourceKind::Dense, |h| h.source)
    }

    pub fn found_by(&self, source: SourceKind) -> bool {
        self.hits.iter().any(|h| h.source == source)
    }
}

/// Union `hits` by chunk id, keeping first-seen order. Hits for which
/// `known` is false are dropped.
pub fn merge_hits(hits: impl IntoIterator<Item = SearchHit>, known: impl Fn(ChunkId) -> bool) -> Vec<Candidate> {
    let mut merged: Vec<Candidate> = Vec::new();
    for hit in hits {
        if !known(hit.id) {
            tracing::debug!(id = hit.id, source = ?hit.source, "skipping hit outside the chunk store");
            continue;
        }
        match merged.iter_mut().find(|c| c.id == hit.id) {
            Some(existing) => existing.hits.push(hit),
            None => merged.push(Candidate { id: hit.id, hits: vec![hit] }),
        }
    }
    merged
}

/// Two-stage retrieval: dense (and optionally lexical) candidate lookup,
/// then sentence-level reranking inside each candidate chunk.
pub struct HybridRetriever<V, T>
where
    V: VectorSearcher,
    T: TextSearcher,
{
    chunks: ChunkStore,
    embedder: Arc<dyn Embedder>,
    dense: V,
    lexical: Option<T>,
    splitter: Box<dyn SentenceSplitter>,
    settings: RetrievalSettings,
}

impl<V, T> HybridRetriever<V, T>
where
    V: VectorSearcher,
    T: TextSearcher,
{
    pub fn new(
        chunks: ChunkStore,
        embedder: Arc<dyn Embedder>,
        dense: V,
        lexical: Option<T>,
        splitter: Box<dyn SentenceSplitter>,
        settings: RetrievalSettings,
    ) -> Self {
        let lexical = if settings.use_lexical { lexical } else { None };
        Self { chunks, embedder, dense, lexical, splitter, settings }
    }

    pub fn chunks(&self) -> &ChunkStore {
        &self.chunks
    }

    pub fn dense(&self) -> &V {
        &self.dense
    }

    pub fn lexical(&self) -> Option<&T> {
        self.lexical.as_ref()
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub fn retrieve(&self, query: &str, top_k: usize) -> Result<Retrieval> {
        let sentences = self.retrieve_scored(query, top_k)?;
        Ok(Retrieval::from_sentences(sentences.into_iter().map(|s| s.text).collect()))
    }

    /// Like [`Self::retrieve`] but keeps each sentence's similarity score.
    pub fn retrieve_scored(&self, query: &str, top_k: usize) -> Result<Vec<SentenceCandidate>> {
        let top_k = top_k.min(self.settings.max_top_k);
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let query_vec = self.embedder.embed(query).map_err(Error::embedder)?;
        let candidates = self.candidates(&query_vec, query, top_k)?;
        tracing::debug!(query, top_k, candidates = candidates.len(), "collected candidates");
        self.rerank(&query_vec, &candidates)
    }

    /// Dense hits in rank order, followed by lexical-only hits in lexical
    /// rank order. Ids the chunk store does not know are dropped.
    pub fn candidates(&self, query_vec: &[f32], query: &str, top_k: usize) -> Result<Vec<Candidate>> {
        let dense_hits = self.dense.search_vec(query_vec, top_k)?;
        let lexical_hits = match &self.lexical {
            Some(lexical) => lexical.search_text(query, top_k)?,
            None => Vec::new(),
        };

        Ok(merge_hits(dense_hits.into_iter().chain(lexical_hits), |id| self.chunks.get(id).is_some()))
    }

    fn rerank(&self, query_vec: &[f32], candidates: &[Candidate]) -> Result<Vec<SentenceCandidate>> {
        let query_unit = normalized(query_vec);

        // Sentences of every candidate go through the embedder in one batch;
        // `spans[i]` is the range of `texts` belonging to candidate i.
        let mut texts: Vec<String> = Vec::new();
        let mut spans = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let Some(chunk) = self.chunks.get(candidate.id) else { continue };
            let start = texts.len();
            texts.extend(
                self.splitter
                    .split(&chunk.text)
                    .into_iter()
                    .filter(|s| s.chars().count() >= self.settings.min_sentence_chars)
                    .map(str::to_string),
            );
            spans.push(start..texts.len());
        }
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self.embedder.embed_batch(&texts).map_err(Error::embedder)?;
        if embeddings.len() != texts.len() {
            return Err(Error::Embedder(format!(
                "expected {} sentence vectors, got {}",
                texts.len(),
                embeddings.len()
            )));
        }
        let mut scores = Vec::with_capacity(embeddings.len());
        for embedding in &embeddings {
            if embedding.len() != query_unit.len() {
                return Err(Error::DimensionMismatch { expected: query_unit.len(), actual: embedding.len() });
            }
            scores.push(dot(&query_unit, &normalized(embedding)));
        }

        let mut out = Vec::new();
        for span in spans {
            let mut ranked: Vec<usize> = span
                .filter(|&i| self.settings.min_score.map_or(true, |min| scores[i] >= min))
                .collect();
            // stable: equal scores keep sentence order
            ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
            out.extend(
                ranked
                    .into_iter()
                    .take(self.settings.sentences_per_candidate)
                    .map(|i| SentenceCandidate { text: texts[i].clone(), score: scores[i] }),
            );
        }
        Ok(out)
    }
}

fn normalized(v: &[f32]) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        return v.to_vec();
    }
    v.iter().map(|x| x / norm).collect()
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
