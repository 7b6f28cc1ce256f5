use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkId};

/// Ordered, immutable collection of corpus chunks.
///
/// Chunking happens upstream; the store only assigns dense ids and checks
/// the `chunks[i].id == i` invariant when given pre-numbered chunks.
#[derive(Debug, Clone)]
pub struct ChunkStore {
    chunks: Vec<Chunk>,
}

impl ChunkStore {
    /// Number chunks in input order, skipping blank entries.
    pub fn from_texts<I, S>(texts: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let chunks: Vec<Chunk> = texts
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .enumerate()
            .map(|(id, text)| Chunk { id, text })
            .collect();
        Self::from_chunks(chunks)
    }

    pub fn from_chunks(chunks: Vec<Chunk>) -> Result<Self> {
        if chunks.is_empty() {
            return Err(Error::CorpusEmpty);
        }
        if let Some((pos, c)) = chunks.iter().enumerate().find(|(i, c)| c.id != *i) {
            return Err(Error::InvalidConfig(format!(
                "chunk ids must be dense and ordered: position {pos} holds id {}",
                c.id
            )));
        }
        Ok(Self { chunks })
    }

    /// Load a chunk artifact: `.json` files hold an array of `{id, text}`
    /// passages, anything else is read as one chunk per line.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!("chunk file {}", path.display())));
        }
        let store = if path.extension().is_some_and(|ext| ext == "json") {
            let chunks: Vec<Chunk> = serde_json::from_str(&fs::read_to_string(path)?)?;
            Self::from_chunks(chunks)?
        } else {
            Self::from_texts(fs::read_to_string(path)?.lines())?
        };
        tracing::info!(path = %path.display(), chunks = store.len(), "loaded chunk store");
        Ok(store)
    }

    /// Write the passage form (`[{"id": 0, "text": ...}, ...]`).
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&self.chunks)?)?;
        Ok(())
    }

    pub fn get(&self, id: ChunkId) -> Option<&Chunk> {
        self.chunks.get(id)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    pub fn texts(&self) -> Vec<String> {
        self.chunks.iter().map(|c| c.text.clone()).collect()
    }
}
