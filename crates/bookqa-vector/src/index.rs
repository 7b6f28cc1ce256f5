use bookqa_core::error::{Error, Result};
use bookqa_core::traits::VectorSearcher;
use bookqa_core::types::{ChunkId, SearchHit};

/// Exact (brute-force) L2 index over chunk embeddings.
///
/// Vectors are stored row-major in one contiguous buffer; row `i` is the
/// embedding of chunk `i`. Distances are squared Euclidean, the quantity a
/// flat L2 index reports, so an identical vector scores exactly `0.0`.
#[derive(Debug, Clone, Default)]
pub struct DenseIndex {
    state: Option<FlatVectors>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FlatVectors {
    pub(crate) dim: usize,
    pub(crate) data: Vec<f32>,
}

impl FlatVectors {
    fn count(&self) -> usize {
        if self.dim == 0 { 0 } else { self.data.len() / self.dim }
    }

    fn row(&self, id: ChunkId) -> &[f32] {
        &self.data[id * self.dim..(id + 1) * self.dim]
    }
}

impl DenseIndex {
    /// An index with nothing in it; `search` fails with `NotBuilt`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(vectors: &[Vec<f32>]) -> Result<Self> {
        let first = vectors.first().ok_or(Error::CorpusEmpty)?;
        let dim = first.len();
        if dim == 0 {
            return Err(Error::DimensionMismatch { expected: 1, actual: 0 });
        }
        let mut data = Vec::with_capacity(dim * vectors.len());
        for v in vectors {
            if v.len() != dim {
                return Err(Error::DimensionMismatch { expected: dim, actual: v.len() });
            }
            data.extend_from_slice(v);
        }
        tracing::info!(count = vectors.len(), dim, "built dense index");
        Ok(Self { state: Some(FlatVectors { dim, data }) })
    }

    pub(crate) fn from_flat(flat: FlatVectors) -> Self {
        Self { state: Some(flat) }
    }

    pub(crate) fn flat(&self) -> Result<&FlatVectors> {
        self.state.as_ref().ok_or(Error::NotBuilt)
    }

    pub fn is_built(&self) -> bool {
        self.state.is_some()
    }

    pub fn dim(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.dim)
    }

    pub fn len(&self) -> usize {
        self.state.as_ref().map_or(0, FlatVectors::count)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append one vector; it receives the next id so row order keeps
    /// matching chunk order. An unbuilt index adopts the vector's dimension.
    pub fn add(&mut self, vector: &[f32]) -> Result<ChunkId> {
        match &mut self.state {
            Some(flat) => {
                if vector.len() != flat.dim {
                    return Err(Error::DimensionMismatch { expected: flat.dim, actual: vector.len() });
                }
                let id = flat.count();
                flat.data.extend_from_slice(vector);
                Ok(id)
            }
            None => {
                *self = Self::build(&[vector.to_vec()])?;
                Ok(0)
            }
        }
    }

    /// Stored vector for `id`, if any.
    pub fn vector(&self, id: ChunkId) -> Option<&[f32]> {
        let flat = self.state.as_ref()?;
        (id < flat.count()).then(|| flat.row(id))
    }

    /// Up to `k` nearest rows as `(id, squared_distance)`, ascending by
    /// distance, ties broken by lower id.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(ChunkId, f32)>> {
        let flat = self.flat()?;
        if query.len() != flat.dim {
            return Err(Error::DimensionMismatch { expected: flat.dim, actual: query.len() });
        }
        let mut scored: Vec<(ChunkId, f32)> = flat
            .data
            .chunks_exact(flat.dim)
            .enumerate()
            .map(|(id, row)| (id, squared_l2(query, row)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored)
    }
}

impl VectorSearcher for DenseIndex {
    fn search_vec(&self, query_vec: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        Ok(self
            .search(query_vec, k)?
            .into_iter()
            .map(|(id, distance)| SearchHit::dense(id, distance))
            .collect())
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
