//! In-memory vector index over thread chunks
//!
//! Built once per post collection and never mutated afterwards. A rebuild
//! produces a new [`VectorIndex`]; nothing is exposed until every chunk has
//! been embedded.

use tracing::debug;
use tracing::info;

use crate::embeddings::EmbeddingCapability;
use crate::errors::Result;
use crate::errors::ThreadQaError;
use crate::models::Chunk;
use crate::models::SearchResult;

/// A chunk and its embedding
#[derive(Debug, Clone)]
struct IndexedChunk {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// Append-only collection of (chunk, embedding) pairs
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    entries: Vec<IndexedChunk>,
    dimension: usize,
}

impl VectorIndex {
    /// Embed every chunk, in batches of at most `batch_size`.
    ///
    /// Fails as a whole on the first capability error or on a malformed
    /// response (wrong vector count, empty or mixed-length vectors).
    pub async fn build(
        chunks: Vec<Chunk>,
        embedder: &dyn EmbeddingCapability,
        batch_size: usize,
    ) -> Result<Self> {
        let batch_size = batch_size.max(1);
        info!(
            "Building index over {} chunks with {}",
            chunks.len(),
            embedder.model_name()
        );

        let mut embeddings: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = embedder.embed_batch(&texts).await?;
            if vectors.len() != texts.len() {
                return Err(ThreadQaError::EmbeddingServiceError(format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    vectors.len()
                )));
            }
            debug!("Embedded batch of {}", texts.len());
            embeddings.extend(vectors);
        }

        let dimension = embeddings.first().map_or(0, Vec::len);
        if let Some(bad) = embeddings
            .iter()
            .find(|v| v.is_empty() || v.len() != dimension)
        {
            return Err(ThreadQaError::EmbeddingServiceError(format!(
                "inconsistent embedding dimension: expected {dimension}, got {}",
                bad.len()
            )));
        }

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedChunk { chunk, embedding })
            .collect();

        Ok(Self { entries, dimension })
    }

    /// The `k` chunks most similar to `query_embedding`, closest first.
    /// Equal scores keep index order.
    pub fn nearest(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if self.entries.is_empty() {
            return Err(ThreadQaError::EmptyIndex);
        }

        let mut results: Vec<SearchResult> = self
            .entries
            .iter()
            .map(|entry| SearchResult {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query_embedding, &entry.embedding),
            })
            .collect();

        // Stable sort preserves index order for ties
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);
        Ok(results)
    }

    /// Embed `question` and return the `k` nearest chunks with scores
    pub async fn search(
        &self,
        question: &str,
        k: usize,
        embedder: &dyn EmbeddingCapability,
    ) -> Result<Vec<SearchResult>> {
        if self.entries.is_empty() {
            return Err(ThreadQaError::EmptyIndex);
        }
        let query_embedding = embedder.embed(question).await?;
        if query_embedding.len() != self.dimension {
            return Err(ThreadQaError::EmbeddingServiceError(format!(
                "query embedding has {} dimensions, index has {}",
                query_embedding.len(),
                self.dimension
            )));
        }
        self.nearest(&query_embedding, k)
    }

    /// Embed `question` and return the `k` nearest chunks, closest first
    pub async fn query(
        &self,
        question: &str,
        k: usize,
        embedder: &dyn EmbeddingCapability,
    ) -> Result<Vec<Chunk>> {
        Ok(self
            .search(question, k, embedder)
            .await?
            .into_iter()
            .map(|r| r.chunk)
            .collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shared dimensionality of every embedding (0 when empty)
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`, or `0.0` for empty vectors, vectors of
/// different lengths, or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
