//! Embedding backend trait and the disabled backend.
//!
//! Implementations:
//! - `OnnxEmbedder`: ONNX Runtime with all-MiniLM-L6-v2 (requires `onnx` feature)
//! - `HashEmbedder`: hashed bag of tokens, deterministic and model-free
//! - `NoopEmbedder`: returns None, which disables semantic search

use ndarray::Array1;

use crate::cache::CacheStats;

/// Result of an embedding operation.
#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    /// L2-normalised float32 embedding vector.
    pub embedding: Array1<f32>,
    /// Whether this was served from cache.
    pub cached: bool,
}

/// Trait for embedding backends.
pub trait EmbedderBackend: Send + Sync {
    /// Generate an embedding for a text string.
    /// Returns None if the embedder is not available.
    fn embed(&self, text: &str) -> Option<EmbeddingResult>;

    /// Generate embeddings for a batch of texts.
    fn embed_batch(&self, texts: &[&str]) -> Vec<Option<EmbeddingResult>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;

    /// Check if the embedder is available (model loaded).
    fn is_available(&self) -> bool;

    /// Short backend name for health reporting.
    fn name(&self) -> &'static str;

    /// Query cache counters, for backends that cache.
    fn cache_stats(&self) -> Option<CacheStats> {
        None
    }
}

/// Scale `v` to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(v: &mut Array1<f32>) {
    let norm = v.dot(v).sqrt();
    if norm > f32::EPSILON {
        v.mapv_inplace(|x| x / norm);
    }
}

/// Embedder used when semantic search is disabled.
pub struct NoopEmbedder {
    dim: usize,
}

impl NoopEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl EmbedderBackend for NoopEmbedder {
    fn embed(&self, _text: &str) -> Option<EmbeddingResult> {
        None
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_l2_normalize() {
        let mut v = array![3.0f32, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut zero = Array1::<f32>::zeros(3);
        l2_normalize(&mut zero);
        assert!(zero.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_noop_embedder() {
        let e = NoopEmbedder::new(384);
        assert!(e.embed("anything").is_none());
        assert_eq!(e.embed_batch(&["a", "b"]).len(), 2);
        assert!(!e.is_available());
    }
}
