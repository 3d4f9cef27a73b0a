//! Model-free embedder: FNV-1a hashed bag of lower-cased tokens.
//!
//! Two texts sharing vocabulary land close together, identical texts score
//! 1.0. Good enough for tests and for running without model files.

use ndarray::Array1;

use crate::embedder::{l2_normalize, EmbedderBackend, EmbeddingResult};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(8) }
    }

    fn bucket(&self, token: &str) -> usize {
        let mut h = FNV_OFFSET;
        for b in token.as_bytes() {
            h ^= u64::from(*b);
            h = h.wrapping_mul(FNV_PRIME);
        }
        (h % self.dim as u64) as usize
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

impl EmbedderBackend for HashEmbedder {
    fn embed(&self, text: &str) -> Option<EmbeddingResult> {
        let mut v = Array1::<f32>::zeros(self.dim);
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            v[self.bucket(token)] += 1.0;
        }
        l2_normalize(&mut v);
        Some(EmbeddingResult {
            embedding: v,
            cached: false,
        })
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "hash"
    }
}
