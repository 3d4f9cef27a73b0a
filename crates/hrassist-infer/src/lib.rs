//! HR Assist Infer: sentence embedders and the query embedding cache.
//!
//! `EmbedderBackend` abstracts over embedding generation. With the `onnx`
//! feature and model files present, `OnnxEmbedder` runs all-MiniLM-L6-v2
//! for 384-dim embeddings. `HashEmbedder` needs no model and is used for
//! tests and lightweight deployments. `NoopEmbedder` disables semantic
//! search entirely.

pub mod cache;
pub mod embedder;
pub mod hash_embedder;
pub mod onnx_embedder;

pub use cache::{CacheStats, EmbeddingCache};
pub use embedder::{l2_normalize, EmbedderBackend, EmbeddingResult, NoopEmbedder};
pub use hash_embedder::HashEmbedder;

#[cfg(feature = "onnx")]
pub use onnx_embedder::OnnxEmbedder;

use std::path::Path;
use std::sync::Arc;

use hrassist_core::EmbedderKind;

/// Create the embedder requested by configuration.
///
/// An ONNX request that cannot be satisfied (feature disabled, model files
/// missing) degrades to `NoopEmbedder`, which turns semantic search off.
pub fn create_embedder(
    kind: EmbedderKind,
    model_dir: &Path,
    dim: usize,
) -> Arc<dyn EmbedderBackend> {
    match kind {
        EmbedderKind::Hash => {
            tracing::info!("Using hash embedder (dim={})", dim);
            Arc::new(HashEmbedder::new(dim))
        }
        EmbedderKind::None => {
            tracing::info!("Embedder disabled. Semantic search is off.");
            Arc::new(NoopEmbedder::new(dim))
        }
        EmbedderKind::Onnx => create_onnx(model_dir, dim),
    }
}

#[cfg(feature = "onnx")]
fn create_onnx(model_dir: &Path, dim: usize) -> Arc<dyn EmbedderBackend> {
    match OnnxEmbedder::load(model_dir) {
        Ok(embedder) => {
            tracing::info!("Using ONNX embedder (dim={})", embedder.dimension());
            Arc::new(embedder)
        }
        Err(e) => {
            tracing::warn!("ONNX embedder unavailable: {}. Semantic search is off.", e);
            Arc::new(NoopEmbedder::new(dim))
        }
    }
}

#[cfg(not(feature = "onnx"))]
fn create_onnx(model_dir: &Path, dim: usize) -> Arc<dyn EmbedderBackend> {
    tracing::warn!(
        "ONNX feature disabled, ignoring models in {}. Semantic search is off.",
        model_dir.display()
    );
    Arc::new(NoopEmbedder::new(dim))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_embedder_kinds() {
        let dir = Path::new("/nonexistent");
        assert!(create_embedder(EmbedderKind::Hash, dir, 64).is_available());
        assert!(!create_embedder(EmbedderKind::None, dir, 64).is_available());
        // No model files: degrades instead of failing.
        let onnx = create_embedder(EmbedderKind::Onnx, dir, 384);
        assert!(!onnx.is_available());
        assert_eq!(onnx.dimension(), 384);
    }
}
