//! ONNX sentence embedder for all-MiniLM-L6-v2.
//!
//! Loads a SentenceTransformers ONNX export and its tokenizer to produce
//! 384-dimensional, L2-normalised embeddings. Requires the `onnx` feature.

use ndarray::Array1;

/// Mean-pool token embeddings laid out as `[seq_len][dim]`, weighting each
/// token by its attention mask. Returns None when every token is masked.
pub fn mean_pool(
    token_embeddings: &[f32],
    attention_mask: &[u32],
    dim: usize,
) -> Option<Array1<f32>> {
    let mask_sum: f32 = attention_mask.iter().map(|&m| m as f32).sum();
    if mask_sum < 1e-9 || dim == 0 {
        return None;
    }

    let mut pooled = Array1::<f32>::zeros(dim);
    for (row, &m) in token_embeddings.chunks_exact(dim).zip(attention_mask) {
        if m > 0 {
            let weight = m as f32;
            for (acc, &x) in pooled.iter_mut().zip(row) {
                *acc += x * weight;
            }
        }
    }
    Some(pooled / mask_sum)
}

#[cfg(feature = "onnx")]
mod inner {
    use std::path::Path;

    use ndarray::Array1;
    use ort::session::Session;
    use ort::value::Tensor;
    use parking_lot::Mutex;
    use tokenizers::Tokenizer;
    use tracing::{debug, info, warn};

    use hrassist_core::{Error, Result};

    use super::mean_pool;
    use crate::cache::{CacheStats, EmbeddingCache};
    use crate::embedder::{l2_normalize, EmbedderBackend, EmbeddingResult};

    /// all-MiniLM-L6-v2 was trained on sequences of at most 256 word pieces.
    const MAX_SEQ_LEN: usize = 256;

    const DEFAULT_DIM: usize = 384;

    pub struct OnnxEmbedder {
        session: Mutex<Session>,
        tokenizer: Tokenizer,
        cache: EmbeddingCache,
        dimension: usize,
    }

    impl OnnxEmbedder {
        /// Load `model.onnx` and `tokenizer.json` from `model_dir`.
        pub fn load(model_dir: &Path) -> Result<Self> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");

            for path in [&model_path, &tokenizer_path] {
                if !path.exists() {
                    return Err(Error::Inference(format!("missing {}", path.display())));
                }
            }

            // With load-dynamic, ORT_DYLIB_PATH must point to libonnxruntime.
            ort::init().commit();

            let session = Session::builder()
                .map_err(|e| Error::Inference(format!("session builder: {}", e)))?
                .with_intra_threads(2)
                .map_err(|e| Error::Inference(format!("session threads: {}", e)))?
                .commit_from_file(&model_path)
                .map_err(|e| Error::Inference(format!("failed to load ONNX model: {}", e)))?;

            let tokenizer = Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| Error::Inference(format!("failed to load tokenizer: {}", e)))?;

            info!(model = %model_path.display(), dim = DEFAULT_DIM, "ONNX embedder loaded");

            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
                cache: EmbeddingCache::default(),
                dimension: DEFAULT_DIM,
            })
        }

        fn infer(&self, text: &str) -> Result<Array1<f32>> {
            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| Error::Inference(format!("tokenization failed: {}", e)))?;

            let seq_len = encoding.get_ids().len().min(MAX_SEQ_LEN);
            let ids = &encoding.get_ids()[..seq_len];
            let mask = &encoding.get_attention_mask()[..seq_len];

            let to_tensor = |data: Vec<i64>| {
                Tensor::from_array(([1usize, seq_len], data))
                    .map_err(|e| Error::Inference(format!("tensor build failed: {}", e)))
            };
            let ids_tensor = to_tensor(ids.iter().map(|&x| i64::from(x)).collect())?;
            let mask_tensor = to_tensor(mask.iter().map(|&x| i64::from(x)).collect())?;
            let type_tensor = to_tensor(vec![0i64; seq_len])?;

            let mut session = self.session.lock();
            let outputs = session
                .run(ort::inputs![ids_tensor, mask_tensor, type_tensor])
                .map_err(|e| Error::Inference(format!("inference failed: {}", e)))?;

            let (shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| Error::Inference(format!("bad output tensor: {}", e)))?;
            let dims: Vec<i64> = shape.iter().copied().collect();

            // Exports emit token embeddings [1, seq, dim] or a pooled [1, dim].
            let mut embedding = match dims.as_slice() {
                [1, _, dim] => mean_pool(data, mask, *dim as usize)
                    .ok_or_else(|| Error::Inference("empty attention mask".into()))?,
                [1, dim] => Array1::from_vec(data[..*dim as usize].to_vec()),
                other => {
                    return Err(Error::Inference(format!("unexpected output shape {:?}", other)))
                }
            };
            l2_normalize(&mut embedding);
            Ok(embedding)
        }
    }

    impl EmbedderBackend for OnnxEmbedder {
        fn embed(&self, text: &str) -> Option<EmbeddingResult> {
            if let Some(embedding) = self.cache.get(text) {
                return Some(EmbeddingResult {
                    embedding,
                    cached: true,
                });
            }

            match self.infer(text) {
                Ok(embedding) => {
                    self.cache.insert(text, embedding.clone());
                    Some(EmbeddingResult {
                        embedding,
                        cached: false,
                    })
                }
                Err(e) => {
                    warn!("{}", e);
                    None
                }
            }
        }

        fn embed_batch(&self, texts: &[&str]) -> Vec<Option<EmbeddingResult>> {
            debug!(count = texts.len(), "embedding batch");
            texts.iter().map(|t| self.embed(t)).collect()
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn is_available(&self) -> bool {
            true
        }

        fn name(&self) -> &'static str {
            "onnx"
        }

        fn cache_stats(&self) -> Option<CacheStats> {
            Some(self.cache.stats())
        }
    }
}

#[cfg(feature = "onnx")]
pub use inner::OnnxEmbedder;
