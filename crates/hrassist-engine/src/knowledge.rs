//! The QA dataset paired with its question embeddings.

use std::sync::Arc;

use tracing::{error, info, warn};

use hrassist_infer::EmbedderBackend;
use hrassist_store::QaDataset;

use crate::matcher::SemanticIndex;

/// Dataset plus index, swapped as a unit on reload.
///
/// `index` is None when semantic search is disabled. When present it has
/// exactly one row per dataset pair.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    dataset: QaDataset,
    index: Option<Arc<SemanticIndex>>,
}

impl KnowledgeBase {
    /// Embed every question. CPU-bound; call from a blocking thread.
    pub fn build(dataset: QaDataset, embedder: &dyn EmbedderBackend) -> Self {
        if !embedder.is_available() {
            warn!("Embedder unavailable; semantic search disabled for {} pairs", dataset.len());
            return Self {
                dataset,
                index: None,
            };
        }

        let questions: Vec<&str> = dataset.questions().collect();
        let embeddings: Vec<_> = embedder
            .embed_batch(&questions)
            .into_iter()
            .flatten()
            .map(|r| r.embedding)
            .collect();

        if embeddings.len() != dataset.len() {
            error!(
                "Embedded {} of {} questions; clearing knowledge base",
                embeddings.len(),
                dataset.len()
            );
            return Self::empty_with_index(embedder.dimension());
        }

        match SemanticIndex::new(&embeddings, embedder.dimension()) {
            Ok(index) => {
                info!(
                    "Knowledge base ready: {} pairs indexed with {}",
                    index.len(),
                    embedder.name()
                );
                Self {
                    dataset,
                    index: Some(Arc::new(index)),
                }
            }
            Err(e) => {
                error!("Failed to build index: {}; clearing knowledge base", e);
                Self::empty_with_index(embedder.dimension())
            }
        }
    }

    fn empty_with_index(dim: usize) -> Self {
        Self {
            dataset: QaDataset::default(),
            index: SemanticIndex::new(&[], dim).ok().map(Arc::new),
        }
    }

    /// Same index, edited dataset. Only valid when questions are unchanged.
    pub fn with_dataset(&self, dataset: QaDataset) -> Self {
        debug_assert_eq!(dataset.len(), self.dataset.len());
        Self {
            dataset,
            index: self.index.clone(),
        }
    }

    pub fn dataset(&self) -> &QaDataset {
        &self.dataset
    }

    pub fn index(&self) -> Option<&SemanticIndex> {
        self.index.as_deref()
    }

    pub fn semantic_enabled(&self) -> bool {
        self.index.is_some()
    }

    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrassist_infer::{EmbeddingResult, HashEmbedder, NoopEmbedder};
    use hrassist_store::QaPair;
    use ndarray::Array1;

    fn dataset() -> QaDataset {
        QaDataset::new(vec![
            QaPair::new("How many annual leave days?", "Twenty."),
            QaPair::new("How do I reset my password?", "Use the IT portal."),
        ])
    }

    /// Fails on any question mentioning passwords.
    struct Picky;

    impl EmbedderBackend for Picky {
        fn embed(&self, text: &str) -> Option<EmbeddingResult> {
            (!text.contains("password")).then(|| EmbeddingResult {
                embedding: Array1::ones(4),
                cached: false,
            })
        }
        fn dimension(&self) -> usize {
            4
        }
        fn is_available(&self) -> bool {
            true
        }
        fn name(&self) -> &'static str {
            "picky"
        }
    }

    #[test]
    fn test_build_indexes_every_pair() {
        let kb = KnowledgeBase::build(dataset(), &HashEmbedder::new(64));
        assert_eq!(kb.index().unwrap().len(), kb.len());
        assert_eq!(kb.len(), 2);
    }

    #[test]
    fn test_unavailable_embedder_keeps_dataset() {
        let kb = KnowledgeBase::build(dataset(), &NoopEmbedder::new(64));
        assert!(!kb.semantic_enabled());
        assert_eq!(kb.len(), 2);
    }

    #[test]
    fn test_count_mismatch_clears() {
        let kb = KnowledgeBase::build(dataset(), &Picky);
        assert!(kb.is_empty());
        assert!(kb.index().unwrap().is_empty());
    }
}
