//! Cosine similarity over a row-normalised embedding matrix.

use ndarray::{Array1, Array2, ArrayView1};
use tracing::warn;

use hrassist_core::{Error, Result};
use hrassist_infer::l2_normalize;

/// Row index into the dataset and its cosine score in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub index: usize,
    pub score: f32,
}

/// Question embeddings, one unit-length row per QA pair.
#[derive(Debug, Clone)]
pub struct SemanticIndex {
    matrix: Array2<f32>,
}

impl SemanticIndex {
    /// Stack `rows` into a matrix and normalise each row.
    pub fn new(rows: &[Array1<f32>], dim: usize) -> Result<Self> {
        let mut matrix = Array2::<f32>::zeros((rows.len(), dim));
        for (i, row) in rows.iter().enumerate() {
            if row.len() != dim {
                return Err(Error::Inference(format!(
                    "embedding {} has dimension {}, expected {}",
                    i,
                    row.len(),
                    dim
                )));
            }
            let mut unit = row.clone();
            l2_normalize(&mut unit);
            matrix.row_mut(i).assign(&unit);
        }
        Ok(Self { matrix })
    }

    pub fn len(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.nrows() == 0
    }

    pub fn dimension(&self) -> usize {
        self.matrix.ncols()
    }

    fn scores(&self, query: ArrayView1<f32>) -> Option<Array1<f32>> {
        if self.is_empty() {
            return None;
        }
        if query.len() != self.dimension() {
            warn!(
                "query dimension {} does not match index dimension {}",
                query.len(),
                self.dimension()
            );
            return None;
        }
        let mut q = query.to_owned();
        l2_normalize(&mut q);
        Some(self.matrix.dot(&q).mapv(|s| s.clamp(-1.0, 1.0)))
    }

    /// Highest-scoring row. The first row wins exact ties.
    pub fn best(&self, query: ArrayView1<f32>) -> Option<Match> {
        let scores = self.scores(query)?;
        let mut best = Match {
            index: 0,
            score: scores[0],
        };
        for (index, &score) in scores.iter().enumerate().skip(1) {
            if score > best.score {
                best = Match { index, score };
            }
        }
        Some(best)
    }

    /// Up to `k` rows scoring at least `min_score`, best first, stable for ties.
    pub fn top_k(&self, query: ArrayView1<f32>, k: usize, min_score: f32) -> Vec<Match> {
        let Some(scores) = self.scores(query) else {
            return Vec::new();
        };
        let mut ranked: Vec<Match> = scores
            .iter()
            .enumerate()
            .filter(|(_, score)| **score >= min_score)
            .map(|(index, &score)| Match { index, score })
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(k);
        ranked
    }
}
