//! Loading, saving and editing the QA dataset file.
//!
//! The file is a JSON array of [`QaPair`] objects. Runtime loading is
//! lenient: an unreadable file yields an empty dataset and invalid entries
//! are dropped with a log line. [`QaDataset::load_strict`] rejects instead.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use hrassist_core::{Error, Result};

use crate::types::{DatasetStats, FeedbackKind, QaPair};

/// In-memory QA dataset, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QaDataset {
    pairs: Vec<QaPair>,
}

impl QaDataset {
    pub fn new(pairs: Vec<QaPair>) -> Self {
        Self { pairs }
    }

    /// Load leniently. Never fails; problems are logged.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("QA dataset {} unreadable: {}. Starting empty.", path.display(), e);
                return Self::default();
            }
        };

        let entries = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) => {
                error!("QA dataset {} is not a JSON array. Starting empty.", path.display());
                return Self::default();
            }
            Err(e) => {
                error!("QA dataset {} is malformed: {}. Starting empty.", path.display(), e);
                return Self::default();
            }
        };

        let total = entries.len();
        let pairs: Vec<QaPair> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(i, entry)| match parse_entry(entry) {
                Ok(pair) => Some(pair),
                Err(reason) => {
                    warn!("Dropping QA entry {}: {}", i, reason);
                    None
                }
            })
            .collect();

        info!(
            "Loaded {} QA pairs from {} ({} dropped)",
            pairs.len(),
            path.display(),
            total - pairs.len()
        );
        Self { pairs }
    }

    /// Load, failing on the first invalid entry.
    pub fn load_strict(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let entries = match serde_json::from_str::<Value>(&raw)? {
            Value::Array(entries) => entries,
            _ => return Err(Error::Dataset("root is not a JSON array".into())),
        };

        let pairs = entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| {
                parse_entry(entry)
                    .map_err(|reason| Error::Dataset(format!("entry {}: {}", i, reason)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { pairs })
    }

    /// Write as a pretty JSON array, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.pairs)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        debug!("Saved {} QA pairs to {}", self.pairs.len(), path.display());
        Ok(())
    }

    pub fn pairs(&self) -> &[QaPair] {
        &self.pairs
    }

    pub fn get(&self, index: usize) -> Option<&QaPair> {
        self.pairs.get(index)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn questions(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|p| p.question.as_str())
    }

    /// Case-insensitive, whitespace-trimmed question lookup.
    pub fn contains_question(&self, question: &str) -> bool {
        self.find(question).is_some()
    }

    fn find(&self, question: &str) -> Option<usize> {
        let needle = question.trim().to_lowercase();
        self.pairs
            .iter()
            .position(|p| p.question.trim().to_lowercase() == needle)
    }

    /// Append a pair unless its question is already present.
    pub fn push_unique(&mut self, pair: QaPair) -> bool {
        if self.contains_question(&pair.question) {
            return false;
        }
        self.pairs.push(pair);
        true
    }

    /// Apply user feedback to the first pair whose question matches.
    /// Returns false when no pair matched.
    pub fn apply_feedback(
        &mut self,
        question: &str,
        kind: FeedbackKind,
        suggested_answer: Option<&str>,
    ) -> bool {
        let Some(index) = self.find(question) else {
            return false;
        };
        let pair = &mut self.pairs[index];
        match kind {
            FeedbackKind::Incorrect => {
                pair.needs_review = true;
                pair.feedback = Some(kind.as_str().to_string());
            }
            FeedbackKind::Improve => {
                if let Some(answer) = suggested_answer.map(str::trim).filter(|a| !a.is_empty()) {
                    pair.answer = answer.to_string();
                    pair.last_updated = Some(chrono::Utc::now().to_rfc3339());
                }
            }
            FeedbackKind::Correct => {
                pair.feedback = Some(kind.as_str().to_string());
            }
        }
        true
    }

    pub fn statistics(&self) -> DatasetStats {
        let generated = self.pairs.iter().filter(|p| p.generated).count();
        let mut sources = BTreeMap::new();
        for pair in &self.pairs {
            *sources.entry(pair.source_or_unknown().to_string()).or_insert(0) += 1;
        }
        DatasetStats {
            total_qa_pairs: self.pairs.len(),
            generated_qa_pairs: generated,
            manual_qa_pairs: self.pairs.len() - generated,
            needs_review: self.pairs.iter().filter(|p| p.needs_review).count(),
            sources,
            last_updated: chrono::Utc::now().to_rfc3339(),
        }
    }
}

fn parse_entry(entry: Value) -> std::result::Result<QaPair, String> {
    let Value::Object(map) = &entry else {
        return Err("not an object".into());
    };
    for field in ["question", "answer"] {
        match map.get(field) {
            Some(Value::String(s)) if !s.trim().is_empty() => {}
            Some(Value::String(_)) => return Err(format!("blank {}", field)),
            Some(_) => return Err(format!("{} is not a string", field)),
            None => return Err(format!("missing {}", field)),
        }
    }

    let mut pair: QaPair = serde_json::from_value(entry).map_err(|e| e.to_string())?;
    pair.question = pair.question.trim().to_string();
    pair.answer = pair.answer.trim().to_string();
    Ok(pair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const MIXED: &str = r#"[
        {"question": " What is the notice period? ", "answer": "Thirty days.", "source": "HR Policy: exit"},
        {"question": "Who approves leave?", "answer": ""},
        "not an object",
        {"answer": "orphan"},
        {"question": "VPN access?", "answer": "Raise an IT ticket.", "generated": true, "timestamp": "2024-05-01T10:00:00Z"}
    ]"#;

    #[test]
    fn test_lenient_load_drops_invalid() {
        let file = write_file(MIXED);
        let ds = QaDataset::load(file.path());
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.pairs()[0].question, "What is the notice period?");
        assert!(ds.pairs()[1].generated);
    }

    #[test]
    fn test_strict_load_names_entry() {
        let file = write_file(MIXED);
        let err = QaDataset::load_strict(file.path()).unwrap_err();
        assert!(err.to_string().contains("entry 1"), "{}", err);
    }

    #[test]
    fn test_unreadable_inputs_yield_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(QaDataset::load(&dir.path().join("missing.json")).is_empty());
        assert!(QaDataset::load(write_file("{not json").path()).is_empty());
        assert!(QaDataset::load(write_file(r#"{"question": "q"}"#).path()).is_empty());
    }

    #[test]
    fn test_save_then_load_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("qa.json");
        let mut pair = QaPair::new("Can I work from home?", "Up to two days a week.")
            .with_source("HR Policy: remote work")
            .harvested();
        pair.needs_review = true;
        pair.feedback = Some("incorrect".into());
        let ds = QaDataset::new(vec![pair, QaPair::new("Dress code?", "Business casual.")]);

        ds.save(&path).unwrap();
        assert_eq!(QaDataset::load(&path), ds);
        assert_eq!(QaDataset::load_strict(&path).unwrap(), ds);

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw[1].get("source").is_none());
    }

    #[test]
    fn test_feedback() {
        let mut ds = QaDataset::new(vec![QaPair::new("Dress code?", "Formal.")]);

        assert!(ds.apply_feedback("  DRESS CODE? ", FeedbackKind::Incorrect, None));
        assert!(ds.pairs()[0].needs_review);
        assert_eq!(ds.pairs()[0].feedback.as_deref(), Some("incorrect"));

        assert!(ds.apply_feedback("dress code?", FeedbackKind::Improve, Some("Business casual.")));
        assert_eq!(ds.pairs()[0].answer, "Business casual.");
        assert!(ds.pairs()[0].last_updated.is_some());

        // Blank suggestion leaves the answer alone.
        assert!(ds.apply_feedback("dress code?", FeedbackKind::Improve, Some("  ")));
        assert_eq!(ds.pairs()[0].answer, "Business casual.");

        assert!(!ds.apply_feedback("parking?", FeedbackKind::Correct, None));
    }

    #[test]
    fn test_statistics_and_dedupe() {
        let mut ds = QaDataset::default();
        assert!(ds.push_unique(QaPair::new("A?", "a").with_source("HR Policy: leave").harvested()));
        assert!(ds.push_unique(QaPair::new("B?", "b")));
        assert!(!ds.push_unique(QaPair::new("a?", "dup")));

        let stats = ds.statistics();
        assert_eq!(stats.total_qa_pairs, 2);
        assert_eq!(stats.generated_qa_pairs, 1);
        assert_eq!(stats.manual_qa_pairs, 1);
        assert_eq!(stats.sources.get("Unknown"), Some(&1));
        assert_eq!(stats.sources.get("HR Policy: leave"), Some(&1));
    }
}
