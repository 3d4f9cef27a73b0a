//! Record types for the QA dataset file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use hrassist_core::Error;

fn is_false(b: &bool) -> bool {
    !*b
}

/// One curated or generated question/answer pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Produced by harvesting rather than written by a person.
    #[serde(default, skip_serializing_if = "is_false")]
    pub generated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub needs_review: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl QaPair {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            source: None,
            generated: false,
            timestamp: None,
            needs_review: false,
            feedback: None,
            last_updated: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Mark as harvested, stamped with the current time.
    pub fn harvested(mut self) -> Self {
        self.generated = true;
        self.timestamp = Some(chrono::Utc::now().to_rfc3339());
        self
    }

    pub fn source_or_unknown(&self) -> &str {
        self.source.as_deref().unwrap_or("Unknown")
    }
}

/// User verdict on an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Correct,
    Incorrect,
    Improve,
}

impl FromStr for FeedbackKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_ascii_lowercase().as_str() {
            "correct" => Ok(Self::Correct),
            "incorrect" => Ok(Self::Incorrect),
            "improve" => Ok(Self::Improve),
            other => Err(Error::Validation(format!(
                "feedback_type must be correct, incorrect or improve (got {:?})",
                other
            ))),
        }
    }
}

impl FeedbackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
            Self::Improve => "improve",
        }
    }
}

/// Dataset summary for the statistics endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetStats {
    pub total_qa_pairs: usize,
    pub generated_qa_pairs: usize,
    pub manual_qa_pairs: usize,
    pub needs_review: usize,
    pub sources: BTreeMap<String, usize>,
    pub last_updated: String,
}
