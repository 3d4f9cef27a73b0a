//! Uploaded document summaries.
//!
//! Short texts are summarised in one generator call. Longer ones are split
//! into overlapping sections, each section is summarised, and the section
//! summaries are condensed into the final executive summary. Without a
//! generator, or when generation fails, the opening sentences stand in.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use hrassist_chat::GuardedGenerator;
use hrassist_core::{Error, Result};

use crate::harvest::chunk_text;
use crate::prompts;

/// Target length of an executive summary.
pub const SUMMARY_WORDS: usize = 250;
/// Texts with fewer words are summarised in a single pass.
pub const SINGLE_PASS_WORDS: usize = 500;

const SECTION_CHARS: usize = 4000;
const SECTION_OVERLAP: usize = 400;
const MIN_SECTION_CHARS: usize = 50;
const SECTION_WORDS: usize = 120;
const MAX_KEYWORDS: usize = 10;

static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").expect("valid regex"));
static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+?\d[\d\-\s()x]{6,}\d").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static CAPITALISED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-z]+\b").expect("valid regex"));

const KEYWORD_STOPWORDS: &[&str] = &[
    "The", "This", "That", "With", "From", "Have", "Will", "Your", "They", "There", "These",
    "Those", "When", "Where", "Which", "What", "While", "Also", "Each", "Such", "Into", "Only",
    "Other", "Than", "Then", "Their", "Were", "Been", "Must", "Should", "Shall", "Page",
];

/// Document length bucket by character count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LengthClass {
    Short,
    Medium,
    Long,
}

impl LengthClass {
    /// Over 10 000 characters is long, over 1 000 medium.
    pub fn classify(text: &str) -> Self {
        match text.chars().count() {
            n if n > 10_000 => Self::Long,
            n if n > 1_000 => Self::Medium,
            _ => Self::Short,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub document_type: LengthClass,
    pub executive_summary: String,
    pub keywords: Vec<String>,
    pub word_count: usize,
    /// False when the summary is the extractive fallback.
    pub generated: bool,
}

/// Drop URLs and phone numbers and collapse whitespace.
pub fn sanitize(text: &str) -> String {
    let text = URL.replace_all(text, "");
    let text = PHONE.replace_all(&text, "");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Up to ten distinct capitalised words, in order of first appearance.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    CAPITALISED
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|w| w.len() > 3 && !KEYWORD_STOPWORDS.contains(w))
        .filter(|w| seen.insert(*w))
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}

/// Leading sentences of `text` up to `max_words` words.
fn extractive_summary(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return words.join(" ");
    }
    let head = words[..max_words].join(" ");
    match head.rfind(['.', '!', '?']) {
        Some(end) if end > head.len() / 2 => head[..=end].to_string(),
        _ => format!("{}...", head),
    }
}

/// Summarise extracted document text.
///
/// Fails only when nothing is left to summarise after cleaning.
pub async fn summarize(
    generator: Option<&GuardedGenerator>,
    text: &str,
    max_words: usize,
) -> Result<DocumentSummary> {
    let cleaned = sanitize(text);
    if cleaned.is_empty() {
        return Err(Error::Validation("No text content to summarize".into()));
    }
    let word_count = cleaned.split_whitespace().count();

    let generated = match generator {
        Some(generator) => generate_summary(generator, &cleaned, word_count, max_words).await,
        None => None,
    };
    let (executive_summary, generated) = match generated {
        Some(summary) => (summary, true),
        None => (extractive_summary(&cleaned, max_words), false),
    };

    Ok(DocumentSummary {
        document_type: LengthClass::classify(text),
        executive_summary,
        keywords: extract_keywords(text),
        word_count,
        generated,
    })
}

async fn generate_summary(
    generator: &GuardedGenerator,
    text: &str,
    word_count: usize,
    max_words: usize,
) -> Option<String> {
    if word_count < SINGLE_PASS_WORDS {
        return condense(generator, text, max_words).await;
    }

    let mut sections = Vec::new();
    for chunk in chunk_text(text, SECTION_CHARS, SECTION_OVERLAP) {
        if chunk.trim().chars().count() < MIN_SECTION_CHARS {
            continue;
        }
        if let Some(summary) = condense(generator, &chunk, SECTION_WORDS).await {
            sections.push(summary);
        }
    }
    debug!(sections = sections.len(), "section summaries");

    match sections.len() {
        0 => None,
        1 => sections.pop(),
        _ => condense(generator, &sections.join(" "), max_words).await,
    }
}

async fn condense(generator: &GuardedGenerator, text: &str, max_words: usize) -> Option<String> {
    match generator
        .try_generate(&prompts::summary_prompt(text, max_words))
        .await
    {
        Ok(summary) => {
            let summary = sanitize(&summary);
            (!summary.is_empty()).then_some(summary)
        }
        Err(e) => {
            warn!("Summary generation failed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use hrassist_chat::TextGenerator;

    #[test]
    fn test_length_classes() {
        assert_eq!(LengthClass::classify("short memo"), LengthClass::Short);
        assert_eq!(LengthClass::classify(&"a".repeat(1_000)), LengthClass::Short);
        assert_eq!(LengthClass::classify(&"a".repeat(1_001)), LengthClass::Medium);
        assert_eq!(LengthClass::classify(&"a".repeat(10_000)), LengthClass::Medium);
        assert_eq!(LengthClass::classify(&"a".repeat(10_001)), LengthClass::Long);
        assert_eq!(serde_json::to_value(LengthClass::Long).unwrap(), "LONG");
    }

    #[test]
    fn test_keywords_distinct_and_bounded() {
        let text = "The Travel Policy covers Travel within India. This applies to \
                    Managers and Employees. The Finance team approves Claims.";
        assert_eq!(
            extract_keywords(text),
            vec!["Travel", "Policy", "India", "Managers", "Employees", "Finance", "Claims"]
        );

        let many: String = (b'A'..=b'Z').map(|c| format!("{}bcde ", c as char)).collect();
        assert_eq!(extract_keywords(&many).len(), MAX_KEYWORDS);
    }

    #[test]
    fn test_sanitize_strips_links_and_numbers() {
        let cleaned = sanitize("Call +91 98765 43210 or see https://intranet/hr\n\n  for help.");
        assert_eq!(cleaned, "Call or see for help.");
    }

    #[test]
    fn test_extractive_summary_ends_on_sentence() {
        let text = "One two three. Four five six. Seven eight nine ten.";
        assert_eq!(extractive_summary(text, 7), "One two three. Four five six.");
        assert_eq!(extractive_summary("a b c", 10), "a b c");
        assert_eq!(extractive_summary("a b c d e", 3), "a b c...");
    }

    struct Summaries {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl TextGenerator for Summaries {
        async fn generate(&self, prompt: &str) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::Generation("quota exceeded".into()));
            }
            assert!(prompt.contains("words"));
            Ok(format!("Summary {}.", n + 1))
        }
        fn describe(&self) -> String {
            "summaries".into()
        }
    }

    fn guarded(fail: bool) -> (Arc<Summaries>, GuardedGenerator) {
        let inner = Arc::new(Summaries {
            calls: AtomicUsize::new(0),
            fail,
        });
        let guarded = GuardedGenerator::new(inner.clone(), "hr@example.com");
        (inner, guarded)
    }

    #[tokio::test]
    async fn test_short_text_single_pass() {
        let (inner, generator) = guarded(false);
        let summary = summarize(Some(&generator), "Leave must be approved by Managers.", 250)
            .await
            .unwrap();
        assert_eq!(summary.executive_summary, "Summary 1.");
        assert!(summary.generated);
        assert_eq!(summary.document_type, LengthClass::Short);
        assert_eq!(summary.keywords, vec!["Leave", "Managers"]);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_long_text_sections_then_condensed() {
        let (inner, generator) = guarded(false);
        let text = "Employees accrue leave monthly. ".repeat(400);
        let summary = summarize(Some(&generator), &text, 250).await.unwrap();
        assert_eq!(summary.document_type, LengthClass::Long);

        let sections = chunk_text(&sanitize(&text), SECTION_CHARS, SECTION_OVERLAP).len();
        assert!(sections > 1);
        assert_eq!(inner.calls.load(Ordering::SeqCst), sections + 1);
        assert_eq!(summary.executive_summary, format!("Summary {}.", sections + 1));
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_extract() {
        let (_, generator) = guarded(true);
        let summary = summarize(Some(&generator), "First point. Second point.", 250)
            .await
            .unwrap();
        assert!(!summary.generated);
        assert_eq!(summary.executive_summary, "First point. Second point.");

        let offline = summarize(None, "Only text.", 250).await.unwrap();
        assert!(!offline.generated);
    }

    #[tokio::test]
    async fn test_blank_text_rejected() {
        assert!(matches!(
            summarize(None, " \n https://example.com ", 250).await,
            Err(Error::Validation(_))
        ));
    }
}
