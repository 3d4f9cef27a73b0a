//! Generate QA pairs from policy documents.
//!
//! Policy files are split into overlapping chunks, each chunk is sent to
//! the generator with a Question/Answer prompt, and the parsed pairs are
//! appended to the dataset before the knowledge base is rebuilt.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use hrassist_core::{DataPaths, Error, Result};
use hrassist_store::QaPair;

use crate::engine::QaEngine;
use crate::prompts;

pub const CHUNK_SIZE: usize = 1000;
pub const CHUNK_OVERLAP: usize = 200;
/// Chunks shorter than this carry too little text to ask about.
pub const MIN_CHUNK_CHARS: usize = 100;

const POLICY_EXTENSIONS: &[&str] = &["txt", "md"];

/// Outcome of one harvest run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HarvestReport {
    pub files_processed: usize,
    pub chunks_processed: usize,
    pub chunks_failed: usize,
    pub pairs_generated: usize,
    pub pairs_added: usize,
    pub total_pairs: usize,
}

/// Split `text` into windows of `size` characters, each starting
/// `size - overlap` characters after the previous one.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() || size == 0 {
        return Vec::new();
    }
    let step = if overlap < size { size - overlap } else { size };

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

enum Label<'a> {
    Question(&'a str),
    Answer(&'a str),
}

/// Recognise `Question:` / `Answer:` lines, tolerating list markers,
/// numbering, bold markup and the short `Q:` / `A:` forms.
fn label(line: &str) -> Option<Label<'_>> {
    let stripped = line
        .trim_start_matches(|c: char| c == '-' || c == '*' || c == '#' || c.is_whitespace())
        .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')')
        .trim_start();

    for (prefix, is_question) in [
        ("question:", true),
        ("q:", true),
        ("answer:", false),
        ("a:", false),
    ] {
        let Some(head) = stripped.get(..prefix.len()) else {
            continue;
        };
        if head.eq_ignore_ascii_case(prefix) {
            let rest = stripped[prefix.len()..].trim_start_matches('*').trim();
            return Some(if is_question {
                Label::Question(rest)
            } else {
                Label::Answer(rest)
            });
        }
    }
    None
}

/// Parse a generator response into pairs attributed to `source`.
///
/// Lines after an `Answer:` line belong to that answer until the next
/// question. Pairs missing either side are dropped.
pub fn parse_qa_response(text: &str, source: &str) -> Vec<QaPair> {
    let mut pairs = Vec::new();
    let mut question: Option<String> = None;
    let mut answer: Option<String> = None;

    let mut flush = |question: &mut Option<String>, answer: &mut Option<String>| {
        if let (Some(q), Some(a)) = (question.take(), answer.take()) {
            let (q, a) = (q.trim(), a.trim());
            if !q.is_empty() && !a.is_empty() {
                pairs.push(QaPair::new(q, a).with_source(source).harvested());
            }
        }
    };

    for line in text.lines() {
        match label(line) {
            Some(Label::Question(rest)) => {
                flush(&mut question, &mut answer);
                question = Some(rest.to_string());
            }
            Some(Label::Answer(rest)) if question.is_some() => {
                answer = Some(rest.to_string());
            }
            Some(Label::Answer(_)) => {}
            None => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if let Some(a) = answer.as_mut() {
                    if !a.is_empty() {
                        a.push('\n');
                    }
                    a.push_str(line);
                } else if let Some(q) = question.as_mut() {
                    q.push(' ');
                    q.push_str(line);
                }
            }
        }
    }
    flush(&mut question, &mut answer);
    pairs
}

/// Policy files in `dir`, sorted by name.
fn policy_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| POLICY_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        })
        .collect();
    files.sort();
    files
}

/// Harvest both policy directories into the engine's dataset.
pub async fn harvest(engine: &QaEngine, paths: &DataPaths) -> Result<HarvestReport> {
    let generator = engine
        .generator()
        .ok_or_else(|| Error::Config("no LLM provider configured".into()))?
        .clone();

    let mut report = HarvestReport::default();
    let mut harvested = Vec::new();

    let sources = [
        (&paths.hr_policies, "HR Policy"),
        (&paths.it_policies, "IT Policy"),
    ];
    for (dir, policy_type) in sources {
        for file in policy_files(dir) {
            let text = match tokio::fs::read_to_string(&file).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("Skipping {}: {}", file.display(), e);
                    continue;
                }
            };
            let stem = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let source = format!("{}: {}", policy_type, stem);
            report.files_processed += 1;

            for chunk in chunk_text(&text, CHUNK_SIZE, CHUNK_OVERLAP) {
                if chunk.trim().chars().count() < MIN_CHUNK_CHARS {
                    continue;
                }
                report.chunks_processed += 1;
                match generator.try_generate(&prompts::harvest_prompt(&chunk, &stem)).await {
                    Ok(response) => {
                        let pairs = parse_qa_response(&response, &source);
                        report.pairs_generated += pairs.len();
                        harvested.extend(pairs);
                    }
                    Err(e) => {
                        warn!("Generation failed for a chunk of {}: {}", source, e);
                        report.chunks_failed += 1;
                    }
                }
            }
        }
    }

    report.pairs_added = engine.append_pairs(harvested).await?;
    report.total_pairs = engine.knowledge().len();
    info!(
        files = report.files_processed,
        chunks = report.chunks_processed,
        failed = report.chunks_failed,
        added = report.pairs_added,
        "QA harvest finished"
    );
    Ok(report)
}
