//! The QA engine: intent checks, semantic routing and dataset maintenance.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Timelike;
use ndarray::Array1;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use hrassist_chat::GuardedGenerator;
use hrassist_core::{AppConfig, CompanyProfile, Error, QaThresholds, Result};
use hrassist_infer::{CacheStats, EmbedderBackend};
use hrassist_store::{DatasetStats, FeedbackKind, QaDataset, QaPair};

use crate::documents::{self, DocumentRequestLog, CATALOGUE};
use crate::intent::{self, Conversational, DocumentChoice};
use crate::knowledge::KnowledgeBase;
use crate::matcher::Match;
use crate::prompts;
use crate::router::{route, Route, RouteKind};
use crate::sessions::{PendingDocumentRequest, PendingRequests};

/// Minimum similarity for a suggestion to be listed.
pub const SUGGESTION_MIN_SCORE: f32 = 0.3;

const MAX_PENDING_SESSIONS: usize = 10_000;

/// A reply plus how it was produced.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub route: RouteKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_question: Option<String>,
}

impl Answer {
    fn plain(text: impl Into<String>, route: RouteKind) -> Self {
        Self {
            text: text.into(),
            route,
            score: None,
            matched_question: None,
        }
    }

    fn matched(text: String, route: RouteKind, m: Match, question: &str) -> Self {
        Self {
            text,
            route,
            score: Some(m.score),
            matched_question: Some(question.to_string()),
        }
    }
}

/// A dataset pair similar to the query.
#[derive(Debug, Clone, Serialize)]
pub struct Suggestion {
    pub question: String,
    pub answer: String,
    pub similarity: f32,
    pub source: String,
}

/// Snapshot for health endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct EngineHealth {
    pub qa_pairs: usize,
    pub semantic_search: bool,
    pub embedder: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_cache: Option<CacheStats>,
    pub generator: Option<String>,
    pub exact_threshold: f32,
    pub generate_threshold: f32,
    pub pending_sessions: usize,
    pub document_requests: usize,
}

pub struct QaEngine {
    knowledge: RwLock<Arc<KnowledgeBase>>,
    embedder: Arc<dyn EmbedderBackend>,
    generator: Option<GuardedGenerator>,
    thresholds: QaThresholds,
    company: CompanyProfile,
    pending: PendingRequests,
    requests: DocumentRequestLog,
    dataset_path: PathBuf,
    /// Serialises dataset writes and rebuilds so edits are never lost.
    write_lock: tokio::sync::Mutex<()>,
}

impl QaEngine {
    /// Create an engine with an empty knowledge base. Call [`reload`] to
    /// load the dataset.
    ///
    /// [`reload`]: QaEngine::reload
    pub fn new(
        config: &AppConfig,
        embedder: Arc<dyn EmbedderBackend>,
        generator: Option<GuardedGenerator>,
    ) -> Self {
        Self {
            knowledge: RwLock::new(Arc::new(KnowledgeBase::default())),
            embedder,
            generator,
            thresholds: config.thresholds,
            company: config.company.clone(),
            pending: PendingRequests::new(MAX_PENDING_SESSIONS, config.session_ttl_minutes),
            requests: DocumentRequestLog::new(),
            dataset_path: config.data_paths.qa_dataset.clone(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Load the dataset from disk and rebuild the index off the async
    /// scheduler. The new knowledge base replaces the old one in one step.
    pub async fn reload(&self) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let path = self.dataset_path.clone();
        let embedder = self.embedder.clone();
        let knowledge = tokio::task::spawn_blocking(move || {
            KnowledgeBase::build(QaDataset::load(&path), embedder.as_ref())
        })
        .await
        .map_err(|e| Error::Internal(format!("reload task failed: {}", e)))?;
        Ok(self.install(knowledge))
    }

    fn install(&self, knowledge: KnowledgeBase) -> usize {
        let len = knowledge.len();
        info!(
            "Knowledge base swapped: {} pairs, semantic search {}",
            len,
            if knowledge.semantic_enabled() { "on" } else { "off" }
        );
        *self.knowledge.write() = Arc::new(knowledge);
        len
    }

    /// Current knowledge base. Cheap; holders keep a consistent snapshot
    /// across a concurrent reload.
    pub fn knowledge(&self) -> Arc<KnowledgeBase> {
        self.knowledge.read().clone()
    }

    /// Answer one chat message for `session_id`.
    pub async fn answer(&self, session_id: &str, query: &str) -> Answer {
        let query = query.trim();
        if query.is_empty() {
            return Answer::plain(prompts::EMPTY_INPUT_REPLY, RouteKind::EmptyInput);
        }
        let normalized = intent::normalize_query(query);

        // Details may mention "documents" themselves, so they go first.
        if let Some(pending) = self.pending.get(session_id) {
            if intent::has_detail_indicator(query) {
                return self.submit_pending(session_id, &pending, query);
            }
        }

        if intent::is_document_intent(&normalized) {
            debug!(session = session_id, "document intent");
            return Answer::plain(
                documents::catalogue_text(&self.company),
                RouteKind::DocumentList,
            );
        }

        match intent::parse_document_choice(query, CATALOGUE.len()) {
            Some(DocumentChoice::Valid(number)) => {
                if let Some(kind) = documents::find_kind(&number.to_string()) {
                    self.pending
                        .set(session_id, kind.doc_type(), kind.name.to_string());
                    return Answer::plain(documents::form_sentinel(kind), RouteKind::DocumentForm);
                }
            }
            Some(DocumentChoice::OutOfRange) => {
                return Answer::plain(
                    prompts::invalid_choice_reply(CATALOGUE.len()),
                    RouteKind::InvalidDocumentChoice,
                );
            }
            None => {}
        }

        if let Some(kind) = intent::detect_conversational(&normalized) {
            let hour = chrono::Local::now().hour();
            let route = match kind {
                Conversational::Greeting => RouteKind::Greeting,
                Conversational::Thanks | Conversational::Farewell => RouteKind::Farewell,
                Conversational::Help => RouteKind::Help,
            };
            return Answer::plain(intent::conversational_reply(kind, hour, &self.company), route);
        }

        self.semantic_answer(query).await
    }

    fn submit_pending(
        &self,
        session_id: &str,
        pending: &PendingDocumentRequest,
        details: &str,
    ) -> Answer {
        match self.requests.submit(&pending.doc_type, details, session_id) {
            Ok(request) => {
                self.pending.clear(session_id);
                Answer::plain(
                    documents::confirmation_text(&request, &self.company),
                    RouteKind::DocumentSubmitted,
                )
            }
            Err(Error::Validation(reason)) => Answer::plain(
                format!(
                    "{}. Please resend your details for **{}**.",
                    reason, pending.doc_name
                ),
                RouteKind::DocumentInvalidDetails,
            ),
            Err(e) => {
                error!("Document request failed: {}", e);
                Answer::plain(
                    format!(
                        "Sorry, your request could not be recorded. Please contact HR at {}.",
                        self.company.hr_email
                    ),
                    RouteKind::DocumentInvalidDetails,
                )
            }
        }
    }

    /// Embed the query on a blocking thread.
    async fn embed_query(&self, query: &str) -> Option<Array1<f32>> {
        let embedder = self.embedder.clone();
        let text = query.to_string();
        match tokio::task::spawn_blocking(move || embedder.embed(&text)).await {
            Ok(result) => result.map(|r| r.embedding),
            Err(e) => {
                error!("Embedding task failed: {}", e);
                None
            }
        }
    }

    /// Semantic lookup and threshold routing, skipping intent checks.
    async fn semantic_answer(&self, query: &str) -> Answer {
        let knowledge = self.knowledge();
        let Some(index) = knowledge.index() else {
            return self.answer_without_context(query).await;
        };

        let best = match self.embed_query(query).await {
            Some(embedding) => index.best(embedding.view()),
            None => {
                warn!("Query could not be embedded; using static fallback");
                None
            }
        };

        match route(best, &self.thresholds, self.generator.is_some()) {
            Route::Exact(m) => match knowledge.dataset().get(m.index) {
                Some(pair) => {
                    debug!(score = m.score, "exact match");
                    Answer::matched(pair.answer.clone(), RouteKind::Exact, m, &pair.question)
                }
                None => self.static_fallback(Some(m)),
            },
            Route::GenerateWithContext(m) => {
                match (knowledge.dataset().get(m.index), &self.generator) {
                    (Some(pair), Some(generator)) => {
                        debug!(score = m.score, "generating with context");
                        let prompt = prompts::contextual_prompt(query, pair, &self.company);
                        let text = generator.generate(&prompt).await;
                        Answer::matched(text, RouteKind::GeneratedWithContext, m, &pair.question)
                    }
                    _ => self.static_fallback(Some(m)),
                }
            }
            Route::StaticFallback(m) => self.static_fallback(m),
        }
    }

    async fn answer_without_context(&self, query: &str) -> Answer {
        match &self.generator {
            Some(generator) => {
                let text = generator
                    .generate(&prompts::open_prompt(query, &self.company))
                    .await;
                Answer::plain(text, RouteKind::GeneratedWithoutContext)
            }
            None => self.static_fallback(None),
        }
    }

    fn static_fallback(&self, best: Option<Match>) -> Answer {
        debug!(score = ?best.map(|m| m.score), "static fallback");
        Answer {
            text: prompts::static_fallback(&self.company),
            route: RouteKind::StaticFallback,
            score: best.map(|m| m.score),
            matched_question: None,
        }
    }

    /// Up to `k` pairs scoring at least [`SUGGESTION_MIN_SCORE`].
    pub async fn suggestions(&self, query: &str, k: usize) -> Vec<Suggestion> {
        let knowledge = self.knowledge();
        let Some(index) = knowledge.index() else {
            return Vec::new();
        };
        let Some(embedding) = self.embed_query(query).await else {
            return Vec::new();
        };
        index
            .top_k(embedding.view(), k, SUGGESTION_MIN_SCORE)
            .into_iter()
            .filter_map(|m| {
                knowledge.dataset().get(m.index).map(|pair| Suggestion {
                    question: pair.question.clone(),
                    answer: pair.answer.clone(),
                    similarity: m.score,
                    source: pair.source_or_unknown().to_string(),
                })
            })
            .collect()
    }

    /// Record feedback, persist the dataset and publish it. Questions do not
    /// change, so the existing index is kept.
    pub async fn apply_feedback(
        &self,
        question: &str,
        kind: FeedbackKind,
        suggested_answer: Option<&str>,
    ) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let current = self.knowledge();
        let mut dataset = current.dataset().clone();
        if !dataset.apply_feedback(question, kind, suggested_answer) {
            return Ok(false);
        }
        dataset.save(&self.dataset_path)?;
        info!(feedback = kind.as_str(), "Feedback recorded for {:?}", question);
        *self.knowledge.write() = Arc::new(current.with_dataset(dataset));
        Ok(true)
    }

    /// Append new pairs (duplicates skipped), save, then re-embed everything.
    /// Returns how many pairs were added.
    pub async fn append_pairs(&self, pairs: Vec<QaPair>) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let mut dataset = self.knowledge().dataset().clone();
        let mut added = 0;
        for pair in pairs {
            if dataset.push_unique(pair) {
                added += 1;
            }
        }
        if added == 0 {
            return Ok(0);
        }
        dataset.save(&self.dataset_path)?;

        let embedder = self.embedder.clone();
        let knowledge =
            tokio::task::spawn_blocking(move || KnowledgeBase::build(dataset, embedder.as_ref()))
                .await
                .map_err(|e| Error::Internal(format!("rebuild task failed: {}", e)))?;
        self.install(knowledge);
        Ok(added)
    }

    pub fn statistics(&self) -> DatasetStats {
        self.knowledge().dataset().statistics()
    }

    pub fn health(&self) -> EngineHealth {
        let knowledge = self.knowledge();
        EngineHealth {
            qa_pairs: knowledge.len(),
            semantic_search: knowledge.semantic_enabled(),
            embedder: self.embedder.name(),
            embedding_cache: self.embedder.cache_stats(),
            generator: self.generator.as_ref().map(GuardedGenerator::describe),
            exact_threshold: self.thresholds.exact,
            generate_threshold: self.thresholds.generate,
            pending_sessions: self.pending.len(),
            document_requests: self.requests.total(),
        }
    }

    pub fn requests(&self) -> &DocumentRequestLog {
        &self.requests
    }

    pub fn pending(&self) -> &PendingRequests {
        &self.pending
    }

    pub fn generator(&self) -> Option<&GuardedGenerator> {
        self.generator.as_ref()
    }

    pub fn company(&self) -> &CompanyProfile {
        &self.company
    }

    pub fn thresholds(&self) -> &QaThresholds {
        &self.thresholds
    }

    pub fn dataset_path(&self) -> &Path {
        &self.dataset_path
    }
}
