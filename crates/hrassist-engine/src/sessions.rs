//! Per-session pending document selections.
//!
//! A user picks a document number, then sends details in a later message.
//! The choice is remembered per session id so concurrent users never see
//! each other's selection.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;

const MAX_TTL_MINUTES: u64 = 60 * 24 * 365;

/// Document chosen by a session, awaiting details.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingDocumentRequest {
    pub doc_type: String,
    pub doc_name: String,
    pub created_at: DateTime<Utc>,
}

/// Pending selections with a size cap and a TTL.
pub struct PendingRequests {
    sessions: RwLock<HashMap<String, PendingDocumentRequest>>,
    max_sessions: usize,
    ttl: Duration,
}

impl PendingRequests {
    pub fn new(max_sessions: usize, ttl_minutes: u64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions: max_sessions.max(1),
            ttl: Duration::minutes(ttl_minutes.min(MAX_TTL_MINUTES) as i64),
        }
    }

    fn expired(&self, pending: &PendingDocumentRequest, now: DateTime<Utc>) -> bool {
        now - pending.created_at >= self.ttl
    }

    /// Remember `doc_type` for `session_id`, replacing any earlier choice.
    pub fn set(&self, session_id: &str, doc_type: String, doc_name: String) {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        sessions.retain(|_, p| !self.expired(p, now));

        // Evict the oldest selection when full
        if !sessions.contains_key(session_id) && sessions.len() >= self.max_sessions {
            if let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, p)| p.created_at)
                .map(|(id, _)| id.clone())
            {
                debug!("Evicting pending document request for session {}", oldest);
                sessions.remove(&oldest);
            }
        }

        sessions.insert(
            session_id.to_string(),
            PendingDocumentRequest {
                doc_type,
                doc_name,
                created_at: now,
            },
        );
    }

    /// Current selection, if any and not expired.
    pub fn get(&self, session_id: &str) -> Option<PendingDocumentRequest> {
        let now = Utc::now();
        self.sessions
            .read()
            .get(session_id)
            .filter(|p| !self.expired(p, now))
            .cloned()
    }

    /// Remove and return the selection.
    pub fn clear(&self, session_id: &str) -> Option<PendingDocumentRequest> {
        self.sessions.write().remove(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PendingRequests {
    fn default() -> Self {
        Self::new(1000, 30)
    }
}
