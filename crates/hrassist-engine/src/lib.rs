//! HR Assist Engine: answers chat messages.
//!
//! A message is checked, in order, for emptiness, pending document
//! details, document intents, conversational intents, and finally semantic
//! lookup against the QA dataset with threshold-gated fallback to a
//! generator.

pub mod documents;
pub mod engine;
pub mod harvest;
pub mod intent;
pub mod knowledge;
pub mod matcher;
pub mod prompts;
pub mod router;
pub mod sessions;
pub mod summarize;

pub use documents::{DocumentKind, DocumentRequest, DocumentRequestLog, RequestStatus};
pub use engine::{Answer, EngineHealth, QaEngine, Suggestion};
pub use harvest::{harvest, HarvestReport};
pub use knowledge::KnowledgeBase;
pub use matcher::{Match, SemanticIndex};
pub use router::{Route, RouteKind};
pub use sessions::{PendingDocumentRequest, PendingRequests};
pub use summarize::{summarize, DocumentSummary, LengthClass, SUMMARY_WORDS};
