//! Threshold-gated routing of a semantic match.

use serde::Serialize;

use hrassist_core::QaThresholds;

use crate::matcher::Match;

/// How a semantic lookup should be answered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Route {
    /// Return the stored answer verbatim.
    Exact(Match),
    /// Ask the generator, giving it the matched pair as context.
    GenerateWithContext(Match),
    /// Canned reply. Carries the best match, if any, for logging.
    StaticFallback(Option<Match>),
}

/// Decide the route for `best`. Stateless; the generator is only chosen
/// when one is configured.
pub fn route(best: Option<Match>, thresholds: &QaThresholds, generator_available: bool) -> Route {
    match best {
        Some(m) if m.score >= thresholds.exact => Route::Exact(m),
        Some(m) if m.score >= thresholds.generate && generator_available => {
            Route::GenerateWithContext(m)
        }
        other => Route::StaticFallback(other),
    }
}

/// Branch taken by the engine, reported to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    EmptyInput,
    DocumentList,
    DocumentForm,
    InvalidDocumentChoice,
    DocumentSubmitted,
    DocumentInvalidDetails,
    Greeting,
    Farewell,
    Help,
    Exact,
    GeneratedWithContext,
    GeneratedWithoutContext,
    StaticFallback,
}

impl RouteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyInput => "empty_input",
            Self::DocumentList => "document_list",
            Self::DocumentForm => "document_form",
            Self::InvalidDocumentChoice => "invalid_document_choice",
            Self::DocumentSubmitted => "document_submitted",
            Self::DocumentInvalidDetails => "document_invalid_details",
            Self::Greeting => "greeting",
            Self::Farewell => "farewell",
            Self::Help => "help",
            Self::Exact => "exact",
            Self::GeneratedWithContext => "generated_with_context",
            Self::GeneratedWithoutContext => "generated_without_context",
            Self::StaticFallback => "static_fallback",
        }
    }
}
