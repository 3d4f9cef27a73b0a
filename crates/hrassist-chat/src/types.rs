//! Provider identifiers and the public (key-free) config view.

use serde::{Deserialize, Serialize};

/// LLM provider identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LLMProvider {
    Gemini,
    OpenAI,
    Anthropic,
    Groq,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::Gemini => write!(f, "gemini"),
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::Groq => write!(f, "groq"),
        }
    }
}

/// Provider, model and key chosen for generation.
#[derive(Clone)]
pub struct ResolvedProvider {
    pub provider: LLMProvider,
    pub model: String,
    pub api_key: String,
}

impl std::fmt::Debug for ResolvedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedProvider")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &"***")
            .finish()
    }
}

/// LLM config as reported by health endpoints (keys masked).
#[derive(Debug, Clone, Serialize)]
pub struct LLMConfigResponse {
    pub preferred_provider: String,
    pub gemini_configured: bool,
    pub openai_configured: bool,
    pub anthropic_configured: bool,
    pub groq_configured: bool,
    pub active_provider: Option<String>,
    pub active_model: Option<String>,
    pub timeout_secs: u64,
}
