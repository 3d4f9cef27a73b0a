//! LLM configuration loading and provider selection.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::types::{LLMConfigResponse, LLMProvider, ResolvedProvider};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-20241022";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// LLM configuration read from `llm-config.json`, with environment fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    #[serde(default = "default_preferred")]
    pub preferred_provider: String,
    #[serde(default, skip_serializing)]
    pub gemini_api_key: Option<String>,
    #[serde(default, skip_serializing)]
    pub openai_api_key: Option<String>,
    #[serde(default, skip_serializing)]
    pub anthropic_api_key: Option<String>,
    #[serde(default, skip_serializing)]
    pub groq_api_key: Option<String>,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,
    #[serde(default = "default_groq_model")]
    pub groq_model: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(skip)]
    pub config_path: PathBuf,
}

fn default_preferred() -> String {
    "auto".into()
}
fn default_gemini_model() -> String {
    DEFAULT_GEMINI_MODEL.into()
}
fn default_openai_model() -> String {
    DEFAULT_OPENAI_MODEL.into()
}
fn default_anthropic_model() -> String {
    DEFAULT_ANTHROPIC_MODEL.into()
}
fn default_groq_model() -> String {
    DEFAULT_GROQ_MODEL.into()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            preferred_provider: default_preferred(),
            gemini_api_key: None,
            openai_api_key: None,
            anthropic_api_key: None,
            groq_api_key: None,
            gemini_model: default_gemini_model(),
            openai_model: default_openai_model(),
            anthropic_model: default_anthropic_model(),
            groq_model: default_groq_model(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            config_path: PathBuf::new(),
        }
    }
}

impl LLMConfig {
    /// Load config from file, falling back to env vars and defaults.
    pub fn load(config_path: &Path) -> Self {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    /// Like [`LLMConfig::load`], reading variables through `lookup`.
    pub fn load_with<F>(config_path: &Path, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: LLMConfig = match std::fs::read_to_string(config_path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Ignoring malformed {}: {}", config_path.display(), e);
                LLMConfig::default()
            }),
            Err(_) => LLMConfig::default(),
        };
        config.config_path = config_path.to_path_buf();

        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if config.gemini_api_key.is_none() {
            config.gemini_api_key = env("GOOGLE_GEMINI_API_KEY").or_else(|| env("GEMINI_API_KEY"));
        }
        if config.openai_api_key.is_none() {
            config.openai_api_key = env("OPENAI_API_KEY");
        }
        if config.anthropic_api_key.is_none() {
            config.anthropic_api_key = env("ANTHROPIC_API_KEY");
        }
        if config.groq_api_key.is_none() {
            config.groq_api_key = env("GROQ_API_KEY");
        }
        if let Some(provider) = env("LLM_PROVIDER") {
            config.preferred_provider = provider.trim().to_ascii_lowercase();
        }
        if let Some(raw) = env("LLM_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout_secs = secs,
                _ => warn!("Ignoring LLM_TIMEOUT_SECS={:?}", raw),
            }
        }

        match config.resolve_provider() {
            Some(resolved) => info!("LLM provider: {} ({})", resolved.provider, resolved.model),
            None => info!("No LLM provider configured; generation disabled"),
        }
        config
    }

    /// Resolve which provider and model to use.
    pub fn resolve_provider(&self) -> Option<ResolvedProvider> {
        let pick = |provider: LLMProvider| -> Option<ResolvedProvider> {
            let (key, model) = match provider {
                LLMProvider::Gemini => (&self.gemini_api_key, &self.gemini_model),
                LLMProvider::OpenAI => (&self.openai_api_key, &self.openai_model),
                LLMProvider::Anthropic => (&self.anthropic_api_key, &self.anthropic_model),
                LLMProvider::Groq => (&self.groq_api_key, &self.groq_model),
            };
            key.as_ref().map(|k| ResolvedProvider {
                provider,
                model: model.clone(),
                api_key: k.clone(),
            })
        };

        match self.preferred_provider.as_str() {
            "gemini" => pick(LLMProvider::Gemini),
            "openai" => pick(LLMProvider::OpenAI),
            "anthropic" => pick(LLMProvider::Anthropic),
            "groq" => pick(LLMProvider::Groq),
            // Auto mode: Gemini > Anthropic > Groq > OpenAI
            "auto" => pick(LLMProvider::Gemini)
                .or_else(|| pick(LLMProvider::Anthropic))
                .or_else(|| pick(LLMProvider::Groq))
                .or_else(|| pick(LLMProvider::OpenAI)),
            _ => None,
        }
    }

    /// Build the public config response (no API keys exposed).
    pub fn to_response(&self) -> LLMConfigResponse {
        let resolved = self.resolve_provider();
        LLMConfigResponse {
            preferred_provider: self.preferred_provider.clone(),
            gemini_configured: self.gemini_api_key.is_some(),
            openai_configured: self.openai_api_key.is_some(),
            anthropic_configured: self.anthropic_api_key.is_some(),
            groq_configured: self.groq_api_key.is_some(),
            active_provider: resolved.as_ref().map(|r| r.provider.to_string()),
            active_model: resolved.map(|r| r.model),
            timeout_secs: self.timeout_secs,
        }
    }
}
