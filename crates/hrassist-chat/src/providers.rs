//! Hosted LLM providers, one non-streaming request per prompt.
//!
//! OpenAI and Groq share the chat-completions format. Gemini and Anthropic
//! each have their own request and response shapes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use hrassist_core::{Error, Result};

use crate::config::LLMConfig;
use crate::generator::TextGenerator;
use crate::types::{LLMProvider, ResolvedProvider};

const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";

const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: usize = 1024;

/// Generator backed by a hosted provider's HTTP API.
pub struct HttpGenerator {
    client: Client,
    target: ResolvedProvider,
}

impl HttpGenerator {
    pub fn new(target: ResolvedProvider, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("HTTP client: {}", e)))?;
        Ok(Self { client, target })
    }

    /// Build from config. None when no provider has a key.
    pub fn from_config(config: &LLMConfig) -> Result<Option<Self>> {
        config
            .resolve_provider()
            .map(|target| Self::new(target, Duration::from_secs(config.timeout_secs)))
            .transpose()
    }

    fn request(&self, prompt: &str) -> reqwest::RequestBuilder {
        let ResolvedProvider {
            provider,
            model,
            api_key,
        } = &self.target;
        let body = request_body(*provider, model, prompt);

        match provider {
            LLMProvider::Gemini => self
                .client
                .post(format!("{}/{}:generateContent", GEMINI_BASE, model))
                .header("x-goog-api-key", api_key)
                .json(&body),
            LLMProvider::OpenAI | LLMProvider::Groq => {
                let url = if *provider == LLMProvider::Groq {
                    GROQ_URL
                } else {
                    OPENAI_URL
                };
                self.client
                    .post(url)
                    .header("Authorization", format!("Bearer {}", api_key))
                    .json(&body)
            }
            LLMProvider::Anthropic => self
                .client
                .post(ANTHROPIC_URL)
                .header("x-api-key", api_key)
                .header("anthropic-version", "2023-06-01")
                .json(&body),
        }
    }
}

#[async_trait]
impl TextGenerator for HttpGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!("Generating with {} model {}", self.target.provider, self.target.model);

        let response = self
            .request(prompt)
            .send()
            .await
            .map_err(|e| Error::Http(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Http(format!("API error {}: {}", status, truncate(&body, 300))));
        }

        let parsed: Value = response
            .json()
            .await
            .map_err(|e| Error::Generation(format!("response is not JSON: {}", e)))?;
        extract_text(self.target.provider, &parsed)
    }

    fn describe(&self) -> String {
        format!("{}/{}", self.target.provider, self.target.model)
    }
}

/// Request JSON for a single user prompt.
pub fn request_body(provider: LLMProvider, model: &str, prompt: &str) -> Value {
    match provider {
        LLMProvider::Gemini => json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "generationConfig": {"temperature": TEMPERATURE, "maxOutputTokens": MAX_TOKENS},
        }),
        LLMProvider::OpenAI | LLMProvider::Groq => json!({
            "model": model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        }),
        LLMProvider::Anthropic => json!({
            "model": model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        }),
    }
}

/// Pull the generated text out of a provider response. Blank text is an error.
pub fn extract_text(provider: LLMProvider, response: &Value) -> Result<String> {
    let text: String = match provider {
        LLMProvider::Gemini => response["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
            .unwrap_or_default(),
        LLMProvider::OpenAI | LLMProvider::Groq => response["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        LLMProvider::Anthropic => response["content"]
            .as_array()
            .map(|blocks| {
                blocks
                    .iter()
                    .filter(|b| b["type"] == "text")
                    .filter_map(|b| b["text"].as_str())
                    .collect()
            })
            .unwrap_or_default(),
    };

    let text = text.trim();
    if text.is_empty() {
        let reason = response["error"]["message"]
            .as_str()
            .or_else(|| response["promptFeedback"]["blockReason"].as_str())
            .unwrap_or("empty response");
        return Err(Error::Generation(format!("{}: {}", provider, reason)));
    }
    Ok(text.to_string())
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_gemini() {
        let resp = json!({
            "candidates": [{"content": {"parts": [{"text": "Leave is "}, {"text": "20 days.\n"}]}}]
        });
        assert_eq!(extract_text(LLMProvider::Gemini, &resp).unwrap(), "Leave is 20 days.");
    }

    #[test]
    fn test_extract_openai_compatible() {
        let resp = json!({"choices": [{"message": {"role": "assistant", "content": " Yes. "}}]});
        assert_eq!(extract_text(LLMProvider::Groq, &resp).unwrap(), "Yes.");
        assert_eq!(extract_text(LLMProvider::OpenAI, &resp).unwrap(), "Yes.");
    }

    #[test]
    fn test_extract_anthropic_skips_non_text_blocks() {
        let resp = json!({"content": [
            {"type": "thinking", "thinking": "..."},
            {"type": "text", "text": "Submit a ticket."}
        ]});
        assert_eq!(extract_text(LLMProvider::Anthropic, &resp).unwrap(), "Submit a ticket.");
    }

    #[test]
    fn test_blank_or_blocked_is_error() {
        let blocked = json!({"candidates": [], "promptFeedback": {"blockReason": "SAFETY"}});
        let err = extract_text(LLMProvider::Gemini, &blocked).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));

        let empty = json!({"choices": [{"message": {"content": "   "}}]});
        assert!(extract_text(LLMProvider::OpenAI, &empty).is_err());
    }

    #[test]
    fn test_request_bodies() {
        let gemini = request_body(LLMProvider::Gemini, "gemini-2.0-flash", "hi");
        assert_eq!(gemini["contents"][0]["parts"][0]["text"], "hi");
        assert!(gemini.get("model").is_none());

        let anthropic = request_body(LLMProvider::Anthropic, "claude", "hi");
        assert_eq!(anthropic["model"], "claude");
        assert_eq!(anthropic["max_tokens"], MAX_TOKENS);
    }

    #[test]
    fn test_from_config_without_keys() {
        assert!(HttpGenerator::from_config(&LLMConfig::default()).unwrap().is_none());
    }
}
