//! The `TextGenerator` seam and its apology-on-failure wrapper.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use hrassist_core::Result;

/// Anything that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Label for logs and health output, e.g. `gemini/gemini-2.0-flash`.
    fn describe(&self) -> String;
}

/// Wraps a generator so that callers never see an error.
///
/// Failures are logged and replaced by a fixed apology. There is no retry.
#[derive(Clone)]
pub struct GuardedGenerator {
    inner: Arc<dyn TextGenerator>,
    apology: String,
}

impl GuardedGenerator {
    pub fn new(inner: Arc<dyn TextGenerator>, hr_email: &str) -> Self {
        Self {
            inner,
            apology: apology_text(hr_email),
        }
    }

    pub async fn generate(&self, prompt: &str) -> String {
        match self.inner.generate(prompt).await {
            Ok(text) => {
                debug!(generator = %self.inner.describe(), chars = text.len(), "generated");
                text
            }
            Err(e) => {
                error!(generator = %self.inner.describe(), "generation failed: {}", e);
                self.apology.clone()
            }
        }
    }

    /// Pass-through that keeps the error, for batch jobs that skip failures.
    pub async fn try_generate(&self, prompt: &str) -> Result<String> {
        self.inner.generate(prompt).await
    }

    pub fn apology(&self) -> &str {
        &self.apology
    }

    pub fn describe(&self) -> String {
        self.inner.describe()
    }
}

pub fn apology_text(hr_email: &str) -> String {
    format!(
        "I apologize, but I'm experiencing technical difficulties right now. \
         Please try again in a moment or contact HR at {} for assistance.",
        hr_email
    )
}
