//! Text generation through hosted LLM APIs (Gemini/OpenAI/Anthropic/Groq).
//!
//! Each call is a single non-streaming request. `GuardedGenerator` turns any
//! failure into a fixed apology so callers always get a string back.

pub mod config;
pub mod generator;
pub mod providers;
pub mod types;

pub use config::LLMConfig;
pub use generator::{GuardedGenerator, TextGenerator};
pub use providers::HttpGenerator;
pub use types::*;
