//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Default similarity at or above which a dataset answer is returned verbatim.
pub const DEFAULT_EXACT_THRESHOLD: f32 = 0.6;
/// Default similarity floor for asking the generator with dataset context.
pub const DEFAULT_GENERATE_THRESHOLD: f32 = 0.4;

/// Paths to all HR Assist data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Curated question/answer dataset (`data/qa_dataset.json`).
    pub qa_dataset: PathBuf,
    /// HR policy text used for QA harvesting (`data/policies/`).
    pub hr_policies: PathBuf,
    /// IT policy text used for QA harvesting (`data/it_policies/`).
    pub it_policies: PathBuf,
    /// Sentence-embedding model files (`data/models/`).
    pub models: PathBuf,
    /// LLM configuration (`data/llm-config.json`).
    pub llm_config_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            qa_dataset: root.join("qa_dataset.json"),
            hr_policies: root.join("policies"),
            it_policies: root.join("it_policies"),
            models: root.join("models"),
            llm_config_file: root.join("llm-config.json"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(&self.hr_policies)?;
        std::fs::create_dir_all(&self.it_policies)?;
        Ok(())
    }
}

/// Which embedding backend to start with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// all-MiniLM-L6-v2 through ONNX Runtime.
    Onnx,
    /// Token-hashing embedder, no model files needed.
    Hash,
    /// Semantic search disabled.
    None,
}

impl FromStr for EmbedderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "onnx" => Ok(Self::Onnx),
            "hash" => Ok(Self::Hash),
            "none" | "off" => Ok(Self::None),
            other => Err(Error::Config(format!("unknown embedder: {}", other))),
        }
    }
}

impl std::fmt::Display for EmbedderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Onnx => write!(f, "onnx"),
            Self::Hash => write!(f, "hash"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Similarity cutoffs for the QA router.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QaThresholds {
    /// Score at or above which the stored answer is returned as-is.
    pub exact: f32,
    /// Score at or above which the generator is asked, using the match as context.
    pub generate: f32,
}

impl QaThresholds {
    pub fn new(exact: f32, generate: f32) -> Result<Self> {
        for (name, value) in [("exact", exact), ("generate", generate)] {
            if !(-1.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "{} threshold {} outside [-1, 1]",
                    name, value
                )));
            }
        }
        if generate > exact {
            return Err(Error::Config(format!(
                "generate threshold {} is above exact threshold {}",
                generate, exact
            )));
        }
        Ok(Self { exact, generate })
    }
}

impl Default for QaThresholds {
    fn default() -> Self {
        Self {
            exact: DEFAULT_EXACT_THRESHOLD,
            generate: DEFAULT_GENERATE_THRESHOLD,
        }
    }
}

/// Company details interpolated into canned replies and prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    pub hr_email: String,
}

impl Default for CompanyProfile {
    fn default() -> Self {
        Self {
            name: "TechCorp Solutions".into(),
            hr_email: "hr@techcorp.com".into(),
        }
    }
}

/// Top-level HR Assist configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Embedding backend to load at startup.
    pub embedder: EmbedderKind,
    /// Embedding dimension (384 for all-MiniLM-L6-v2).
    pub embedding_dim: usize,
    /// Router cutoffs.
    pub thresholds: QaThresholds,
    /// Company name and HR contact.
    pub company: CompanyProfile,
    /// How long a pending document selection survives, in minutes.
    pub session_ttl_minutes: u64,
}

impl AppConfig {
    /// Create configuration from `.env`, the process environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> Result<Self> {
        // A missing .env is normal in production.
        let _ = dotenvy::dotenv();
        Self::from_lookup(data_dir, |key| std::env::var(key).ok())
    }

    /// Create configuration reading variables through `lookup`.
    pub fn from_lookup<F>(data_dir: impl AsRef<Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_or(&lookup, "PORT", 8000u16)?;
        let embedder = match lookup("EMBEDDER") {
            Some(v) => v.parse()?,
            None => EmbedderKind::Onnx,
        };
        let thresholds = QaThresholds::new(
            parse_or(&lookup, "QA_EXACT_THRESHOLD", DEFAULT_EXACT_THRESHOLD)?,
            parse_or(&lookup, "QA_GENERATE_THRESHOLD", DEFAULT_GENERATE_THRESHOLD)?,
        )?;

        let defaults = CompanyProfile::default();
        let company = CompanyProfile {
            name: lookup("COMPANY_NAME").unwrap_or(defaults.name),
            hr_email: lookup("COMPANY_EMAIL").unwrap_or(defaults.hr_email),
        };

        let data_paths = DataPaths::new(data_dir)?;

        Ok(Self {
            port,
            data_paths,
            embedder,
            embedding_dim: 384,
            thresholds,
            company,
            session_ttl_minutes: parse_or(&lookup, "SESSION_TTL_MINUTES", 30u64)?,
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{}={:?}: {}", key, raw, e))),
        _ => Ok(default),
    }
}
