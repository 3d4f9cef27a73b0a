//! HR Assist Core: configuration, data directory layout, error types.

pub mod config;
pub mod error;

pub use config::{AppConfig, CompanyProfile, DataPaths, EmbedderKind, QaThresholds};
pub use error::{Error, Result};
