//! Shared application state.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use serde::Serialize;

use hrassist_chat::LLMConfig;
use hrassist_core::AppConfig;
use hrassist_engine::{HarvestReport, QaEngine};

/// Status of the most recent background QA harvest.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HarvestStatus {
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<HarvestReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: AppConfig,
    pub engine: QaEngine,
    pub llm_config: LLMConfig,
    harvest_running: AtomicBool,
    pub harvest_status: RwLock<HarvestStatus>,
}

impl AppState {
    pub fn new(config: AppConfig, engine: QaEngine, llm_config: LLMConfig) -> Self {
        Self {
            config,
            engine,
            llm_config,
            harvest_running: AtomicBool::new(false),
            harvest_status: RwLock::new(HarvestStatus::default()),
        }
    }

    /// Claim the harvest slot. False when a harvest is already running.
    pub fn try_start_harvest(&self) -> bool {
        let claimed = self
            .harvest_running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if claimed {
            *self.harvest_status.write() = HarvestStatus {
                running: true,
                started_at: Some(chrono::Utc::now().to_rfc3339()),
                ..HarvestStatus::default()
            };
        }
        claimed
    }

    pub fn finish_harvest(&self, outcome: hrassist_core::Result<HarvestReport>) {
        {
            let mut status = self.harvest_status.write();
            status.running = false;
            status.finished_at = Some(chrono::Utc::now().to_rfc3339());
            match outcome {
                Ok(report) => status.report = Some(report),
                Err(e) => status.error = Some(e.to_string()),
            }
        }
        self.harvest_running.store(false, Ordering::Release);
    }
}
