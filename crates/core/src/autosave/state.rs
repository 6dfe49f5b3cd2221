use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use thiserror::Error;

/// Where the engine is in its save cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}

/// Observable auto-save state, published on every transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoSaveState {
    pub status: SaveStatus,
    pub is_dirty: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_saved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub retry_count: u32,
}

impl AutoSaveState {
    /// One-line status for an editor toolbar; `None` when there is nothing to
    /// report.
    pub fn summary(&self) -> Option<String> {
        match self.status {
            SaveStatus::Saving => Some("Saving…".to_string()),
            SaveStatus::Error => Some(format!(
                "Save failed: {}",
                self.error.as_deref().unwrap_or(DEFAULT_FAILURE_MESSAGE)
            )),
            _ if self.is_dirty => Some("Unsaved changes".to_string()),
            SaveStatus::Saved => self
                .last_saved_at
                .map(|at| format!("Saved at {}", at.with_timezone(&Local).format("%H:%M"))),
            SaveStatus::Idle => None,
        }
    }
}

pub(crate) const DEFAULT_FAILURE_MESSAGE: &str = "failed to save changes";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AutoSaveError {
    #[error("auto-save is disabled")]
    Disabled,
    #[error("auto-save has been shut down")]
    Closed,
    #[error("save failed: {0}")]
    Failed(String),
}
