//! Telemetry metric samples

use serde::{Deserialize, Serialize};

use crate::utils::time::current_timestamp;

/// Device state value that counts toward uptime.
pub const READY_STATE: &str = "ready";

/// One immutable telemetry sample, produced by the ingestion pipeline.
/// The core only ever counts samples with `state == "ready"` inside a
/// time window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    pub id: String,
    pub miner_id: String,
    pub state: String,
    /// Whether the producing miner was claimed at sample time.
    pub has_user: bool,
    pub timestamp_created: i64,
    pub timestamp_updated: i64,
}

impl Metric {
    pub fn ready(miner_id: impl Into<String>, timestamp_created: i64) -> Self {
        let now = current_timestamp();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            miner_id: miner_id.into(),
            state: READY_STATE.to_string(),
            has_user: true,
            timestamp_created,
            timestamp_updated: now,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == READY_STATE
    }
}
