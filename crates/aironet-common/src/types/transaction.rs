//! Transaction history records
//!
//! Append-only audit trail of every balance movement: distribution rewards,
//! ledger top-ups and withdrawals, successful or failed.

use serde::{Deserialize, Serialize};

use crate::utils::time::current_timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxType {
    #[serde(rename = "REWARD")]
    Reward,
    #[serde(rename = "TOP-UP")]
    TopUp,
    #[serde(rename = "WITHDRAW")]
    Withdraw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub miner_id: String,
    pub user_id: Option<String>,
    /// AIRO amount moved by this record.
    pub value: f64,
    pub tx_type: TxType,
    pub status: TxStatus,
    /// Failure reason for `Error` records.
    pub reason: Option<String>,
    /// Ledger transaction hash; globally unique across TOP-UP records.
    pub tx_hash: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,

    // Audit fields written by the distribution engine.
    pub age_rate: Option<f64>,
    pub uptime_rate: Option<f64>,
    /// Uptime in seconds (sample count times the sample interval).
    pub metric_count: Option<u64>,
    pub health: Option<f64>,
    /// The period's weekly pool at the time of the tick.
    pub reward: Option<f64>,
    pub active_miners: Option<u64>,
    pub reward_for_one_miner: Option<f64>,

    pub timestamp_created: i64,
    pub timestamp_updated: i64,
}

impl TransactionRecord {
    fn base(miner_id: &str, user_id: Option<&str>, value: f64, tx_type: TxType) -> Self {
        let now = current_timestamp();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            miner_id: miner_id.to_string(),
            user_id: user_id.map(str::to_string),
            value,
            tx_type,
            status: TxStatus::Success,
            reason: None,
            tx_hash: None,
            from: None,
            to: None,
            age_rate: None,
            uptime_rate: None,
            metric_count: None,
            health: None,
            reward: None,
            active_miners: None,
            reward_for_one_miner: None,
            timestamp_created: now,
            timestamp_updated: now,
        }
    }

    pub fn withdraw(
        miner_id: &str,
        user_id: Option<&str>,
        value: f64,
        from: &str,
        to: &str,
    ) -> Self {
        Self {
            from: Some(from.to_string()),
            to: Some(to.to_string()),
            ..Self::base(miner_id, user_id, value, TxType::Withdraw)
        }
    }

    pub fn top_up(
        miner_id: &str,
        user_id: Option<&str>,
        value: f64,
        tx_hash: &str,
        from: &str,
        to: &str,
    ) -> Self {
        Self {
            tx_hash: Some(tx_hash.to_string()),
            from: Some(from.to_string()),
            to: Some(to.to_string()),
            ..Self::base(miner_id, user_id, value, TxType::TopUp)
        }
    }

    pub fn reward(miner_id: &str, user_id: Option<&str>, value: f64) -> Self {
        Self::base(miner_id, user_id, value, TxType::Reward)
    }

    pub fn failed(mut self, reason: impl Into<String>) -> Self {
        self.status = TxStatus::Error;
        self.reason = Some(reason.into());
        self
    }
}
