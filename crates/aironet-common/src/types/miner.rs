//! Miner records
//!
//! A miner is a registered telemetry device earning AIRO. `current_airo` and
//! `total_rewards` are written by both the distribution engine and the
//! balance protocol; every such write must hold the miner's lock.

use serde::{Deserialize, Serialize};

use crate::utils::time::current_timestamp;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Miner {
    pub id: String,
    pub name: String,
    pub model: Option<String>,
    /// Device serial, unique across the fleet.
    pub serial_id: String,
    /// Owning user; `None` until the device is claimed.
    pub user_id: Option<String>,
    /// Spendable AIRO balance.
    pub current_airo: f64,
    /// Decaying age factor, 100 at creation. Decays by the uptime
    /// coefficient each distribution window.
    pub age_rate: f64,
    /// Cumulative AIRO ever distributed to this miner.
    pub total_rewards: f64,
    /// Bound ledger address, if any.
    pub wallet: Option<String>,
    pub connect_date: Option<i64>,
    pub timestamp_created: i64,
    pub timestamp_updated: i64,
}

impl Miner {
    /// Eligible for distribution: claimed by a user and not aged out.
    pub fn is_eligible(&self) -> bool {
        self.age_rate > 0.0 && self.user_id.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// Creation payload; defaults match the admin creation route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMiner {
    pub name: String,
    pub model: Option<String>,
    pub serial_id: String,
    pub user_id: Option<String>,
    pub current_airo: f64,
    pub age_rate: f64,
    pub total_rewards: f64,
    pub wallet: Option<String>,
    pub connect_date: Option<i64>,
}

impl Default for NewMiner {
    fn default() -> Self {
        Self {
            name: "Untitled Miner".to_string(),
            model: None,
            serial_id: String::new(),
            user_id: None,
            current_airo: 0.0,
            age_rate: 100.0,
            total_rewards: 0.0,
            wallet: None,
            connect_date: None,
        }
    }
}

impl NewMiner {
    pub fn into_miner(self) -> Miner {
        let now = current_timestamp();
        Miner {
            id: uuid::Uuid::new_v4().to_string(),
            name: self.name,
            model: self.model,
            serial_id: self.serial_id,
            user_id: self.user_id,
            current_airo: self.current_airo,
            age_rate: self.age_rate,
            total_rewards: self.total_rewards,
            wallet: self.wallet,
            connect_date: self.connect_date,
            timestamp_created: now,
            timestamp_updated: now,
        }
    }
}
