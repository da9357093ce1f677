//! This is the aironet-rewards crate - the reward distribution core of the
//! AiroNet fleet. It scores miner health and uptime, runs the weekly
//! distribution over the active reward period, schedules the distribution
//! timer, and mediates every balance movement between miners and the
//! external ledger.

pub mod balance;
pub mod distribution;
pub mod periods;
pub mod scheduler;
pub mod scoring;
pub mod service;


use aironet_common::types::Miner;

pub use balance::{BalanceManager, HashReservations, MinerLocks};
pub use distribution::{DistributionSummary, RewardEngine};
pub use periods::{PeriodOps, PeriodSpec, UptimeSummary};
pub use scheduler::{PeriodEvents, RewardScheduler};
pub use service::{RewardsService, SchedulerHandle, WalletSummary};

/// Identity attached to every user-facing call. Admins see and act on the
/// whole fleet; everyone else only on miners claimed by their `user_id`.
#[derive(Debug, Clone)]
pub struct Requester {
    pub user_id: String,
    pub is_admin: bool,
}

impl Requester {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            is_admin: false,
        }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            is_admin: true,
        }
    }

    /// Whether this requester may act on `miner`.
    pub fn owns(&self, miner: &Miner) -> bool {
        self.is_admin || miner.user_id.as_deref() == Some(self.user_id.as_str())
    }
}
