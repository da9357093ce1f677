//! Weekly reward distribution
//!
//! One tick settles the current window of the active period: every
//! eligible miner that produced a ready sample inside the window is scored
//! and paid its share of the weekly pool, then the window advances in
//! place. Ticks are driven by [`crate::scheduler::RewardScheduler`].

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use aironet_common::config::RewardConfig;
use aironet_common::types::{Miner, RewardPeriod, TransactionRecord};
use aironet_common::utils::{current_timestamp, fixed};
use aironet_common::Result;
use aironet_store::{MinerUpdate, PeriodUpdate, Store};

use crate::balance::MinerLocks;
use crate::scheduler::PeriodEvents;
use crate::scoring;

/// Outcome of one settled window.
#[derive(Debug, Clone, Serialize)]
pub struct DistributionSummary {
    pub period_id: String,
    /// Eligible miners the weekly pool was split across.
    pub active_miners: u64,
    /// AIRO actually paid out this window.
    pub distributed: f64,
    pub weeks_left: i64,
}

pub struct RewardEngine {
    store: Arc<dyn Store>,
    locks: Arc<MinerLocks>,
    events: PeriodEvents,
    config: RewardConfig,
}

impl RewardEngine {
    pub fn new(
        store: Arc<dyn Store>,
        locks: Arc<MinerLocks>,
        events: PeriodEvents,
        config: RewardConfig,
    ) -> Self {
        Self {
            store,
            locks,
            events,
            config,
        }
    }

    /// Settles the current window of the active period, if one is running.
    ///
    /// The weekly pool is split evenly across the miners that are eligible
    /// and produced at least one ready sample since `start_week`; each
    /// share is then weighted by the miner's own uptime, age and health. A
    /// failed payout is logged and skipped, and the window advances
    /// regardless, so one bad record cannot stall the period.
    pub async fn distribute(&self) -> Result<Option<DistributionSummary>> {
        let now = current_timestamp();
        let Some(period) = self.store.active_period(now).await? else {
            debug!("no active reward period, nothing to distribute");
            return Ok(None);
        };

        let mut miners = Vec::new();
        for id in self.store.active_miner_ids(period.start_week).await? {
            if let Some(miner) = self.store.miner(&id).await? {
                if miner.is_eligible() {
                    miners.push(miner);
                }
            }
        }

        let active_miners = miners.len() as u64;
        let share_for_one = if active_miners > 0 {
            period.weekly_reward / active_miners as f64
        } else {
            0.0
        };

        let period_ref = &period;
        let payouts = join_all(miners.into_iter().map(|miner| {
            let miner_id = miner.id.clone();
            async move {
                let paid = self
                    .reward_miner(miner, period_ref, share_for_one, active_miners)
                    .await;
                (miner_id, paid)
            }
        }))
        .await;

        let mut distributed = 0.0;
        for (miner_id, paid) in payouts {
            match paid {
                Ok(reward) => distributed += reward,
                Err(err) => warn!("skipping reward for miner {}: {}", miner_id, err),
            }
        }

        let weeks_left = period.weeks_left - 1;
        self.store
            .update_period(
                &period.id,
                PeriodUpdate {
                    start_week: Some(period.end_week),
                    end_week: Some(period.end_week + self.config.period_secs as i64),
                    weeks_left: Some(weeks_left),
                    ..Default::default()
                },
            )
            .await?;
        self.events.notify();

        info!(
            "distributed {} AIRO across {} miners for period {} ({} windows left)",
            distributed, active_miners, period.id, weeks_left
        );
        Ok(Some(DistributionSummary {
            period_id: period.id,
            active_miners,
            distributed,
            weeks_left,
        }))
    }

    /// Scores and pays one miner under its balance lock; returns the paid
    /// amount.
    async fn reward_miner(
        &self,
        miner: Miner,
        period: &RewardPeriod,
        share_for_one: f64,
        active_miners: u64,
    ) -> Result<f64> {
        let lock = self.locks.lock_for(&miner.id);
        let _guard = lock.lock().await;

        // Re-read under the lock; a concurrent top-up or withdrawal may
        // have moved the balance since the listing.
        let Some(miner) = self.store.miner(&miner.id).await? else {
            return Ok(0.0);
        };

        let samples = self
            .store
            .count_ready_metrics(&miner.id, period.start_week)
            .await?;
        let uptime_rate = scoring::uptime_coefficient(samples, self.config.expected_metrics);
        let health = scoring::health(miner.total_rewards, miner.current_airo);
        let reward = fixed(
            uptime_rate * ((miner.age_rate + health) / 200.0) * share_for_one,
            5,
        );

        if reward != 0.0 {
            let mut record = TransactionRecord::reward(&miner.id, miner.user_id.as_deref(), reward);
            record.age_rate = Some(miner.age_rate);
            record.uptime_rate = Some(uptime_rate);
            record.metric_count = Some(samples * self.config.metric_interval_secs);
            record.health = Some(health);
            record.reward = Some(period.weekly_reward);
            record.active_miners = Some(active_miners);
            record.reward_for_one_miner = Some(share_for_one);
            self.store.insert_transaction(record).await?;
        }

        self.store
            .update_miner(
                &miner.id,
                MinerUpdate {
                    current_airo: Some(fixed(miner.current_airo + reward, 6)),
                    total_rewards: Some(fixed(miner.total_rewards + reward, 6)),
                    age_rate: Some((miner.age_rate - uptime_rate).max(0.0)),
                    ..Default::default()
                },
            )
            .await?;

        debug!(
            "miner {} earned {} AIRO (uptime {}, health {})",
            miner.id, reward, uptime_rate, health
        );
        Ok(reward)
    }
}
