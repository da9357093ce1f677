//! Reward period administration
//!
//! Creation, editing and deletion of reward periods, plus the per-user
//! uptime summary shown on device dashboards. Every mutation wakes the
//! scheduler through the period-event channel.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use aironet_common::config::RewardConfig;
use aironet_common::types::RewardPeriod;
use aironet_common::utils::{current_timestamp, fixed};
use aironet_common::{Error, Result};
use aironet_store::{Page, PeriodUpdate, Store};

use crate::scheduler::PeriodEvents;

/// Admin-supplied parameters of a reward period.
#[derive(Debug, Clone)]
pub struct PeriodSpec {
    /// Total AIRO distributed over the whole period.
    pub total: f64,
    /// Number of weekly windows.
    pub total_weeks: i64,
    pub start_date: i64,
}

/// Per-user dashboard line for the period running now.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UptimeSummary {
    /// Ready minutes the user's miners recorded in the current window.
    pub uptime_minutes: u64,
    /// The user's projected share of the weekly pool.
    pub weekly_reward: f64,
}

pub struct PeriodOps {
    store: Arc<dyn Store>,
    events: PeriodEvents,
    config: RewardConfig,
}

impl PeriodOps {
    pub fn new(store: Arc<dyn Store>, events: PeriodEvents, config: RewardConfig) -> Self {
        Self {
            store,
            events,
            config,
        }
    }

    /// Creates the one open period. The weekly pool is `total` split over
    /// `total_weeks`, and the first window opens at `start_date`.
    pub async fn create(&self, spec: PeriodSpec) -> Result<RewardPeriod> {
        validate_spec(&spec)?;
        if self.store.count_open_periods().await? > 0 {
            return Err(Error::validation(
                "only one working reward period can exist",
            ));
        }

        let period = self.store.insert_period(self.build_period(spec)).await?;
        info!(
            "created reward period {}: {} AIRO over {} weeks",
            period.id, period.total, period.total_weeks
        );
        self.events.notify();
        Ok(period)
    }

    /// Rewrites an existing period from `spec`, resetting its windows as
    /// if freshly created.
    pub async fn update(&self, period_id: &str, spec: PeriodSpec) -> Result<RewardPeriod> {
        validate_spec(&spec)?;
        let period_secs = self.config.period_secs as i64;
        let updated = self
            .store
            .update_period(
                period_id,
                PeriodUpdate {
                    total: Some(spec.total),
                    weekly_reward: Some(fixed(spec.total / spec.total_weeks as f64, 6)),
                    total_weeks: Some(spec.total_weeks),
                    weeks_left: Some(spec.total_weeks),
                    start_date: Some(spec.start_date),
                    end_date: Some(spec.start_date + period_secs * spec.total_weeks),
                    start_week: Some(spec.start_date),
                    end_week: Some(spec.start_date + period_secs),
                },
            )
            .await?;
        if !updated {
            return Err(Error::not_found(format!("reward period {}", period_id)));
        }

        info!("updated reward period {}", period_id);
        self.events.notify();
        self.period(period_id).await
    }

    pub async fn delete(&self, period_id: &str) -> Result<()> {
        if !self.store.delete_period(period_id).await? {
            return Err(Error::not_found(format!("reward period {}", period_id)));
        }
        info!("deleted reward period {}", period_id);
        self.events.notify();
        Ok(())
    }

    pub async fn period(&self, period_id: &str) -> Result<RewardPeriod> {
        self.store
            .period(period_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("reward period {}", period_id)))
    }

    pub async fn periods(&self, page: Page) -> Result<Vec<RewardPeriod>> {
        self.store.periods(page).await
    }

    /// The user's recorded uptime and projected pool share for the window
    /// running now; `None` when no period is active.
    ///
    /// The projection splits the weekly pool across every eligible miner
    /// with a ready sample in the window, then multiplies the per-miner
    /// share by how many of those miners belong to the user.
    pub async fn uptime_summary(&self, user_id: &str) -> Result<Option<UptimeSummary>> {
        let now = current_timestamp();
        let Some(period) = self.store.active_period(now).await? else {
            return Ok(None);
        };

        let mut eligible_total = 0u64;
        let mut user_miners = 0u64;
        let mut user_samples = 0u64;
        for id in self.store.active_miner_ids(period.start_week).await? {
            let Some(miner) = self.store.miner(&id).await? else {
                continue;
            };
            if !miner.is_eligible() {
                continue;
            }
            eligible_total += 1;
            if miner.user_id.as_deref() == Some(user_id) {
                user_miners += 1;
                user_samples += self.store.count_ready_metrics(&id, period.start_week).await?;
            }
        }

        let share_for_one = if eligible_total > 0 {
            period.weekly_reward / eligible_total as f64
        } else {
            0.0
        };
        Ok(Some(UptimeSummary {
            uptime_minutes: user_samples * self.config.metric_interval_secs / 60,
            weekly_reward: fixed(share_for_one * user_miners as f64, 2),
        }))
    }

    fn build_period(&self, spec: PeriodSpec) -> RewardPeriod {
        let now = current_timestamp();
        let period_secs = self.config.period_secs as i64;
        RewardPeriod {
            id: uuid::Uuid::new_v4().to_string(),
            total: spec.total,
            weekly_reward: fixed(spec.total / spec.total_weeks as f64, 6),
            total_weeks: spec.total_weeks,
            weeks_left: spec.total_weeks,
            start_date: spec.start_date,
            end_date: spec.start_date + period_secs * spec.total_weeks,
            start_week: spec.start_date,
            end_week: spec.start_date + period_secs,
            timestamp_created: now,
            timestamp_updated: now,
        }
    }
}

fn validate_spec(spec: &PeriodSpec) -> Result<()> {
    let mut errors = Vec::new();
    if spec.total_weeks < 1 {
        errors.push("total weeks must be greater than or equal to 1");
    }
    if !spec.total.is_finite() || spec.total < 1.0 {
        errors.push("total Airo credits in the current period must be greater than or equal to 1");
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::validation(errors.join(", ")))
    }
}
