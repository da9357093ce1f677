//! Reward-period scheduler
//!
//! One task owns the distribution timer. It sleeps until the current
//! window boundary, runs the engine when the boundary passes, and re-arms
//! from scratch whenever the period set changes. A boundary that is
//! already in the past runs immediately, so a delayed process catches up
//! window by window instead of skipping payouts.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use aironet_common::config::RewardConfig;
use aironet_common::types::RewardPeriod;
use aironet_common::utils::time::{current_timestamp, seconds_until};
use aironet_common::Result;
use aironet_store::{PeriodUpdate, Store};

use crate::distribution::RewardEngine;

/// Cloneable handle that wakes the scheduler after a period mutation.
///
/// Notifications only mean "recompute the deadline", so they coalesce: a
/// full queue already guarantees a recompute and further sends are
/// dropped.
#[derive(Clone)]
pub struct PeriodEvents {
    tx: mpsc::Sender<()>,
}

impl PeriodEvents {
    /// A fresh event channel; the scheduler consumes the receiver.
    pub fn channel() -> (Self, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel(8);
        (Self { tx }, rx)
    }

    /// Signals that a period was created, edited, deleted or advanced.
    pub fn notify(&self) {
        let _ = self.tx.try_send(());
    }
}

pub struct RewardScheduler {
    store: Arc<dyn Store>,
    engine: Arc<RewardEngine>,
    config: RewardConfig,
    events_rx: mpsc::Receiver<()>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl RewardScheduler {
    /// Builds the scheduler; returns it with the sender that stops it.
    pub fn new(
        store: Arc<dyn Store>,
        engine: Arc<RewardEngine>,
        config: RewardConfig,
        events_rx: mpsc::Receiver<()>,
    ) -> (Self, mpsc::Sender<()>) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        (
            Self {
                store,
                engine,
                config,
                events_rx,
                shutdown_rx,
            },
            shutdown_tx,
        )
    }

    /// Drives distribution until shutdown.
    ///
    /// Each iteration recomputes the next window boundary from the store.
    /// An overdue boundary settles immediately; a future one arms a sleep
    /// that races against period events and shutdown. With no period to
    /// wait for, the loop polls at the idle interval.
    pub async fn run(mut self) -> Result<()> {
        self.normalize_window().await?;
        info!("reward scheduler started");

        loop {
            self.drain_stale_events();

            let deadline = self.next_deadline().await?;
            let wait = match deadline.map(seconds_until) {
                Some(0) => match self.engine.distribute().await {
                    Ok(Some(summary)) => {
                        debug!(
                            "caught up overdue window of period {} ({} windows left)",
                            summary.period_id, summary.weeks_left
                        );
                        continue;
                    }
                    Ok(None) => Duration::from_secs(self.config.idle_poll_secs),
                    Err(err) => {
                        warn!("distribution tick failed: {}", err);
                        Duration::from_secs(self.config.idle_poll_secs)
                    }
                },
                Some(secs) => Duration::from_secs(secs),
                None => Duration::from_secs(self.config.idle_poll_secs),
            };

            tokio::select! {
                _ = sleep(wait) => {
                    // An idle-poll wakeup only recomputes; distribution
                    // runs when an armed boundary fired.
                    if deadline.is_some() {
                        match self.engine.distribute().await {
                            Ok(Some(summary)) => debug!(
                                "settled window of period {} ({} windows left)",
                                summary.period_id, summary.weeks_left
                            ),
                            Ok(None) => debug!("window boundary passed with no active period"),
                            Err(err) => warn!("distribution tick failed: {}", err),
                        }
                    }
                }
                Some(_) = self.events_rx.recv() => {
                    debug!("period set changed, rescheduling");
                }
                Some(_) = self.shutdown_rx.recv() => {
                    info!("reward scheduler shutting down");
                    break;
                }
            }
        }

        Ok(())
    }

    /// End of the window the next tick settles: the active period's
    /// boundary, or the upcoming period's first boundary.
    async fn next_deadline(&self) -> Result<Option<i64>> {
        Ok(self.scheduled_period().await?.map(|period| period.end_week))
    }

    async fn scheduled_period(&self) -> Result<Option<RewardPeriod>> {
        let now = current_timestamp();
        match self.store.active_period(now).await? {
            Some(period) => Ok(Some(period)),
            None => self.store.upcoming_period(now).await,
        }
    }

    /// Re-baselines a stale window at startup. A period restored from disk
    /// resumes distributing from now instead of bursting through every
    /// boundary missed while the process was down.
    async fn normalize_window(&self) -> Result<()> {
        let Some(period) = self.scheduled_period().await? else {
            return Ok(());
        };
        let now = current_timestamp();
        if period.start_week == 0 || period.start_week < now {
            info!(
                "re-baselining stale window of period {} to start now",
                period.id
            );
            let period_secs = self.config.period_secs as i64;
            self.store
                .update_period(
                    &period.id,
                    PeriodUpdate {
                        start_week: Some(now),
                        end_week: Some(now + period_secs),
                        end_date: Some(now + period_secs * period.weeks_left),
                        ..Default::default()
                    },
                )
                .await?;
        }
        Ok(())
    }

    /// Drops queued events so a burst of edits re-arms exactly once.
    fn drain_stale_events(&mut self) {
        while self.events_rx.try_recv().is_ok() {}
    }
}
