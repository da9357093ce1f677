//! Service facade wiring the reward core together
//!
//! [`RewardsService`] owns the store, the ledger client and the lock
//! registry, exposes miner registration and wallet binding, and spawns the
//! scheduler task. The HTTP layer talks to this type and to the managers
//! it hands out.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use aironet_common::config::CoreConfig;
use aironet_common::types::{
    Miner, NewMiner, SigningKey, TransactionRecord, TxType, REWARD_KEY_TYPE,
};
use aironet_common::{Error, Result};
use aironet_ledger::LedgerClient;
use aironet_store::{MinerFilter, MinerUpdate, Page, Store, TransactionFilter};

use crate::balance::{BalanceManager, MinerLocks};
use crate::distribution::RewardEngine;
use crate::periods::PeriodOps;
use crate::scheduler::{PeriodEvents, RewardScheduler};
use crate::Requester;

/// Fleet-wide display name reserved for the dashboard aggregate.
const RESERVED_MINER_NAME: &str = "All Miners";
/// Longest accepted miner display name.
const MAX_MINER_NAME_LEN: usize = 16;

/// Ledger-side view of a miner's bound wallet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletSummary {
    pub address: String,
    /// Reward-token balance in whole tokens; `None` when the ledger has no
    /// holding for the address.
    pub balance: Option<f64>,
    pub nonce: u64,
}

/// Running scheduler task plus the sender that stops it.
pub struct SchedulerHandle {
    shutdown: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signals the scheduler and waits for the task to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(()).await;
        let _ = self.task.await;
    }
}

pub struct RewardsService {
    store: Arc<dyn Store>,
    ledger: Arc<dyn LedgerClient>,
    balance: BalanceManager,
    periods: PeriodOps,
    engine: Arc<RewardEngine>,
    events_rx: Option<mpsc::Receiver<()>>,
    config: CoreConfig,
}

impl RewardsService {
    pub fn new(store: Arc<dyn Store>, ledger: Arc<dyn LedgerClient>, config: CoreConfig) -> Self {
        let locks = Arc::new(MinerLocks::new());
        let (events, events_rx) = PeriodEvents::channel();
        let engine = Arc::new(RewardEngine::new(
            store.clone(),
            locks.clone(),
            events.clone(),
            config.rewards.clone(),
        ));
        let balance = BalanceManager::new(
            store.clone(),
            ledger.clone(),
            locks,
            config.ledger.token_identifier.clone(),
        );
        let periods = PeriodOps::new(store.clone(), events, config.rewards.clone());

        Self {
            store,
            ledger,
            balance,
            periods,
            engine,
            events_rx: Some(events_rx),
            config,
        }
    }

    /// Seeds the reward signing account and spawns the scheduler task.
    pub async fn start(&mut self) -> Result<SchedulerHandle> {
        self.seed_reward_key().await?;

        let events_rx = self
            .events_rx
            .take()
            .ok_or_else(|| Error::Other(anyhow::anyhow!("scheduler already started")))?;
        let (scheduler, shutdown) = RewardScheduler::new(
            self.store.clone(),
            self.engine.clone(),
            self.config.rewards.clone(),
            events_rx,
        );
        let task = tokio::spawn(async move {
            if let Err(err) = scheduler.run().await {
                error!("reward scheduler exited: {}", err);
            }
        });

        Ok(SchedulerHandle { shutdown, task })
    }

    pub fn balance(&self) -> &BalanceManager {
        &self.balance
    }

    pub fn periods(&self) -> &PeriodOps {
        &self.periods
    }

    // --- miners ---

    /// Registers a device in the fleet.
    pub async fn create_miner(&self, new: NewMiner) -> Result<Miner> {
        validate_new_miner(&new)?;
        let miner = self.store.insert_miner(new.into_miner()).await?;
        info!("registered miner {} (serial {})", miner.id, miner.serial_id);
        Ok(miner)
    }

    /// Binds an unclaimed device to `user_id` by serial number, under the
    /// user's chosen display name.
    pub async fn claim_miner(&self, serial_id: &str, name: &str, user_id: &str) -> Result<Miner> {
        if name == RESERVED_MINER_NAME {
            return Err(Error::validation("this name is reserved"));
        }
        if name.is_empty() || name.len() > MAX_MINER_NAME_LEN {
            return Err(Error::validation(
                "name cannot be longer than 16 characters",
            ));
        }

        let miner = self
            .store
            .miner_by_serial(serial_id)
            .await?
            .ok_or_else(|| Error::not_found("miner with this serial id"))?;
        if miner.user_id.as_deref().is_some_and(|u| !u.is_empty()) {
            return Err(Error::validation(
                "miner with this serial id is already in use",
            ));
        }
        if self.store.miner_by_name(user_id, name).await?.is_some() {
            return Err(Error::validation("miner with this name already exists"));
        }

        self.store
            .update_miner(
                &miner.id,
                MinerUpdate {
                    name: Some(name.to_string()),
                    user_id: Some(user_id.to_string()),
                    ..Default::default()
                },
            )
            .await?;
        info!("miner {} claimed by user {}", miner.id, user_id);
        self.require_miner(&miner.id).await
    }

    /// Binds a ledger address to the requester's miner. Binding the
    /// address the miner already carries unbinds it instead.
    pub async fn bind_wallet(
        &self,
        miner_id: &str,
        wallet: &str,
        requester: &Requester,
    ) -> Result<Miner> {
        if wallet.is_empty() {
            return Err(Error::validation("invalid wallet address"));
        }
        let miner = self.owned_miner(miner_id, requester).await?;

        if let Some(holder) = self.store.miner_by_wallet(wallet).await? {
            if holder.id != miner.id {
                return Err(Error::validation(
                    "wallet is already connected to another miner",
                ));
            }
        }

        let update = if miner.wallet.as_deref() == Some(wallet) {
            MinerUpdate {
                wallet: Some(None),
                ..Default::default()
            }
        } else {
            MinerUpdate {
                wallet: Some(Some(wallet.to_string())),
                ..Default::default()
            }
        };
        self.store.update_miner(&miner.id, update).await?;
        self.require_miner(&miner.id).await
    }

    /// Resolves the miner's bound wallet against the ledger.
    pub async fn miner_wallet(&self, miner_id: &str, requester: &Requester) -> Result<WalletSummary> {
        let miner = self.owned_miner(miner_id, requester).await?;
        let wallet = miner
            .wallet
            .ok_or_else(|| Error::not_found("wallet bound to this miner"))?;

        let account = self
            .ledger
            .account(&wallet)
            .await?
            .ok_or_else(|| Error::not_found("wallet account on the ledger"))?;
        let balance = self.ledger.token_balance(&wallet).await?;

        Ok(WalletSummary {
            address: account.address,
            balance,
            nonce: account.nonce,
        })
    }

    pub async fn miner(&self, miner_id: &str, requester: &Requester) -> Result<Miner> {
        self.owned_miner(miner_id, requester).await
    }

    /// Miners visible to the requester; admins see the whole fleet.
    pub async fn miners(
        &self,
        requester: &Requester,
        ids: Option<Vec<String>>,
        page: Page,
    ) -> Result<Vec<Miner>> {
        self.store.miners(self.miner_filter(requester, ids), page).await
    }

    pub async fn count_miners(&self, requester: &Requester, ids: Option<Vec<String>>) -> Result<u64> {
        self.store
            .count_miners(&self.miner_filter(requester, ids))
            .await
    }

    /// Removes a device from the fleet. Admin only.
    pub async fn remove_miner(&self, miner_id: &str, requester: &Requester) -> Result<()> {
        if !requester.is_admin {
            return Err(Error::not_found(format!("miner {}", miner_id)));
        }
        if !self.store.delete_miner(miner_id).await? {
            return Err(Error::not_found(format!("miner {}", miner_id)));
        }
        info!("removed miner {}", miner_id);
        Ok(())
    }

    // --- transaction history ---

    pub async fn transaction(&self, id: &str, requester: &Requester) -> Result<TransactionRecord> {
        self.store
            .transaction(id)
            .await?
            .filter(|record| {
                requester.is_admin || record.user_id.as_deref() == Some(requester.user_id.as_str())
            })
            .ok_or_else(|| Error::not_found(format!("transaction {}", id)))
    }

    pub async fn transactions(
        &self,
        requester: &Requester,
        miner_id: Option<String>,
        tx_type: Option<TxType>,
        page: Page,
    ) -> Result<Vec<TransactionRecord>> {
        self.store
            .transactions(self.transaction_filter(requester, miner_id, tx_type), page)
            .await
    }

    pub async fn count_transactions(
        &self,
        requester: &Requester,
        miner_id: Option<String>,
        tx_type: Option<TxType>,
    ) -> Result<u64> {
        self.store
            .count_transactions(&self.transaction_filter(requester, miner_id, tx_type))
            .await
    }

    // --- internals ---

    fn miner_filter(&self, requester: &Requester, ids: Option<Vec<String>>) -> MinerFilter {
        MinerFilter {
            user_id: (!requester.is_admin).then(|| requester.user_id.clone()),
            ids,
        }
    }

    fn transaction_filter(
        &self,
        requester: &Requester,
        miner_id: Option<String>,
        tx_type: Option<TxType>,
    ) -> TransactionFilter {
        TransactionFilter {
            user_id: (!requester.is_admin).then(|| requester.user_id.clone()),
            miner_id,
            tx_type,
        }
    }

    async fn owned_miner(&self, miner_id: &str, requester: &Requester) -> Result<Miner> {
        self.store
            .miner(miner_id)
            .await?
            .filter(|miner| requester.owns(miner))
            .ok_or_else(|| Error::not_found(format!("miner {}", miner_id)))
    }

    async fn require_miner(&self, miner_id: &str) -> Result<Miner> {
        self.store
            .miner(miner_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("miner {}", miner_id)))
    }

    /// Stores the configured reward signing account when the key store
    /// holds none.
    async fn seed_reward_key(&self) -> Result<()> {
        if self.store.signing_key(REWARD_KEY_TYPE).await?.is_some() {
            return Ok(());
        }
        match (
            &self.config.ledger.reward_address,
            &self.config.ledger.reward_secret,
        ) {
            (Some(address), Some(secret)) => {
                self.store
                    .insert_key(SigningKey::reward(address.clone(), secret.clone()))
                    .await?;
                info!("seeded reward signing account {}", address);
            }
            _ => warn!("no reward signing account configured; withdrawals and top-ups will fail"),
        }
        Ok(())
    }
}

fn validate_new_miner(new: &NewMiner) -> Result<()> {
    let mut errors = Vec::new();
    if new.name.is_empty() {
        errors.push("miner name is required");
    }
    if new.name.len() > MAX_MINER_NAME_LEN {
        errors.push("miner name must be at most 16 characters long");
    }
    if new.model.as_deref().map_or(true, str::is_empty) {
        errors.push("miner model is required");
    }
    if new.serial_id.is_empty() {
        errors.push("miner serial id is required");
    }
    if !new.current_airo.is_finite() || new.current_airo < 0.0 {
        errors.push("miner balance must be greater than or equal to 0");
    }
    if !(0.0..=100.0).contains(&new.age_rate) {
        errors.push("miner age rate must be between 0 and 100");
    }
    if !new.total_rewards.is_finite() || new.total_rewards < 0.0 {
        errors.push("miner total rewards must be greater than or equal to 0");
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::validation(errors.join(", ")))
    }
}
