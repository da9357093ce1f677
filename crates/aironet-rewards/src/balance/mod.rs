//! Balance mutation protocol
//!
//! Withdrawals and top-ups move value between a miner's internal AIRO
//! balance and the external ledger. The balance check, the ledger call and
//! the balance write of either operation run under the miner's lock, and
//! the outcome lands in the transaction history. Top-ups additionally hold
//! an in-flight reservation on the ledger hash while the history is
//! checked, so a hash is credited exactly once no matter how it races.

mod locks;

pub use locks::{HashReservations, MinerLocks, ReservedHash};

use std::sync::Arc;

use tracing::{info, warn};

use aironet_common::types::{Miner, SigningKey, TransactionRecord, REWARD_KEY_TYPE};
use aironet_common::utils::fixed;
use aironet_common::{Error, Result};
use aironet_ledger::LedgerClient;
use aironet_store::{MinerUpdate, Store};

use crate::Requester;

pub struct BalanceManager {
    store: Arc<dyn Store>,
    ledger: Arc<dyn LedgerClient>,
    locks: Arc<MinerLocks>,
    reservations: HashReservations,
    token_identifier: Option<String>,
}

impl BalanceManager {
    pub fn new(
        store: Arc<dyn Store>,
        ledger: Arc<dyn LedgerClient>,
        locks: Arc<MinerLocks>,
        token_identifier: Option<String>,
    ) -> Self {
        Self {
            store,
            ledger,
            locks,
            reservations: HashReservations::new(),
            token_identifier,
        }
    }

    /// Moves `amount` AIRO from the miner's balance to its bound wallet.
    ///
    /// A failed ledger send is recorded as an error row and leaves the
    /// balance untouched; the balance is only debited after the transfer
    /// was accepted.
    pub async fn withdraw(
        &self,
        miner_id: &str,
        amount: f64,
        requester: &Requester,
    ) -> Result<TransactionRecord> {
        let miner = self.owned_miner(miner_id, requester).await?;
        let key = self.reward_key().await?;

        let lock = self.locks.lock_for(&miner.id);
        let _guard = lock.lock().await;

        // Re-read under the lock; the balance may have moved while waiting.
        let miner = self.require_miner(&miner.id).await?;
        let wallet = miner
            .wallet
            .clone()
            .ok_or_else(|| Error::validation("wallet not connected to miner"))?;
        if !amount.is_finite() || amount <= 0.0 || miner.current_airo < amount {
            return Err(Error::validation("invalid withdrawal sum"));
        }

        let record = TransactionRecord::withdraw(
            &miner.id,
            miner.user_id.as_deref(),
            amount,
            &key.address,
            &wallet,
        );

        if let Err(err) = self.ledger.send(&key, &wallet, amount).await {
            warn!(
                "withdrawal of {} AIRO for miner {} failed: {}",
                amount, miner.id, err
            );
            self.store
                .insert_transaction(record.failed(ledger_reason(&err)))
                .await?;
            return Err(err);
        }

        let record = self.store.insert_transaction(record).await?;
        self.store
            .update_miner(
                &miner.id,
                MinerUpdate {
                    current_airo: Some(fixed(miner.current_airo - amount, 6)),
                    ..Default::default()
                },
            )
            .await?;

        info!("miner {} withdrew {} AIRO to {}", miner.id, amount, wallet);
        Ok(record)
    }

    /// Credits a settled ledger deposit to the miner's balance, exactly
    /// once per transaction hash. Returns the credited amount.
    ///
    /// The deposit must be settled as successful, pay the reward account,
    /// originate from the miner's bound wallet and move the reward token.
    /// Only then is the hash reserved, the miner locked and the history
    /// checked for a prior credit of the same hash.
    pub async fn top_up(&self, miner_id: &str, tx_hash: &str, requester: &Requester) -> Result<f64> {
        let miner = self.owned_miner(miner_id, requester).await?;
        let wallet = miner
            .wallet
            .clone()
            .ok_or_else(|| Error::validation("wallet not connected to miner"))?;
        let key = self.reward_key().await?;

        let transaction = self
            .ledger
            .transaction_by_hash(tx_hash)
            .await?
            .ok_or_else(|| Error::ledger("transaction not found on the ledger"))?;
        if !transaction.is_success() {
            return Err(Error::ledger("transaction status is not success"));
        }
        if transaction.receiver != key.address {
            return Err(Error::validation(
                "transaction receiver is not the reward account",
            ));
        }
        if transaction.sender != wallet {
            return Err(Error::validation(
                "transaction sender is not the miner's wallet",
            ));
        }
        let operation = transaction
            .first_operation()
            .filter(|op| self.token_identifier.as_deref() == Some(op.identifier.as_str()))
            .ok_or_else(|| Error::validation("transaction does not transfer the reward token"))?;
        let credit = operation.denominated()?;

        let _reserved = self
            .reservations
            .reserve(tx_hash)
            .ok_or_else(|| Error::HashReused(tx_hash.to_string()))?;

        let lock = self.locks.lock_for(&miner.id);
        let _guard = lock.lock().await;

        if self.store.top_up_by_hash(tx_hash).await?.is_some() {
            return Err(Error::HashReused(tx_hash.to_string()));
        }

        // Re-read under the lock so a concurrent reward or withdrawal is
        // not overwritten by this credit.
        let miner = self.require_miner(&miner.id).await?;

        if credit != 0.0 {
            self.store
                .insert_transaction(TransactionRecord::top_up(
                    &miner.id,
                    miner.user_id.as_deref(),
                    credit,
                    tx_hash,
                    &wallet,
                    &key.address,
                ))
                .await?;
        }
        self.store
            .update_miner(
                &miner.id,
                MinerUpdate {
                    current_airo: Some(fixed(miner.current_airo + credit, 6)),
                    ..Default::default()
                },
            )
            .await?;

        info!(
            "credited {} AIRO to miner {} from hash {}",
            credit, miner.id, tx_hash
        );
        Ok(credit)
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

    /// The designated reward signing account.
    async fn reward_key(&self) -> Result<SigningKey> {
        self.store
            .signing_key(REWARD_KEY_TYPE)
            .await?
            .ok_or_else(|| Error::not_found("reward signing key"))
    }
}

/// Failure reason recorded on an error row: ledger failures keep their
/// bare message, anything else its display form.
fn ledger_reason(err: &Error) -> String {
    match err {
        Error::Ledger(reason) => reason.clone(),
        other => other.to_string(),
    }
}
