//! Client contract for the external ledger

use async_trait::async_trait;

use aironet_common::types::SigningKey;
use aironet_common::Result;

use crate::types::{LedgerAccount, LedgerTransaction};

/// What the core needs from the ledger network. Implemented by
/// [`crate::HttpLedgerClient`] against the public REST API and by
/// [`crate::MockLedger`] for tests.
#[async_trait]
pub trait LedgerClient: Send + Sync + 'static {
    /// Settled transaction by hash; `None` when the ledger does not know it.
    async fn transaction_by_hash(&self, hash: &str) -> Result<Option<LedgerTransaction>>;

    async fn account(&self, address: &str) -> Result<Option<LedgerAccount>>;

    /// Spendable reward-token balance of `address` in whole tokens; the
    /// native balance when no token is configured.
    async fn token_balance(&self, address: &str) -> Result<Option<f64>>;

    /// Signs and submits a transfer of `amount` whole tokens from the
    /// signing account to `to`, preflighting sender existence and balance.
    async fn send(&self, from: &SigningKey, to: &str, amount: f64) -> Result<()>;
}
