//! Scriptable ledger double for tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use aironet_common::types::SigningKey;
use aironet_common::{Error, Result};

use crate::client::LedgerClient;
use crate::types::{LedgerAccount, LedgerTransaction, TokenOperation, TX_SUCCESS_STATUS};

/// One transfer the mock was asked to submit.
#[derive(Debug, Clone, PartialEq)]
pub struct SentTransfer {
    pub from: String,
    pub to: String,
    pub amount: f64,
}

/// In-memory [`LedgerClient`] scripted by tests: preset transactions and
/// accounts, recorded sends, optional send failure.
#[derive(Default)]
pub struct MockLedger {
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    transactions: HashMap<String, LedgerTransaction>,
    accounts: HashMap<String, LedgerAccount>,
    balances: HashMap<String, f64>,
    sends: Vec<SentTransfer>,
    send_failure: Option<String>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_transaction(&self, transaction: LedgerTransaction) {
        let mut state = self.state.lock().unwrap();
        state
            .transactions
            .insert(transaction.tx_hash.clone(), transaction);
    }

    /// Registers an account with a whole-token balance (18-decimals units).
    pub fn put_account(&self, address: &str, balance: f64, nonce: u64) {
        let mut state = self.state.lock().unwrap();
        state.accounts.insert(
            address.to_string(),
            LedgerAccount {
                address: address.to_string(),
                balance: format!("{}", (balance * 1e18) as u128),
                nonce,
            },
        );
        state.balances.insert(address.to_string(), balance);
    }

    /// Makes every subsequent `send` fail with `reason`.
    pub fn fail_sends(&self, reason: &str) {
        self.state.lock().unwrap().send_failure = Some(reason.to_string());
    }

    pub fn sends(&self) -> Vec<SentTransfer> {
        self.state.lock().unwrap().sends.clone()
    }
}

/// Settled token transfer in the shape a valid top-up references.
pub fn settled_transfer(
    hash: &str,
    sender: &str,
    receiver: &str,
    token: &str,
    units: &str,
    decimals: u32,
) -> LedgerTransaction {
    LedgerTransaction {
        tx_hash: hash.to_string(),
        status: TX_SUCCESS_STATUS.to_string(),
        sender: sender.to_string(),
        receiver: receiver.to_string(),
        value: "0".to_string(),
        operations: vec![TokenOperation {
            identifier: token.to_string(),
            value: units.to_string(),
            decimals,
        }],
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn transaction_by_hash(&self, hash: &str) -> Result<Option<LedgerTransaction>> {
        Ok(self.state.lock().unwrap().transactions.get(hash).cloned())
    }

    async fn account(&self, address: &str) -> Result<Option<LedgerAccount>> {
        Ok(self.state.lock().unwrap().accounts.get(address).cloned())
    }

    async fn token_balance(&self, address: &str) -> Result<Option<f64>> {
        Ok(self.state.lock().unwrap().balances.get(address).copied())
    }

    async fn send(&self, from: &SigningKey, to: &str, amount: f64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = &state.send_failure {
            return Err(Error::ledger(reason.clone()));
        }
        state.sends.push(SentTransfer {
            from: from.address.clone(),
            to: to.to_string(),
            amount,
        });
        Ok(())
    }
}
