//! Signing key records

use serde::{Deserialize, Serialize};

use crate::utils::time::current_timestamp;

/// Key type of the designated reward account: the sender of withdrawals and
/// the required receiver of top-ups.
pub const REWARD_KEY_TYPE: &str = "reward";

/// A ledger signing account held by the service. `key_type` is unique in
/// the key store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningKey {
    pub id: String,
    pub key_type: String,
    /// Bech32 ledger address of the account.
    pub address: String,
    /// Hex-encoded ed25519 secret key.
    pub secret_key: String,
    pub timestamp_created: i64,
    pub timestamp_updated: i64,
}

impl SigningKey {
    pub fn reward(address: impl Into<String>, secret_key: impl Into<String>) -> Self {
        let now = current_timestamp();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            key_type: REWARD_KEY_TYPE.to_string(),
            address: address.into(),
            secret_key: secret_key.into(),
            timestamp_created: now,
            timestamp_updated: now,
        }
    }
}
