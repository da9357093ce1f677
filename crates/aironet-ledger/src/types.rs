//! Wire types of the ledger REST API
//!
//! Shapes follow the MultiversX public API; only the fields the core reads
//! are modeled. Amounts arrive as decimal strings of atomic units.

use serde::{Deserialize, Serialize};

use aironet_common::{Error, Result};

/// Terminal status string of a settled transaction.
pub const TX_SUCCESS_STATUS: &str = "success";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerTransaction {
    #[serde(rename = "txHash")]
    pub tx_hash: String,
    pub status: String,
    pub sender: String,
    pub receiver: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub operations: Vec<TokenOperation>,
}

impl LedgerTransaction {
    pub fn is_success(&self) -> bool {
        self.status == TX_SUCCESS_STATUS
    }

    /// The token movement a top-up inspects.
    pub fn first_operation(&self) -> Option<&TokenOperation> {
        self.operations.first()
    }
}

/// One token movement inside a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenOperation {
    pub identifier: String,
    /// Atomic units as a decimal string.
    pub value: String,
    pub decimals: u32,
}

impl TokenOperation {
    /// Whole-token amount, scaled down by the operation's own decimals.
    pub fn denominated(&self) -> Result<f64> {
        let units = parse_units(&self.value)?;
        Ok(units as f64 / 10f64.powi(self.decimals as i32))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerAccount {
    pub address: String,
    #[serde(default)]
    pub balance: String,
    #[serde(default)]
    pub nonce: u64,
}

impl LedgerAccount {
    /// Native balance in whole tokens, given atomic units per whole token.
    pub fn denominated_balance(&self, denomination: f64) -> Result<f64> {
        let units = parse_units(&self.balance)?;
        Ok(units as f64 / denomination)
    }
}

/// One token position of an account (`/accounts/{address}/tokens/{id}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenHolding {
    pub identifier: String,
    #[serde(default)]
    pub balance: String,
    pub decimals: u32,
}

impl TokenHolding {
    pub fn denominated(&self) -> Result<f64> {
        let units = parse_units(&self.balance)?;
        Ok(units as f64 / 10f64.powi(self.decimals as i32))
    }
}

fn parse_units(value: &str) -> Result<u128> {
    value
        .parse()
        .map_err(|_| Error::ledger(format!("malformed unit amount {:?}", value)))
}
