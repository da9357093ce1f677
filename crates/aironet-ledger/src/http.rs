//! HTTP ledger client
//!
//! `reqwest` client over a MultiversX-style REST API: account, transaction
//! and token reads, plus signed transfer submission. A short-lived signature
//! cache refuses to resubmit an identical signed payload, which would spend
//! the same nonce twice.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use ed25519_dalek::Signer;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};

use aironet_common::config::LedgerConfig;
use aironet_common::types::SigningKey;
use aironet_common::{Error, Result};

use crate::client::LedgerClient;
use crate::types::{LedgerAccount, LedgerTransaction, TokenHolding};

/// How long a signature stays in the resubmission guard.
const SIGNATURE_GUARD_TTL: Duration = Duration::from_secs(60);

/// Transfer payload. Field order matches the ledger's canonical signing
/// serialization, so the signature is computed over exactly the JSON the
/// API receives (minus the signature itself).
#[derive(Debug, Clone, Serialize)]
pub struct TransferTransaction {
    pub nonce: u64,
    /// Atomic units as a decimal string; "0" for token transfers.
    pub value: String,
    pub receiver: String,
    pub sender: String,
    #[serde(rename = "gasPrice")]
    pub gas_price: u64,
    #[serde(rename = "gasLimit")]
    pub gas_limit: u64,
    /// Base64 call payload; absent for native transfers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(rename = "chainID")]
    pub chain_id: String,
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

pub struct HttpLedgerClient {
    client: Client,
    api_url: String,
    token_identifier: Option<String>,
    chain_id: String,
    gas_price: u64,
    gas_limit: u64,
    denomination: f64,
    recent_signatures: RecentSignatures,
}

impl HttpLedgerClient {
    pub fn new(config: &LedgerConfig) -> Self {
        debug!("initializing ledger client for {}", config.api_url);
        Self {
            client: Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token_identifier: config.token_identifier.clone(),
            chain_id: config.chain_id.clone(),
            gas_price: config.gas_price,
            gas_limit: config.gas_limit,
            denomination: config.denomination,
            recent_signatures: RecentSignatures::new(SIGNATURE_GUARD_TTL),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = format!("{}/{}", self.api_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::ledger(format!("GET {} failed: {}", path, e)))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Error::ledger(format!(
                "GET {} returned {}",
                path,
                response.status()
            )));
        }
        let parsed = response
            .json::<T>()
            .await
            .map_err(|e| Error::ledger(format!("GET {} body malformed: {}", path, e)))?;
        Ok(Some(parsed))
    }

    async fn token_holding(&self, address: &str, token: &str) -> Result<Option<TokenHolding>> {
        self.get_json(&format!("accounts/{}/tokens/{}", address, token))
            .await
    }

    fn build_transfer(
        &self,
        nonce: u64,
        sender: &str,
        receiver: &str,
        amount: f64,
    ) -> TransferTransaction {
        let (value, data) = match &self.token_identifier {
            Some(token) => (
                "0".to_string(),
                Some(transfer_payload(token, amount, self.denomination)),
            ),
            None => (format!("{}", (self.denomination * amount) as u128), None),
        };
        TransferTransaction {
            nonce,
            value,
            receiver: receiver.to_string(),
            sender: sender.to_string(),
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            data,
            chain_id: self.chain_id.clone(),
            version: 1,
            signature: None,
        }
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn transaction_by_hash(&self, hash: &str) -> Result<Option<LedgerTransaction>> {
        self.get_json(&format!("transactions/{}", hash)).await
    }

    async fn account(&self, address: &str) -> Result<Option<LedgerAccount>> {
        self.get_json(&format!("accounts/{}", address)).await
    }

    async fn token_balance(&self, address: &str) -> Result<Option<f64>> {
        match &self.token_identifier {
            Some(token) => match self.token_holding(address, token).await? {
                Some(holding) => Ok(Some(holding.denominated()?)),
                None => Ok(None),
            },
            None => match self.account(address).await? {
                Some(account) => Ok(Some(account.denominated_balance(self.denomination)?)),
                None => Ok(None),
            },
        }
    }

    async fn send(&self, from: &SigningKey, to: &str, amount: f64) -> Result<()> {
        let Some(account) = self.account(&from.address).await? else {
            return Err(Error::ledger("sender account not found on the ledger"));
        };
        let balance = self.token_balance(&from.address).await?.unwrap_or(0.0);
        if balance < amount {
            return Err(Error::ledger("insufficient balance in sender wallet"));
        }

        let mut transaction = self.build_transfer(account.nonce, &from.address, to, amount);
        let signature = sign_transfer(&transaction, &from.secret_key)?;
        if !self.recent_signatures.record(&signature) {
            warn!(
                "transfer from {} resubmitted within {:?}, dropping",
                from.address, SIGNATURE_GUARD_TTL
            );
            return Err(Error::ledger(
                "too many transfer requests in a short period for one account",
            ));
        }
        transaction.signature = Some(signature);

        let response = self
            .client
            .post(format!("{}/transactions", self.api_url))
            .json(&transaction)
            .send()
            .await
            .map_err(|e| Error::ledger(format!("transaction submit failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(Error::ledger(format!(
                "transaction submit returned {}",
                response.status()
            )));
        }
        debug!("submitted transfer of {} from {} to {}", amount, from.address, to);
        Ok(())
    }
}

/// Signs the canonical JSON of the unsigned transfer; lowercase hex output.
fn sign_transfer(transaction: &TransferTransaction, secret_hex: &str) -> Result<String> {
    let secret =
        hex::decode(secret_hex).map_err(|_| Error::ledger("signing secret is not valid hex"))?;
    let secret: [u8; 32] = secret
        .try_into()
        .map_err(|_| Error::ledger("signing secret must be 32 bytes"))?;
    let key = ed25519_dalek::SigningKey::from_bytes(&secret);
    let doc = serde_json::to_vec(transaction)?;
    Ok(hex::encode(key.sign(&doc).to_bytes()))
}

/// `ESDTTransfer@<token-hex>@<amount-hex>`, base64-encoded. The amount hex
/// is left-padded to an even number of digits.
fn transfer_payload(token_identifier: &str, amount: f64, denomination: f64) -> String {
    let token_hex = hex::encode_upper(token_identifier.as_bytes());
    let mut amount_hex = format!("{:x}", (denomination * amount) as u128);
    if amount_hex.len() % 2 == 1 {
        amount_hex.insert(0, '0');
    }
    base64::encode(format!("ESDTTransfer@{}@{}", token_hex, amount_hex))
}

/// Sliding-window duplicate guard over submitted signatures.
struct RecentSignatures {
    ttl: Duration,
    seen: Mutex<HashMap<String, Instant>>,
}

impl RecentSignatures {
    fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Records `signature`; false when it was already recorded inside the
    /// TTL window.
    fn record(&self, signature: &str) -> bool {
        let mut seen = self.seen.lock().unwrap();
        let now = Instant::now();
        seen.retain(|_, at| now.duration_since(*at) < self.ttl);
        if seen.contains_key(signature) {
            return false;
        }
        seen.insert(signature.to_string(), now);
        true
    }
}
