//! This is the aironet-ledger crate - the external-ledger client contract,
//! its wire types, an HTTP client for a MultiversX-style REST API, and a
//! scriptable mock for tests.

pub mod client;
pub mod http;
pub mod mock;
pub mod types;

pub use client::LedgerClient;
pub use http::HttpLedgerClient;
pub use mock::{MockLedger, SentTransfer};
pub use types::{LedgerAccount, LedgerTransaction, TokenHolding, TokenOperation};
