pub mod config;
pub mod errors;
pub mod types;
pub mod utils;

pub use config::{CoreConfig, LedgerConfig, RewardConfig, StoreConfig};
pub use errors::{Error, ErrorKind, Result};
pub use types::*;
