//! Common data types used throughout the aironet system

pub mod key;
pub mod metric;
pub mod miner;
pub mod period;
pub mod transaction;

pub use key::{SigningKey, REWARD_KEY_TYPE};
pub use metric::{Metric, READY_STATE};
pub use miner::{Miner, NewMiner};
pub use period::RewardPeriod;
pub use transaction::{TransactionRecord, TxStatus, TxType};
