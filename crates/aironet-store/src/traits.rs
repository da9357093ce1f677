use async_trait::async_trait;

use aironet_common::types::{Metric, Miner, RewardPeriod, SigningKey, TransactionRecord, TxType};
use aironet_common::Result;

/// Sort direction over `timestamp_created`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Skip/limit paging with a sort direction. Listings sort on
/// `timestamp_created`; arbitrary-field sorting is the HTTP layer's concern.
#[derive(Debug, Clone)]
pub struct Page {
    pub skip: usize,
    pub limit: Option<usize>,
    pub order: SortOrder,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: None,
            order: SortOrder::Desc,
        }
    }
}

/// `$set`-style partial update of a miner; only the populated fields are
/// written. `wallet` takes `Some(None)` to unbind.
#[derive(Debug, Clone, Default)]
pub struct MinerUpdate {
    pub name: Option<String>,
    pub user_id: Option<String>,
    pub current_airo: Option<f64>,
    pub age_rate: Option<f64>,
    pub total_rewards: Option<f64>,
    pub wallet: Option<Option<String>>,
}

/// `$set`-style partial update of a reward period.
#[derive(Debug, Clone, Default)]
pub struct PeriodUpdate {
    pub total: Option<f64>,
    pub weekly_reward: Option<f64>,
    pub total_weeks: Option<i64>,
    pub weeks_left: Option<i64>,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    pub start_week: Option<i64>,
    pub end_week: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct MinerFilter {
    pub user_id: Option<String>,
    pub ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub user_id: Option<String>,
    pub miner_id: Option<String>,
    pub tx_type: Option<TxType>,
}

/// The storage capabilities the core requires, one typed method per query
/// shape. Backends must provide read-after-write consistency within one
/// process.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    // --- miners ---

    async fn insert_miner(&self, miner: Miner) -> Result<Miner>;

    async fn miner(&self, id: &str) -> Result<Option<Miner>>;

    async fn miner_by_serial(&self, serial_id: &str) -> Result<Option<Miner>>;

    async fn miner_by_wallet(&self, wallet: &str) -> Result<Option<Miner>>;

    /// Lookup by display name within one user's fleet.
    async fn miner_by_name(&self, user_id: &str, name: &str) -> Result<Option<Miner>>;

    async fn miners(&self, filter: MinerFilter, page: Page) -> Result<Vec<Miner>>;

    async fn count_miners(&self, filter: &MinerFilter) -> Result<u64>;

    /// Partial-field update; returns false when the miner does not exist.
    async fn update_miner(&self, id: &str, update: MinerUpdate) -> Result<bool>;

    async fn delete_miner(&self, id: &str) -> Result<bool>;

    // --- metrics ---

    async fn insert_metric(&self, metric: Metric) -> Result<Metric>;

    /// Ready-state samples for one miner since `since` (inclusive).
    async fn count_ready_metrics(&self, miner_id: &str, since: i64) -> Result<u64>;

    /// Distinct miner ids with a ready-state, user-attributed sample since
    /// `since` (inclusive).
    async fn active_miner_ids(&self, since: i64) -> Result<Vec<String>>;

    // --- reward periods ---

    async fn insert_period(&self, period: RewardPeriod) -> Result<RewardPeriod>;

    async fn period(&self, id: &str) -> Result<Option<RewardPeriod>>;

    /// The period running right now with windows left, if any.
    async fn active_period(&self, now: i64) -> Result<Option<RewardPeriod>>;

    /// The nearest future period with windows left, if any.
    async fn upcoming_period(&self, now: i64) -> Result<Option<RewardPeriod>>;

    /// Periods with `weeks_left >= 0`; the creation invariant allows at
    /// most one.
    async fn count_open_periods(&self) -> Result<u64>;

    async fn periods(&self, page: Page) -> Result<Vec<RewardPeriod>>;

    async fn update_period(&self, id: &str, update: PeriodUpdate) -> Result<bool>;

    async fn delete_period(&self, id: &str) -> Result<bool>;

    // --- transaction records ---

    async fn insert_transaction(&self, record: TransactionRecord) -> Result<TransactionRecord>;

    async fn transaction(&self, id: &str) -> Result<Option<TransactionRecord>>;

    /// TOP-UP record carrying this ledger hash, across all miners.
    async fn top_up_by_hash(&self, tx_hash: &str) -> Result<Option<TransactionRecord>>;

    async fn transactions(
        &self,
        filter: TransactionFilter,
        page: Page,
    ) -> Result<Vec<TransactionRecord>>;

    async fn count_transactions(&self, filter: &TransactionFilter) -> Result<u64>;

    // --- signing keys ---

    async fn insert_key(&self, key: SigningKey) -> Result<SigningKey>;

    async fn signing_key(&self, key_type: &str) -> Result<Option<SigningKey>>;
}
