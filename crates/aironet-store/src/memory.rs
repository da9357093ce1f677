//! Embedded in-memory backend
//!
//! Keeps every collection in a `tokio::sync::RwLock`-guarded map. The node
//! binary runs against this backend by default; read-after-write consistency
//! holds by construction.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use aironet_common::config::StoreConfig;
use aironet_common::types::{Metric, Miner, RewardPeriod, SigningKey, TransactionRecord};
use aironet_common::utils::time::current_timestamp;
use aironet_common::{Error, Result};

use crate::traits::{
    MinerFilter, MinerUpdate, Page, PeriodUpdate, SortOrder, Store, TransactionFilter,
};

#[derive(Default)]
pub struct MemoryStore {
    miners: RwLock<HashMap<String, Miner>>,
    metrics: RwLock<Vec<Metric>>,
    periods: RwLock<HashMap<String, RewardPeriod>>,
    transactions: RwLock<HashMap<String, TransactionRecord>>,
    // Keyed by key type; one key per type.
    keys: RwLock<HashMap<String, SigningKey>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the backend for the node binary. The data directory is
    /// created up front; a persistent backend takes over the same
    /// contract.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        Ok(Self::new())
    }
}

fn paged<T>(mut items: Vec<T>, page: &Page, created: impl Fn(&T) -> i64) -> Vec<T> {
    items.sort_by_key(&created);
    if page.order == SortOrder::Desc {
        items.reverse();
    }
    items
        .into_iter()
        .skip(page.skip)
        .take(page.limit.unwrap_or(usize::MAX))
        .collect()
}

fn matches_miner(filter: &MinerFilter, miner: &Miner) -> bool {
    if let Some(user_id) = &filter.user_id {
        if miner.user_id.as_deref() != Some(user_id.as_str()) {
            return false;
        }
    }
    if let Some(ids) = &filter.ids {
        if !ids.iter().any(|id| id == &miner.id) {
            return false;
        }
    }
    true
}

fn matches_transaction(filter: &TransactionFilter, record: &TransactionRecord) -> bool {
    if let Some(user_id) = &filter.user_id {
        if record.user_id.as_deref() != Some(user_id.as_str()) {
            return false;
        }
    }
    if let Some(miner_id) = &filter.miner_id {
        if &record.miner_id != miner_id {
            return false;
        }
    }
    if let Some(tx_type) = filter.tx_type {
        if record.tx_type != tx_type {
            return false;
        }
    }
    true
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_miner(&self, miner: Miner) -> Result<Miner> {
        let mut miners = self.miners.write().await;
        if miners.values().any(|m| m.serial_id == miner.serial_id) {
            return Err(Error::validation(format!(
                "serial id {} is already registered",
                miner.serial_id
            )));
        }
        miners.insert(miner.id.clone(), miner.clone());
        Ok(miner)
    }

    async fn miner(&self, id: &str) -> Result<Option<Miner>> {
        Ok(self.miners.read().await.get(id).cloned())
    }

    async fn miner_by_serial(&self, serial_id: &str) -> Result<Option<Miner>> {
        let miners = self.miners.read().await;
        Ok(miners.values().find(|m| m.serial_id == serial_id).cloned())
    }

    async fn miner_by_wallet(&self, wallet: &str) -> Result<Option<Miner>> {
        let miners = self.miners.read().await;
        Ok(miners
            .values()
            .find(|m| m.wallet.as_deref() == Some(wallet))
            .cloned())
    }

    async fn miner_by_name(&self, user_id: &str, name: &str) -> Result<Option<Miner>> {
        let miners = self.miners.read().await;
        Ok(miners
            .values()
            .find(|m| m.user_id.as_deref() == Some(user_id) && m.name == name)
            .cloned())
    }

    async fn miners(&self, filter: MinerFilter, page: Page) -> Result<Vec<Miner>> {
        let miners = self.miners.read().await;
        let matched: Vec<Miner> = miners
            .values()
            .filter(|m| matches_miner(&filter, m))
            .cloned()
            .collect();
        Ok(paged(matched, &page, |m| m.timestamp_created))
    }

    async fn count_miners(&self, filter: &MinerFilter) -> Result<u64> {
        let miners = self.miners.read().await;
        Ok(miners.values().filter(|m| matches_miner(filter, m)).count() as u64)
    }

    async fn update_miner(&self, id: &str, update: MinerUpdate) -> Result<bool> {
        let mut miners = self.miners.write().await;
        let Some(miner) = miners.get_mut(id) else {
            return Ok(false);
        };
        if let Some(name) = update.name {
            miner.name = name;
        }
        if let Some(user_id) = update.user_id {
            miner.user_id = Some(user_id);
        }
        if let Some(current_airo) = update.current_airo {
            miner.current_airo = current_airo;
        }
        if let Some(age_rate) = update.age_rate {
            miner.age_rate = age_rate;
        }
        if let Some(total_rewards) = update.total_rewards {
            miner.total_rewards = total_rewards;
        }
        if let Some(wallet) = update.wallet {
            miner.wallet = wallet;
        }
        miner.timestamp_updated = current_timestamp();
        Ok(true)
    }

    async fn delete_miner(&self, id: &str) -> Result<bool> {
        Ok(self.miners.write().await.remove(id).is_some())
    }

    async fn insert_metric(&self, metric: Metric) -> Result<Metric> {
        self.metrics.write().await.push(metric.clone());
        Ok(metric)
    }

    async fn count_ready_metrics(&self, miner_id: &str, since: i64) -> Result<u64> {
        let metrics = self.metrics.read().await;
        Ok(metrics
            .iter()
            .filter(|m| m.miner_id == miner_id && m.is_ready() && m.timestamp_created >= since)
            .count() as u64)
    }

    async fn active_miner_ids(&self, since: i64) -> Result<Vec<String>> {
        let metrics = self.metrics.read().await;
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for metric in metrics.iter() {
            if metric.is_ready()
                && metric.has_user
                && metric.timestamp_created >= since
                && seen.insert(metric.miner_id.clone())
            {
                ids.push(metric.miner_id.clone());
            }
        }
        Ok(ids)
    }

    async fn insert_period(&self, period: RewardPeriod) -> Result<RewardPeriod> {
        let mut periods = self.periods.write().await;
        periods.insert(period.id.clone(), period.clone());
        Ok(period)
    }

    async fn period(&self, id: &str) -> Result<Option<RewardPeriod>> {
        Ok(self.periods.read().await.get(id).cloned())
    }

    async fn active_period(&self, now: i64) -> Result<Option<RewardPeriod>> {
        let periods = self.periods.read().await;
        Ok(periods
            .values()
            .filter(|p| p.is_active(now))
            .min_by_key(|p| p.start_date)
            .cloned())
    }

    async fn upcoming_period(&self, now: i64) -> Result<Option<RewardPeriod>> {
        let periods = self.periods.read().await;
        Ok(periods
            .values()
            .filter(|p| p.is_upcoming(now))
            .min_by_key(|p| p.start_date)
            .cloned())
    }

    async fn count_open_periods(&self) -> Result<u64> {
        let periods = self.periods.read().await;
        Ok(periods.values().filter(|p| p.weeks_left >= 0).count() as u64)
    }

    async fn periods(&self, page: Page) -> Result<Vec<RewardPeriod>> {
        let periods = self.periods.read().await;
        let all: Vec<RewardPeriod> = periods.values().cloned().collect();
        Ok(paged(all, &page, |p| p.timestamp_created))
    }

    async fn update_period(&self, id: &str, update: PeriodUpdate) -> Result<bool> {
        let mut periods = self.periods.write().await;
        let Some(period) = periods.get_mut(id) else {
            return Ok(false);
        };
        if let Some(total) = update.total {
            period.total = total;
        }
        if let Some(weekly_reward) = update.weekly_reward {
            period.weekly_reward = weekly_reward;
        }
        if let Some(total_weeks) = update.total_weeks {
            period.total_weeks = total_weeks;
        }
        if let Some(weeks_left) = update.weeks_left {
            period.weeks_left = weeks_left;
        }
        if let Some(start_date) = update.start_date {
            period.start_date = start_date;
        }
        if let Some(end_date) = update.end_date {
            period.end_date = end_date;
        }
        if let Some(start_week) = update.start_week {
            period.start_week = start_week;
        }
        if let Some(end_week) = update.end_week {
            period.end_week = end_week;
        }
        period.timestamp_updated = current_timestamp();
        Ok(true)
    }

    async fn delete_period(&self, id: &str) -> Result<bool> {
        Ok(self.periods.write().await.remove(id).is_some())
    }

    async fn insert_transaction(&self, record: TransactionRecord) -> Result<TransactionRecord> {
        let mut transactions = self.transactions.write().await;
        transactions.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn transaction(&self, id: &str) -> Result<Option<TransactionRecord>> {
        Ok(self.transactions.read().await.get(id).cloned())
    }

    async fn top_up_by_hash(&self, tx_hash: &str) -> Result<Option<TransactionRecord>> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .values()
            .find(|t| t.tx_hash.as_deref() == Some(tx_hash))
            .cloned())
    }

    async fn transactions(
        &self,
        filter: TransactionFilter,
        page: Page,
    ) -> Result<Vec<TransactionRecord>> {
        let transactions = self.transactions.read().await;
        let matched: Vec<TransactionRecord> = transactions
            .values()
            .filter(|t| matches_transaction(&filter, t))
            .cloned()
            .collect();
        Ok(paged(matched, &page, |t| t.timestamp_created))
    }

    async fn count_transactions(&self, filter: &TransactionFilter) -> Result<u64> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .values()
            .filter(|t| matches_transaction(filter, t))
            .count() as u64)
    }

    async fn insert_key(&self, key: SigningKey) -> Result<SigningKey> {
        let mut keys = self.keys.write().await;
        if keys.contains_key(&key.key_type) {
            return Err(Error::validation(format!(
                "a {} key is already stored",
                key.key_type
            )));
        }
        keys.insert(key.key_type.clone(), key.clone());
        Ok(key)
    }

    async fn signing_key(&self, key_type: &str) -> Result<Option<SigningKey>> {
        Ok(self.keys.read().await.get(key_type).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aironet_common::types::{NewMiner, TxType};

    fn miner_with_serial(serial: &str) -> Miner {
        NewMiner {
            serial_id: serial.to_string(),
            ..Default::default()
        }
        .into_miner()
    }

    #[tokio::test]
    async fn serial_ids_are_unique() {
        let store = MemoryStore::new();
        store.insert_miner(miner_with_serial("SN-1")).await.unwrap();

        let err = store
            .insert_miner(miner_with_serial("SN-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        store.insert_miner(miner_with_serial("SN-2")).await.unwrap();
        assert_eq!(store.count_miners(&MinerFilter::default()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn update_patches_only_named_fields() {
        let store = MemoryStore::new();
        let mut miner = miner_with_serial("SN-1");
        miner.current_airo = 4.0;
        miner.wallet = Some("erd1wallet".to_string());
        let id = store.insert_miner(miner).await.unwrap().id;

        let updated = store
            .update_miner(
                &id,
                MinerUpdate {
                    current_airo: Some(9.5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated);

        let miner = store.miner(&id).await.unwrap().unwrap();
        assert_eq!(miner.current_airo, 9.5);
        // untouched fields survive the patch
        assert_eq!(miner.wallet.as_deref(), Some("erd1wallet"));
        assert_eq!(miner.age_rate, 100.0);

        // unbinding goes through the outer Option
        store
            .update_miner(
                &id,
                MinerUpdate {
                    wallet: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(store.miner(&id).await.unwrap().unwrap().wallet.is_none());

        assert!(!store
            .update_miner("missing", MinerUpdate::default())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn top_up_hash_lookup_spans_all_miners() {
        let store = MemoryStore::new();
        let record = TransactionRecord::top_up("m1", Some("u1"), 3.0, "hash-a", "erd1x", "erd1y");
        store.insert_transaction(record).await.unwrap();

        // same hash found even when another miner asks
        let found = store.top_up_by_hash("hash-a").await.unwrap();
        assert_eq!(found.unwrap().miner_id, "m1");
        assert!(store.top_up_by_hash("hash-b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn metric_window_is_inclusive_and_filters_state() {
        let store = MemoryStore::new();
        store.insert_metric(Metric::ready("m1", 100)).await.unwrap();
        store.insert_metric(Metric::ready("m1", 200)).await.unwrap();
        let mut off = Metric::ready("m1", 250);
        off.state = "off".to_string();
        store.insert_metric(off).await.unwrap();
        let mut unclaimed = Metric::ready("m2", 300);
        unclaimed.has_user = false;
        store.insert_metric(unclaimed).await.unwrap();
        store.insert_metric(Metric::ready("m3", 99)).await.unwrap();

        assert_eq!(store.count_ready_metrics("m1", 100).await.unwrap(), 2);
        assert_eq!(store.count_ready_metrics("m1", 200).await.unwrap(), 1);

        // active set: ready, claimed, inside the window
        let active = store.active_miner_ids(100).await.unwrap();
        assert_eq!(active, vec!["m1".to_string()]);
    }

    #[tokio::test]
    async fn one_open_period_blocks_further_creation() {
        let store = MemoryStore::new();
        let now = current_timestamp();
        let period = RewardPeriod {
            id: "p1".to_string(),
            total: 700.0,
            weekly_reward: 100.0,
            total_weeks: 7,
            weeks_left: 0,
            start_date: now - 5_000,
            end_date: now - 1_000,
            start_week: now - 5_000,
            end_week: now - 4_400,
            timestamp_created: now - 5_000,
            timestamp_updated: now - 1_000,
        };
        store.insert_period(period).await.unwrap();

        // a finished period still counts until the admin removes it
        assert_eq!(store.count_open_periods().await.unwrap(), 1);
        assert!(store.active_period(now).await.unwrap().is_none());

        assert!(store.delete_period("p1").await.unwrap());
        assert_eq!(store.count_open_periods().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn active_and_upcoming_periods_resolve_by_start_date() {
        let store = MemoryStore::new();
        let now = 1_000_000;
        let base = RewardPeriod {
            id: String::new(),
            total: 700.0,
            weekly_reward: 100.0,
            total_weeks: 7,
            weeks_left: 7,
            start_date: 0,
            end_date: 0,
            start_week: 0,
            end_week: 0,
            timestamp_created: now,
            timestamp_updated: now,
        };

        let running = RewardPeriod {
            id: "running".to_string(),
            start_date: now - 600,
            end_date: now + 600,
            ..base.clone()
        };
        let later = RewardPeriod {
            id: "later".to_string(),
            start_date: now + 5_000,
            end_date: now + 9_000,
            ..base.clone()
        };
        let soon = RewardPeriod {
            id: "soon".to_string(),
            start_date: now + 1_000,
            end_date: now + 4_000,
            ..base
        };
        store.insert_period(running).await.unwrap();
        store.insert_period(later).await.unwrap();
        store.insert_period(soon).await.unwrap();

        assert_eq!(store.active_period(now).await.unwrap().unwrap().id, "running");
        assert_eq!(store.upcoming_period(now).await.unwrap().unwrap().id, "soon");
    }

    #[tokio::test]
    async fn listings_sort_and_page_on_creation_time() {
        let store = MemoryStore::new();
        for (i, serial) in ["SN-1", "SN-2", "SN-3"].iter().enumerate() {
            let mut miner = miner_with_serial(serial);
            miner.timestamp_created = 1_000 + i as i64;
            store.insert_miner(miner).await.unwrap();
        }

        let newest_first = store
            .miners(MinerFilter::default(), Page::default())
            .await
            .unwrap();
        let serials: Vec<&str> = newest_first.iter().map(|m| m.serial_id.as_str()).collect();
        assert_eq!(serials, vec!["SN-3", "SN-2", "SN-1"]);

        let middle = store
            .miners(
                MinerFilter::default(),
                Page {
                    skip: 1,
                    limit: Some(1),
                    order: SortOrder::Asc,
                },
            )
            .await
            .unwrap();
        assert_eq!(middle.len(), 1);
        assert_eq!(middle[0].serial_id, "SN-2");
    }

    #[tokio::test]
    async fn transaction_filters_compose() {
        let store = MemoryStore::new();
        store
            .insert_transaction(TransactionRecord::reward("m1", Some("u1"), 1.0))
            .await
            .unwrap();
        store
            .insert_transaction(TransactionRecord::withdraw(
                "m1",
                Some("u1"),
                2.0,
                "erd1a",
                "erd1b",
            ))
            .await
            .unwrap();
        store
            .insert_transaction(TransactionRecord::reward("m2", Some("u2"), 3.0))
            .await
            .unwrap();

        let filter = TransactionFilter {
            user_id: Some("u1".to_string()),
            tx_type: Some(TxType::Reward),
            ..Default::default()
        };
        let rows = store
            .transactions(filter.clone(), Page::default())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].miner_id, "m1");
        assert_eq!(store.count_transactions(&filter).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn one_signing_key_per_type() {
        let store = MemoryStore::new();
        store
            .insert_key(SigningKey::reward("erd1reward", "aa".repeat(32)))
            .await
            .unwrap();
        let err = store
            .insert_key(SigningKey::reward("erd1other", "bb".repeat(32)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let key = store
            .signing_key(aironet_common::types::REWARD_KEY_TYPE)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(key.address, "erd1reward");
    }
}
