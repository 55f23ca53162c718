use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::error::AppError;

/// Storage key of the session-analysis usage record.
pub const SESSION_USAGE_KEY: &str = "promptlens-session-usage";

/// Number of session analyses allowed per calendar day unless configured otherwise.
pub const DEFAULT_DAILY_LIMIT: u32 = 5;

/// Usage count for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyUsageCounter {
    /// Serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub count: u32,
}

impl DailyUsageCounter {
    pub fn fresh(date: NaiveDate) -> Self {
        Self { date, count: 0 }
    }
}

/// Key-value capability backing the usage record.
#[async_trait]
pub trait UsageStore: Send + Sync + 'static {
    /// Returns `None` when nothing usable is stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<DailyUsageCounter>, AppError>;

    async fn set(&self, key: &str, record: &DailyUsageCounter) -> Result<(), AppError>;
}

/// Process-local store. Records are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryUsageStore {
    records: Mutex<HashMap<String, DailyUsageCounter>>,
}

impl InMemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageStore for InMemoryUsageStore {
    async fn get(&self, key: &str) -> Result<Option<DailyUsageCounter>, AppError> {
        let records = self
            .records
            .lock()
            .map_err(|e| AppError::Internal(format!("Usage store lock poisoned: {}", e)))?;
        Ok(records.get(key).cloned())
    }

    async fn set(&self, key: &str, record: &DailyUsageCounter) -> Result<(), AppError> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| AppError::Internal(format!("Usage store lock poisoned: {}", e)))?;
        records.insert(key.to_string(), record.clone());
        Ok(())
    }
}

/// Source of the current calendar day.
pub trait Clock: Send + Sync + 'static {
    fn today(&self) -> NaiveDate;
}

/// Current UTC date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Remaining quota for today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub date: NaiveDate,
    pub limit: u32,
    pub used: u32,
    pub remaining: u32,
}

impl QuotaStatus {
    fn new(record: &DailyUsageCounter, limit: u32) -> Self {
        Self {
            date: record.date,
            limit,
            used: record.count,
            remaining: limit.saturating_sub(record.count),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

/// Daily cap on session analyses, backed by a [`UsageStore`].
///
/// The stored counter resets to zero whenever its date differs from today.
#[derive(Clone)]
pub struct DailyQuota {
    store: Arc<dyn UsageStore>,
    clock: Arc<dyn Clock>,
    limit: u32,
    key: String,
}

impl DailyQuota {
    /// Creates a new `DailyQuota`.
    ///
    /// # Arguments
    ///
    /// * `store` - Where the usage record lives.
    /// * `clock` - Supplies the current day.
    /// * `limit` - Analyses allowed per day.
    pub fn new(store: Arc<dyn UsageStore>, clock: Arc<dyn Clock>, limit: u32) -> Self {
        Self {
            store,
            clock,
            limit,
            key: SESSION_USAGE_KEY.to_string(),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Reads today's record, writing a fresh one when none exists or the day rolled over.
    async fn current_record(&self) -> Result<DailyUsageCounter, AppError> {
        let today = self.clock.today();
        match self.store.get(&self.key).await? {
            Some(record) if record.date == today => Ok(record),
            stale => {
                if let Some(old) = stale {
                    info!(previous = %old.date, today = %today, "Daily usage counter rolled over");
                }
                let record = DailyUsageCounter::fresh(today);
                self.store.set(&self.key, &record).await?;
                Ok(record)
            }
        }
    }

    pub async fn status(&self) -> Result<QuotaStatus, AppError> {
        let record = self.current_record().await?;
        Ok(QuotaStatus::new(&record, self.limit))
    }

    /// Fails with `QuotaExceeded` once today's count has reached the limit. Never increments.
    pub async fn ensure_available(&self) -> Result<QuotaStatus, AppError> {
        let status = self.status().await?;
        if status.used >= self.limit {
            return Err(AppError::QuotaExceeded { limit: self.limit });
        }
        Ok(status)
    }

    /// Counts one completed analysis against today.
    pub async fn record_use(&self) -> Result<QuotaStatus, AppError> {
        let mut record = self.current_record().await?;
        record.count = record.count.saturating_add(1);
        self.store.set(&self.key, &record).await?;
        debug!(date = %record.date, count = record.count, "Recorded session analysis");
        Ok(QuotaStatus::new(&record, self.limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClock(NaiveDate);

    impl Clock for FixedClock {
        fn today(&self) -> NaiveDate {
            self.0
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn quota(store: Arc<InMemoryUsageStore>, today: NaiveDate, limit: u32) -> DailyQuota {
        DailyQuota::new(store, Arc::new(FixedClock(today)), limit)
    }

    #[tokio::test]
    async fn test_quota_allows_uses_within_limit() {
        let quota = quota(Arc::new(InMemoryUsageStore::new()), day(19), 2);

        assert_eq!(quota.ensure_available().await.unwrap().remaining, 2);
        quota.record_use().await.unwrap();
        let status = quota.record_use().await.unwrap();
        assert_eq!(status.used, 2);
        assert!(status.is_exhausted());

        assert!(matches!(
            quota.ensure_available().await,
            Err(AppError::QuotaExceeded { limit: 2 })
        ));
    }

    #[tokio::test]
    async fn test_quota_resets_on_new_day() {
        let store = Arc::new(InMemoryUsageStore::new());
        store
            .set(SESSION_USAGE_KEY, &DailyUsageCounter { date: day(18), count: 5 })
            .await
            .unwrap();

        let quota = quota(store.clone(), day(19), 5);
        let status = quota.status().await.unwrap();
        assert_eq!(status.used, 0);
        assert_eq!(status.date, day(19));

        let stored = store.get(SESSION_USAGE_KEY).await.unwrap().unwrap();
        assert_eq!(stored, DailyUsageCounter::fresh(day(19)));
    }

    #[tokio::test]
    async fn test_ensure_available_does_not_increment() {
        let store = Arc::new(InMemoryUsageStore::new());
        let quota = quota(store.clone(), day(19), 5);
        for _ in 0..3 {
            quota.ensure_available().await.unwrap();
        }
        assert_eq!(quota.status().await.unwrap().used, 0);
    }

    #[test]
    fn test_record_serializes_iso_date() {
        let record = DailyUsageCounter { date: day(19), count: 3 };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["date"], "2026-10-19");
        assert_eq!(json["count"], 3);
    }
}
