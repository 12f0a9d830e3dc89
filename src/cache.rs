use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::Result;
use crate::models::StudentTable;

#[derive(Debug, Clone)]
pub struct CachedTable {
    pub captured_at: DateTime<Utc>,
    pub table: Arc<StudentTable>,
}

/// Holds the most recently loaded table for a fixed time-to-live. Published
/// tables are immutable and handed out as shared `Arc`s.
#[derive(Debug)]
pub struct TableCache {
    ttl: Duration,
    slot: Mutex<Option<CachedTable>>,
}

impl TableCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// The cached table if it was captured less than `ttl` before `now`.
    pub fn get(&self, now: DateTime<Utc>) -> Option<Arc<StudentTable>> {
        let guard = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match guard.as_ref() {
            Some(cached) if !self.is_expired(cached, now) => Some(Arc::clone(&cached.table)),
            Some(cached) => {
                debug!(captured_at = %cached.captured_at, "cached student table expired");
                None
            }
            None => None,
        }
    }

    pub fn put(&self, table: StudentTable, now: DateTime<Utc>) -> Arc<StudentTable> {
        let table = Arc::new(table);
        let mut guard = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(CachedTable {
            captured_at: now,
            table: Arc::clone(&table),
        });
        table
    }

    /// Returns the fresh cached table, or runs `load` and publishes its result.
    /// A failed load is returned as-is and leaves the cache untouched.
    pub async fn get_or_load<F, Fut>(&self, now: DateTime<Utc>, load: F) -> Result<Arc<StudentTable>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<StudentTable>>,
    {
        if let Some(table) = self.get(now) {
            debug!(rows = table.len(), "student table cache hit");
            return Ok(table);
        }
        debug!("student table cache miss, loading");
        let table = load().await?;
        Ok(self.put(table, now))
    }

    fn is_expired(&self, cached: &CachedTable, now: DateTime<Utc>) -> bool {
        // Clock skew backwards leaves the entry fresh.
        (now - cached.captured_at)
            .to_std()
            .map(|age| age >= self.ttl)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::error::Error;
    use crate::models::fixtures::student;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_760_000_000 + secs, 0).unwrap()
    }

    fn sample_table() -> StudentTable {
        StudentTable::new(vec![student(1, "CS", "F", "Pune")])
    }

    #[test]
    fn entry_expires_after_ttl() {
        let cache = TableCache::new(Duration::from_secs(600));
        cache.put(sample_table(), at(0));
        assert!(cache.get(at(599)).is_some());
        assert!(cache.get(at(600)).is_none());
    }

    #[tokio::test]
    async fn get_or_load_reuses_fresh_table() {
        let cache = TableCache::new(Duration::from_secs(600));
        let first = cache
            .get_or_load(at(0), || async { Ok(sample_table()) })
            .await
            .unwrap();
        let second = cache
            .get_or_load(at(10), || async { Ok(StudentTable::default()) })
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);
    }

    #[tokio::test]
    async fn get_or_load_reloads_after_expiry() {
        let cache = TableCache::new(Duration::from_secs(5));
        let first = cache
            .get_or_load(at(0), || async { Ok(sample_table()) })
            .await
            .unwrap();
        let second = cache
            .get_or_load(at(5), || async { Ok(StudentTable::default()) })
            .await
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn failed_load_is_surfaced() {
        let cache = TableCache::new(Duration::from_secs(5));
        let result = cache
            .get_or_load(at(0), || async {
                Err(Error::data_source("store unreachable", sqlx::Error::PoolTimedOut))
            })
            .await;
        assert!(matches!(result, Err(Error::DataSource { .. })));
        assert!(cache.get(at(0)).is_none());
    }
}
