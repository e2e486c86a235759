//! Time-bounded response cache on top of session storage
//!
//! Every entry shares one TTL. An entry is valid while `now - stored_at < ttl`;
//! expired entries are removed when a lookup notices them or when a sweep runs.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::key::{CACHE_PREFIX, Params, cache_key, domain_of};
use crate::clock::Clock;
use crate::domain::Domain;
use crate::error::StorageError;
use crate::storage::SessionStorage;

/// Persisted value shape
#[derive(Debug, Serialize, Deserialize)]
struct CachedPayload {
    data: Value,
    timestamp: i64,
}

impl CachedPayload {
    /// Age in millis if it is below `ttl`. A stamp too far from `now` to
    /// subtract counts as stale.
    fn fresh_age(&self, now: i64, ttl: i64) -> Option<i64> {
        now.checked_sub(self.timestamp).filter(|age| *age < ttl)
    }
}

/// Response cache shared by every gateway call
pub struct CacheStore {
    storage: Arc<SessionStorage>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    pub fn new(storage: Arc<SessionStorage>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn ttl_millis(&self) -> i64 {
        self.ttl.as_millis() as i64
    }

    /// Look up a payload. Misses on absent, expired or unreadable entries;
    /// an expired entry is removed as a side effect.
    pub fn get(&self, operation: &str, params: &Params, domain: Domain) -> Option<Value> {
        let key = cache_key(operation, params, domain);

        let raw = match self.storage.get_item(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Cache read error for {}: {}", operation, e);
                return None;
            }
        };

        let cached: CachedPayload = match serde_json::from_str(&raw) {
            Ok(cached) => cached,
            Err(e) => {
                log::warn!("Cache parse error for {}: {}", operation, e);
                return None;
            }
        };

        if let Some(age) = cached.fresh_age(self.clock.now_millis(), self.ttl_millis()) {
            log::debug!(
                "Cache hit: {} ({}) - age: {}s",
                operation,
                domain,
                age / 1000
            );
            Some(cached.data)
        } else {
            log::debug!("Cache expired: {} ({})", operation, domain);
            if let Err(e) = self.storage.remove_item(&key) {
                log::warn!("Failed to remove expired cache entry: {}", e);
            }
            None
        }
    }

    /// Store a payload stamped with the current time.
    ///
    /// When storage is full, expired entries are swept and the write retried
    /// once. Failures are logged, never returned.
    pub fn set(&self, operation: &str, params: &Params, domain: Domain, payload: &Value) {
        let key = cache_key(operation, params, domain);
        let cached = CachedPayload {
            data: payload.clone(),
            timestamp: self.clock.now_millis(),
        };
        let raw = match serde_json::to_string(&cached) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Cache serialize error for {}: {}", operation, e);
                return;
            }
        };

        match self.storage.set_item(&key, &raw) {
            Ok(()) => log::debug!("Cache set: {} ({})", operation, domain),
            Err(StorageError::QuotaExceeded { .. }) => {
                let swept = self.sweep_expired();
                log::debug!("Storage full, swept {} expired entries", swept);
                if let Err(e) = self.storage.set_item(&key, &raw) {
                    log::warn!("Cache set failed after sweep for {}: {}", operation, e);
                }
            }
            Err(e) => log::warn!("Cache set error for {}: {}", operation, e),
        }
    }

    /// Remove cached entries for one domain, or for all domains when `None`.
    /// Returns how many entries were removed.
    pub fn invalidate(&self, domain: Option<Domain>) -> usize {
        let keys = match self.storage.keys_with_prefix(CACHE_PREFIX) {
            Ok(keys) => keys,
            Err(e) => {
                log::warn!("Cache invalidation failed: {}", e);
                return 0;
            }
        };

        let doomed: Vec<String> = keys
            .into_iter()
            .filter(|key| match domain {
                Some(d) => domain_of(key) == Some(d.as_str()),
                None => true,
            })
            .collect();

        let removed = self.storage.remove_items(&doomed).unwrap_or_else(|e| {
            log::warn!("Cache invalidation failed: {}", e);
            0
        });
        log::debug!(
            "Cache invalidated: {} ({} entries)",
            domain.map(|d| d.as_str()).unwrap_or("ALL"),
            removed
        );
        removed
    }

    /// Remove every expired or unreadable entry. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let entries = match self.storage.entries_with_prefix(CACHE_PREFIX) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Cache sweep failed: {}", e);
                return 0;
            }
        };

        let now = self.clock.now_millis();
        let ttl = self.ttl_millis();
        let doomed: Vec<String> = entries
            .into_iter()
            .filter(|(_, raw)| match serde_json::from_str::<CachedPayload>(raw) {
                Ok(cached) => cached.fresh_age(now, ttl).is_none(),
                Err(_) => true,
            })
            .map(|(key, _)| key)
            .collect();

        self.storage.remove_items(&doomed).unwrap_or_else(|e| {
            log::warn!("Cache sweep failed: {}", e);
            0
        })
    }

    /// Get cache statistics
    pub fn stats(&self) -> Result<CacheStats, StorageError> {
        let entries = self.storage.entries_with_prefix(CACHE_PREFIX)?;
        let now = self.clock.now_millis();
        let ttl = self.ttl_millis();

        let mut stats = CacheStats {
            used_bytes: self.storage.used_bytes()?,
            quota_bytes: self.storage.quota(),
            ..CacheStats::default()
        };

        for (key, raw) in &entries {
            stats.total_entries += 1;
            let valid = serde_json::from_str::<CachedPayload>(raw)
                .is_ok_and(|cached| cached.fresh_age(now, ttl).is_some());
            if valid {
                stats.valid_entries += 1;
            } else {
                stats.expired_entries += 1;
            }
            if let Some(domain) = domain_of(key) {
                *stats.per_domain.entry(domain.to_string()).or_insert(0) += 1;
            }
        }

        Ok(stats)
    }
}

/// Statistics about cache state
#[derive(Debug, Default, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    pub used_bytes: u64,
    pub quota_bytes: u64,
    pub per_domain: BTreeMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::DEFAULT_QUOTA_BYTES;
    use serde_json::json;

    const TTL: Duration = Duration::from_secs(5 * 60);

    fn test_cache(quota: u64) -> (CacheStore, Arc<SessionStorage>, Arc<ManualClock>) {
        let storage = Arc::new(SessionStorage::open_in_memory(quota).unwrap());
        let clock = Arc::new(ManualClock::at(0));
        let cache = CacheStore::new(storage.clone(), TTL, clock.clone());
        (cache, storage, clock)
    }

    fn month(m: &str) -> Params {
        let mut params = Params::new();
        params.insert("bulan".to_string(), json!(m));
        params
    }

    #[test]
    fn test_set_then_get() {
        let (cache, _, _) = test_cache(DEFAULT_QUOTA_BYTES);
        let rows = json!([{"kode": "BRG-001", "stok": 12}]);

        cache.set("readMasterBarang", &Params::new(), Domain::Wisuda, &rows);

        assert_eq!(
            cache.get("readMasterBarang", &Params::new(), Domain::Wisuda),
            Some(rows)
        );
        assert_eq!(
            cache.get("readMasterBarang", &Params::new(), Domain::Sosprom),
            None
        );
    }

    #[test]
    fn test_ttl_boundary() {
        let (cache, storage, clock) = test_cache(DEFAULT_QUOTA_BYTES);
        cache.set("readAudit", &Params::new(), Domain::Wisuda, &json!(["a"]));

        clock.set(299_999);
        assert!(cache.get("readAudit", &Params::new(), Domain::Wisuda).is_some());

        clock.set(300_000);
        assert!(cache.get("readAudit", &Params::new(), Domain::Wisuda).is_none());

        // The expired entry was removed, not just hidden
        let key = cache_key("readAudit", &Params::new(), Domain::Wisuda);
        assert_eq!(storage.get_item(&key).unwrap(), None);
    }

    #[test]
    fn test_params_distinguish_entries() {
        let (cache, _, _) = test_cache(DEFAULT_QUOTA_BYTES);
        cache.set("readBarangMasuk", &month("05"), Domain::Wisuda, &json!([5]));
        cache.set("readBarangMasuk", &month("06"), Domain::Wisuda, &json!([6]));

        assert_eq!(
            cache.get("readBarangMasuk", &month("05"), Domain::Wisuda),
            Some(json!([5]))
        );
        assert_eq!(
            cache.get("readBarangMasuk", &month("06"), Domain::Wisuda),
            Some(json!([6]))
        );
    }

    #[test]
    fn test_null_payload_is_a_hit() {
        let (cache, _, _) = test_cache(DEFAULT_QUOTA_BYTES);
        cache.set("readAdmin", &Params::new(), Domain::Wisuda, &Value::Null);

        assert_eq!(
            cache.get("readAdmin", &Params::new(), Domain::Wisuda),
            Some(Value::Null)
        );
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let (cache, storage, _) = test_cache(DEFAULT_QUOTA_BYTES);
        let key = cache_key("readAdmin", &Params::new(), Domain::Wisuda);
        storage.set_item(&key, "not json").unwrap();

        assert_eq!(cache.get("readAdmin", &Params::new(), Domain::Wisuda), None);
    }

    #[test]
    fn test_out_of_range_timestamp_is_expired() {
        let (cache, storage, _) = test_cache(DEFAULT_QUOTA_BYTES);
        let key = cache_key("readAdmin", &Params::new(), Domain::Wisuda);
        let raw = r#"{"data":1,"timestamp":-9223372036854775808}"#;

        storage.set_item(&key, raw).unwrap();
        assert_eq!(cache.get("readAdmin", &Params::new(), Domain::Wisuda), None);
        assert_eq!(storage.get_item(&key).unwrap(), None);

        storage.set_item(&key, raw).unwrap();
        let stats = cache.stats().unwrap();
        assert_eq!(stats.valid_entries, 0);
        assert_eq!(stats.expired_entries, 1);

        assert_eq!(cache.sweep_expired(), 1);
        assert_eq!(storage.get_item(&key).unwrap(), None);
    }

    #[test]
    fn test_invalidate_single_domain() {
        let (cache, _, _) = test_cache(DEFAULT_QUOTA_BYTES);
        cache.set("readMasterBarang", &Params::new(), Domain::Wisuda, &json!(1));
        cache.set("readAudit", &month("01"), Domain::Wisuda, &json!(2));
        cache.set("readMasterBarang", &Params::new(), Domain::Sosprom, &json!(3));

        assert_eq!(cache.invalidate(Some(Domain::Wisuda)), 2);

        assert!(cache.get("readMasterBarang", &Params::new(), Domain::Wisuda).is_none());
        assert!(cache.get("readAudit", &month("01"), Domain::Wisuda).is_none());
        assert_eq!(
            cache.get("readMasterBarang", &Params::new(), Domain::Sosprom),
            Some(json!(3))
        );
    }

    #[test]
    fn test_invalidate_with_brace_in_operation_name() {
        let (cache, _, _) = test_cache(DEFAULT_QUOTA_BYTES);
        cache.set("read_wisuda_{x", &Params::new(), Domain::Sosprom, &json!(1));
        cache.set("readAdmin", &Params::new(), Domain::Wisuda, &json!(2));

        assert_eq!(cache.invalidate(Some(Domain::Wisuda)), 1);
        assert_eq!(
            cache.get("read_wisuda_{x", &Params::new(), Domain::Sosprom),
            Some(json!(1))
        );

        assert_eq!(cache.invalidate(Some(Domain::Sosprom)), 1);
        assert!(cache.get("read_wisuda_{x", &Params::new(), Domain::Sosprom).is_none());
    }

    #[test]
    fn test_invalidate_all_leaves_other_keys() {
        let (cache, storage, _) = test_cache(DEFAULT_QUOTA_BYTES);
        storage.set_item("siwaras_user", "budi").unwrap();
        cache.set("a", &Params::new(), Domain::Wisuda, &json!(1));
        cache.set("b", &Params::new(), Domain::Sosprom, &json!(2));

        assert_eq!(cache.invalidate(None), 2);
        assert_eq!(
            storage.get_item("siwaras_user").unwrap(),
            Some("budi".to_string())
        );
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let (cache, storage, clock) = test_cache(DEFAULT_QUOTA_BYTES);
        cache.set("old", &Params::new(), Domain::Wisuda, &json!(1));
        clock.set(200_000);
        cache.set("fresh", &Params::new(), Domain::Wisuda, &json!(2));
        storage
            .set_item(&cache_key("junk", &Params::new(), Domain::Wisuda), "{")
            .unwrap();

        clock.set(300_000);
        assert_eq!(cache.sweep_expired(), 2);

        assert!(cache.get("fresh", &Params::new(), Domain::Wisuda).is_some());
    }

    #[test]
    fn test_set_sweeps_and_retries_when_full() {
        let (cache, _, clock) = test_cache(160);
        cache.set("readOld", &Params::new(), Domain::Wisuda, &json!("x".repeat(60)));

        clock.set(TTL.as_millis() as i64 + 1);
        // Does not fit next to the stale entry, fits once it is swept
        cache.set("readNew", &Params::new(), Domain::Wisuda, &json!("y".repeat(60)));

        assert!(cache.get("readNew", &Params::new(), Domain::Wisuda).is_some());
    }

    #[test]
    fn test_set_swallows_second_failure() {
        let (cache, _, _) = test_cache(32);

        // Far larger than the quota: both attempts fail, nothing panics
        cache.set("readHuge", &Params::new(), Domain::Wisuda, &json!("z".repeat(500)));

        assert!(cache.get("readHuge", &Params::new(), Domain::Wisuda).is_none());
    }

    #[test]
    fn test_stats() {
        let (cache, _, clock) = test_cache(DEFAULT_QUOTA_BYTES);
        cache.set("a", &Params::new(), Domain::Wisuda, &json!(1));
        clock.set(250_000);
        cache.set("b", &Params::new(), Domain::Sosprom, &json!(2));
        clock.set(300_000);

        let stats = cache.stats().unwrap();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.valid_entries, 1);
        assert_eq!(stats.expired_entries, 1);
        assert_eq!(stats.per_domain.get("wisuda"), Some(&1));
        assert_eq!(stats.per_domain.get("sosprom"), Some(&1));
        assert!(stats.used_bytes > 0);
    }
}
