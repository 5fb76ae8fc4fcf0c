//! Short-TTL per-account sequence number cache (spec §4.2).

use std::collections::HashMap;
use std::sync::Arc;

use pi_core::error::ClaimError;
use pi_core::{Clock, Timestamp};
use tokio::sync::Mutex;

use crate::client::LedgerClient;

struct Entry {
    value: i64,
    fetched_at: Timestamp,
}

/// Caches the last observed sequence number per address for up to `ttl`.
/// Concurrent `get` calls for the same address coalesce into one fetch via
/// a per-address lock that guards the whole check-then-fetch section.
pub struct SequenceCache<L> {
    client: Arc<L>,
    clock: Arc<dyn Clock>,
    ttl_secs: i64,
    entries: Mutex<HashMap<String, Entry>>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<L: LedgerClient> SequenceCache<L> {
    pub fn new(client: Arc<L>, clock: Arc<dyn Clock>, ttl_secs: i64) -> Self {
        Self {
            client,
            clock,
            ttl_secs,
            entries: Mutex::new(HashMap::new()),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached sequence number if fresh, otherwise fetch, store,
    /// and return the new value.
    pub async fn get(&self, address: &str) -> Result<i64, ClaimError> {
        let lock = self.address_lock(address).await;
        let _guard = lock.lock().await;

        if let Some(entry) = self.entries.lock().await.get(address) {
            if self.clock.now() - entry.fetched_at < self.ttl_secs {
                return Ok(entry.value);
            }
        }
        self.fetch_and_store(address).await
    }

    /// Remove the cached entry, forcing the next `get` to fetch.
    pub async fn invalidate(&self, address: &str) {
        self.entries.lock().await.remove(address);
    }

    /// Force an unconditional fetch and store, bypassing freshness.
    pub async fn prime(&self, address: &str) -> Result<i64, ClaimError> {
        let lock = self.address_lock(address).await;
        let _guard = lock.lock().await;
        self.fetch_and_store(address).await
    }

    async fn fetch_and_store(&self, address: &str) -> Result<i64, ClaimError> {
        let value = self.client.fetch_sequence(address).await?;
        self.entries.lock().await.insert(
            address.to_string(),
            Entry {
                value,
                fetched_at: self.clock.now(),
            },
        );
        Ok(value)
    }

    async fn address_lock(&self, address: &str) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .await
            .entry(address.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::CountingClient;
    use pi_core::clock::FixedClock;

    #[tokio::test]
    async fn fresh_entry_served_without_refetch() {
        let client = Arc::new(CountingClient::new(7));
        let clock = Arc::new(FixedClock::new(1_000));
        let cache = SequenceCache::new(client.clone(), clock.clone(), 30);

        assert_eq!(cache.get("GADDR").await.unwrap(), 7);
        clock.advance(std::time::Duration::from_secs(5));
        assert_eq!(cache.get("GADDR").await.unwrap(), 7);
        assert_eq!(client.sequence_calls(), 1);
    }

    #[tokio::test]
    async fn stale_entry_triggers_refetch() {
        let client = Arc::new(CountingClient::new(7));
        let clock = Arc::new(FixedClock::new(1_000));
        let cache = SequenceCache::new(client.clone(), clock.clone(), 30);

        cache.get("GADDR").await.unwrap();
        clock.advance(std::time::Duration::from_secs(31));
        cache.get("GADDR").await.unwrap();
        assert_eq!(client.sequence_calls(), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let client = Arc::new(CountingClient::new(7));
        let clock = Arc::new(FixedClock::new(1_000));
        let cache = SequenceCache::new(client.clone(), clock.clone(), 30);

        cache.get("GADDR").await.unwrap();
        cache.invalidate("GADDR").await;
        cache.get("GADDR").await.unwrap();
        assert_eq!(client.sequence_calls(), 2);
    }

    #[tokio::test]
    async fn concurrent_get_coalesces_into_one_fetch() {
        let client = Arc::new(CountingClient::new(7).with_delay());
        let clock = Arc::new(FixedClock::new(1_000));
        let cache = Arc::new(SequenceCache::new(client.clone(), clock, 30));

        let a = cache.clone();
        let b = cache.clone();
        let (r1, r2) = tokio::join!(
            tokio::spawn(async move { a.get("GADDR").await }),
            tokio::spawn(async move { b.get("GADDR").await })
        );
        assert_eq!(r1.unwrap().unwrap(), 7);
        assert_eq!(r2.unwrap().unwrap(), 7);
        assert_eq!(client.sequence_calls(), 1);
    }
}
