//! Short-lived cache fronting `GET /claimable-balances/{address}` so a
//! noisy poller can't turn every page load into a fresh ledger round trip
//! (spec §6: "cached for up to three minutes").

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use pi_core::Clock;
use pi_ledger::client::ClaimableBalance;

struct Entry {
    fetched_at: i64,
    records: Vec<ClaimableBalance>,
}

pub struct ClaimableBalancesCache {
    clock: Arc<dyn Clock>,
    ttl_secs: i64,
    entries: Mutex<HashMap<String, Entry>>,
}

impl ClaimableBalancesCache {
    pub fn new(clock: Arc<dyn Clock>, ttl_secs: i64) -> Self {
        Self {
            clock,
            ttl_secs,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, address: &str) -> Option<Vec<ClaimableBalance>> {
        let entries = self.entries.lock().unwrap();
        let entry = entries.get(address)?;
        if self.clock.now() - entry.fetched_at >= self.ttl_secs {
            return None;
        }
        Some(entry.records.clone())
    }

    pub fn put(&self, address: &str, records: Vec<ClaimableBalance>) {
        self.entries.lock().unwrap().insert(
            address.to_string(),
            Entry {
                fetched_at: self.clock.now(),
                records,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pi_core::clock::FixedClock;

    fn balance(id: &str) -> ClaimableBalance {
        ClaimableBalance {
            id: id.to_string(),
            amount: "1.0".to_string(),
            claimants: Vec::new(),
        }
    }

    #[test]
    fn fresh_entry_is_served() {
        let clock = Arc::new(FixedClock::new(1_000));
        let cache = ClaimableBalancesCache::new(clock.clone(), 180);
        cache.put("addr", vec![balance("b1")]);
        assert_eq!(cache.get("addr").unwrap().len(), 1);
    }

    #[test]
    fn stale_entry_is_evicted() {
        let clock = Arc::new(FixedClock::new(1_000));
        let cache = ClaimableBalancesCache::new(clock.clone(), 180);
        cache.put("addr", vec![balance("b1")]);
        clock.advance(std::time::Duration::from_secs(181));
        assert!(cache.get("addr").is_none());
    }
}
