//! Tracked claimable-balance registry (spec §3 ClaimableBalance, §4.4 state
//! machine, §4.5 dedup-across-polls).

use std::collections::HashMap;
use std::sync::Mutex;

use pi_core::types::{Amount, BalanceId, BalanceState, Timestamp, WalletId};
use tokio::sync::watch;

pub type BalanceKey = (WalletId, BalanceId);

pub struct BalanceEntry {
    pub wallet_id: WalletId,
    pub balance_id: BalanceId,
    pub amount: Amount,
    pub unlock_at: Timestamp,
    state: Mutex<BalanceState>,
    pub retry_index: Mutex<usize>,
    cancel_tx: watch::Sender<bool>,
}

impl BalanceEntry {
    pub fn state(&self) -> BalanceState {
        *self.state.lock().unwrap()
    }

    pub fn set_state(&self, next: BalanceState) {
        *self.state.lock().unwrap() = next;
    }

    pub fn cancel_signal(&self) -> watch::Receiver<bool> {
        self.cancel_tx.subscribe()
    }

    fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }
}

#[derive(Debug, Clone)]
pub struct BalanceSnapshot {
    pub wallet_id: WalletId,
    pub balance_id: String,
    pub amount: Amount,
    pub unlock_at: Timestamp,
    pub state: BalanceState,
}

/// Set of `(walletId, balanceId)` entries currently tracked. Insertion is a
/// no-op when the key already exists — this is how repeated polls of an
/// already-armed balance avoid spawning duplicate tasks.
pub struct BalanceRegistry {
    entries: Mutex<HashMap<BalanceKey, std::sync::Arc<BalanceEntry>>>,
}

impl Default for BalanceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BalanceRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Insert a newly observed balance. Returns `Some(entry)` if this was a
    /// new insertion (the caller should hand it to the scheduler), or
    /// `None` if the key was already tracked (no-op, per spec §4.5).
    pub fn insert_if_new(
        &self,
        wallet_id: WalletId,
        balance_id: BalanceId,
        amount: Amount,
        unlock_at: Timestamp,
    ) -> Option<std::sync::Arc<BalanceEntry>> {
        let mut entries = self.entries.lock().unwrap();
        let key = (wallet_id, balance_id.clone());
        if entries.contains_key(&key) {
            return None;
        }
        let (cancel_tx, _) = watch::channel(false);
        let entry = std::sync::Arc::new(BalanceEntry {
            wallet_id,
            balance_id,
            amount,
            unlock_at,
            state: Mutex::new(BalanceState::Pending),
            retry_index: Mutex::new(0),
            cancel_tx,
        });
        entries.insert(key, entry.clone());
        Some(entry)
    }

    pub fn get(&self, wallet_id: WalletId, balance_id: &BalanceId) -> Option<std::sync::Arc<BalanceEntry>> {
        self.entries
            .lock()
            .unwrap()
            .get(&(wallet_id, balance_id.clone()))
            .cloned()
    }

    /// Remove a balance (terminal success, Logic rejection, or cascading
    /// wallet removal). Idempotent.
    pub fn remove(&self, wallet_id: WalletId, balance_id: &BalanceId) {
        if let Some(entry) = self.entries.lock().unwrap().remove(&(wallet_id, balance_id.clone())) {
            entry.cancel();
        }
    }

    /// Remove and cancel every balance belonging to `wallet_id` (spec
    /// §4.6: wallet removal cascades to its balances' scheduled tasks).
    pub fn remove_all_for_wallet(&self, wallet_id: WalletId) {
        let mut entries = self.entries.lock().unwrap();
        let keys: Vec<BalanceKey> = entries
            .keys()
            .filter(|(w, _)| *w == wallet_id)
            .cloned()
            .collect();
        for key in keys {
            if let Some(entry) = entries.remove(&key) {
                entry.cancel();
            }
        }
    }

    pub fn list(&self, wallet_id: Option<WalletId>) -> Vec<BalanceSnapshot> {
        self.entries
            .lock()
            .unwrap()
            .values()
            .filter(|e| match wallet_id {
                Some(w) => w == e.wallet_id,
                None => true,
            })
            .map(|e| BalanceSnapshot {
                wallet_id: e.wallet_id,
                balance_id: e.balance_id.0.clone(),
                amount: e.amount,
                unlock_at: e.unlock_at,
                state: e.state(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_insert_is_a_no_op() {
        let registry = BalanceRegistry::new();
        let wallet_id = WalletId(1);
        let balance_id = BalanceId("bal-1".to_string());

        let first = registry.insert_if_new(wallet_id, balance_id.clone(), 100, 1_000);
        assert!(first.is_some());

        let second = registry.insert_if_new(wallet_id, balance_id, 100, 1_000);
        assert!(second.is_none());
        assert_eq!(registry.list(Some(wallet_id)).len(), 1);
    }

    #[test]
    fn remove_all_for_wallet_cancels_every_entry() {
        let registry = BalanceRegistry::new();
        let wallet_id = WalletId(1);
        let a = registry
            .insert_if_new(wallet_id, BalanceId("a".to_string()), 1, 0)
            .unwrap();
        let b = registry
            .insert_if_new(wallet_id, BalanceId("b".to_string()), 1, 0)
            .unwrap();
        let mut a_cancel = a.cancel_signal();
        let mut b_cancel = b.cancel_signal();

        registry.remove_all_for_wallet(wallet_id);

        assert!(*a_cancel.borrow_and_update());
        assert!(*b_cancel.borrow_and_update());
        assert!(registry.list(Some(wallet_id)).is_empty());
    }

    #[test]
    fn remove_is_idempotent() {
        let registry = BalanceRegistry::new();
        let wallet_id = WalletId(1);
        let balance_id = BalanceId("a".to_string());
        registry.insert_if_new(wallet_id, balance_id.clone(), 1, 0);
        registry.remove(wallet_id, &balance_id);
        registry.remove(wallet_id, &balance_id);
    }
}
