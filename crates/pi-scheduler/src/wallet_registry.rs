//! Enrolled-wallet registry (spec §3 Wallet, §4.6).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use pi_core::error::ClaimError;
use pi_core::types::{StellarAddress, Timestamp, WalletId};
use pi_crypto::KeyPair;
use tokio::sync::watch;

/// An enrolled wallet. Immutable after creation except for `quarantined`.
pub struct Wallet {
    pub id: WalletId,
    pub destination: StellarAddress,
    pub created_at: Timestamp,
    pub quarantined: Mutex<bool>,
    keypair: KeyPair,
    cancel_tx: watch::Sender<bool>,
}

impl Wallet {
    pub fn address(&self) -> &StellarAddress {
        self.keypair.address()
    }

    pub fn keypair(&self) -> &KeyPair {
        &self.keypair
    }

    pub fn is_quarantined(&self) -> bool {
        *self.quarantined.lock().unwrap()
    }

    pub fn quarantine(&self) {
        *self.quarantined.lock().unwrap() = true;
    }

    /// A receiver that fires when this wallet is removed. Held by its
    /// PollLoop task and cloned into every balance spawned on its behalf.
    pub fn cancel_signal(&self) -> watch::Receiver<bool> {
        self.cancel_tx.subscribe()
    }

    fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }
}

/// A read-only view safe to hand out over the REST API (spec §6
/// `GET /wallets`) — never carries the secret.
#[derive(Debug, Clone)]
pub struct WalletSummary {
    pub id: WalletId,
    pub address: String,
    pub destination: String,
    pub created_at: Timestamp,
    pub quarantined: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum EnrollError {
    #[error("wallet secret does not derive to the supplied address")]
    AuthMismatch,
    #[error("a wallet for this address is already monitored")]
    DuplicateAddress,
}

impl From<ClaimError> for EnrollError {
    fn from(_: ClaimError) -> Self {
        EnrollError::AuthMismatch
    }
}

/// Set of currently-enrolled wallets, keyed by id with an address index for
/// duplicate detection (spec §4.6: "rejects duplicate addresses").
pub struct WalletRegistry {
    next_id: AtomicU64,
    wallets: Mutex<HashMap<WalletId, std::sync::Arc<Wallet>>>,
    by_address: Mutex<HashMap<String, WalletId>>,
}

impl Default for WalletRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl WalletRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            wallets: Mutex::new(HashMap::new()),
            by_address: Mutex::new(HashMap::new()),
        }
    }

    /// Validate the secret derives to `address`, reject duplicates, assign
    /// an id, and register the wallet. The caller is responsible for
    /// starting its PollLoop.
    pub fn enroll(
        &self,
        address: &str,
        secret: &str,
        destination: StellarAddress,
        now: Timestamp,
    ) -> Result<std::sync::Arc<Wallet>, EnrollError> {
        let mut by_address = self.by_address.lock().unwrap();
        if by_address.contains_key(address) {
            return Err(EnrollError::DuplicateAddress);
        }

        let expected = StellarAddress::new_unchecked(address.to_string());
        let keypair = KeyPair::from_seed(secret, &expected).map_err(|_| EnrollError::AuthMismatch)?;

        let id = WalletId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (cancel_tx, _) = watch::channel(false);
        let wallet = std::sync::Arc::new(Wallet {
            id,
            destination,
            created_at: now,
            quarantined: Mutex::new(false),
            keypair,
            cancel_tx,
        });

        by_address.insert(address.to_string(), id);
        self.wallets.lock().unwrap().insert(id, wallet.clone());
        Ok(wallet)
    }

    pub fn get(&self, id: WalletId) -> Option<std::sync::Arc<Wallet>> {
        self.wallets.lock().unwrap().get(&id).cloned()
    }

    pub fn list(&self) -> Vec<WalletSummary> {
        self.wallets
            .lock()
            .unwrap()
            .values()
            .map(|w| WalletSummary {
                id: w.id,
                address: w.address().as_str().to_string(),
                destination: w.destination.as_str().to_string(),
                created_at: w.created_at,
                quarantined: w.is_quarantined(),
            })
            .collect()
    }

    /// Remove a wallet, firing its cancellation signal. Returns the removed
    /// wallet so the caller can cancel its balances too.
    pub fn remove(&self, id: WalletId) -> Option<std::sync::Arc<Wallet>> {
        let wallet = self.wallets.lock().unwrap().remove(&id)?;
        self.by_address.lock().unwrap().remove(wallet.address().as_str());
        wallet.cancel();
        Some(wallet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dest() -> StellarAddress {
        KeyPair::generate().address().clone()
    }

    #[test]
    fn enroll_rejects_auth_mismatch() {
        let registry = WalletRegistry::new();
        let owner = KeyPair::generate();
        let impostor = KeyPair::generate();

        let err = registry
            .enroll(owner.address().as_str(), &impostor.seed_strkey(), dest(), 0)
            .unwrap_err();
        assert!(matches!(err, EnrollError::AuthMismatch));
    }

    #[test]
    fn enroll_rejects_duplicate_address() {
        let registry = WalletRegistry::new();
        let owner = KeyPair::generate();
        let seed = owner.seed_strkey();

        registry
            .enroll(owner.address().as_str(), &seed, dest(), 0)
            .unwrap();
        let err = registry
            .enroll(owner.address().as_str(), &seed, dest(), 0)
            .unwrap_err();
        assert!(matches!(err, EnrollError::DuplicateAddress));
    }

    #[test]
    fn remove_fires_cancellation() {
        let registry = WalletRegistry::new();
        let owner = KeyPair::generate();
        let wallet = registry
            .enroll(owner.address().as_str(), &owner.seed_strkey(), dest(), 0)
            .unwrap();
        let mut cancel_signal = wallet.cancel_signal();

        registry.remove(wallet.id).unwrap();
        assert!(*cancel_signal.borrow_and_update());
    }
}
