//! Supervisor (spec §2 C9, §4.6, §5): process-wide init/teardown, owns the
//! shared clock, registries, and log ring; fans wallets in and out of the
//! poll loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use pi_core::types::{StellarAddress, Timestamp, WalletId};
use pi_core::{Clock, Config};
use pi_ledger::{HttpLedgerClient, LedgerClient, SequenceCache};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::balance_registry::BalanceRegistry;
use crate::log_ring::LogRing;
use crate::poll_loop::{spawn_poll_loop, spawn_sweep};
use crate::scheduler::ClaimScheduler;
use crate::wallet_registry::{EnrollError, Wallet, WalletRegistry, WalletSummary};

pub struct Supervisor<L: LedgerClient> {
    pub wallets: Arc<WalletRegistry>,
    pub balances: Arc<BalanceRegistry>,
    pub logs: Arc<LogRing>,
    pub clock: Arc<dyn Clock>,
    pub config: Config,
    scheduler: Arc<ClaimScheduler<L>>,
    poll_handles: Mutex<HashMap<WalletId, JoinHandle<()>>>,
    sweep_handle: Mutex<Option<JoinHandle<()>>>,
    shutdown_tx: watch::Sender<bool>,
}

impl Supervisor<HttpLedgerClient> {
    pub fn new_with_http_ledger(config: Config, clock: Arc<dyn Clock>) -> Arc<Self> {
        let ledger = Arc::new(HttpLedgerClient::new(
            config.ledger_base_url.clone(),
            std::time::Duration::from_secs(pi_core::LEDGER_CALL_TIMEOUT_SECS),
        ));
        Self::new(config, clock, ledger)
    }
}

impl<L: LedgerClient + 'static> Supervisor<L> {
    pub fn new(config: Config, clock: Arc<dyn Clock>, ledger: Arc<L>) -> Arc<Self> {
        let wallets = Arc::new(WalletRegistry::new());
        let balances = Arc::new(BalanceRegistry::new());
        let logs = Arc::new(LogRing::new(config.max_logs));
        let sequence_cache = Arc::new(SequenceCache::new(
            ledger.clone(),
            clock.clone(),
            config.seq_ttl.as_secs() as i64,
        ));

        let scheduler = Arc::new(ClaimScheduler {
            ledger,
            sequence_cache,
            wallets: wallets.clone(),
            balances: balances.clone(),
            logs: logs.clone(),
            clock: clock.clone(),
            config: config.clone(),
        });

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let sweep_handle = spawn_sweep(
            scheduler.clone(),
            balances.clone(),
            logs.clone(),
            clock.clone(),
            config.sweep_interval,
            shutdown_rx,
        );

        Arc::new(Self {
            wallets,
            balances,
            logs,
            clock,
            config,
            scheduler,
            poll_handles: Mutex::new(HashMap::new()),
            sweep_handle: Mutex::new(Some(sweep_handle)),
            shutdown_tx,
        })
    }

    /// Enroll a wallet and start its poll loop. Fires the first poll
    /// immediately (spec §4.5).
    pub fn enroll_wallet(
        self: &Arc<Self>,
        address: &str,
        secret: &str,
        destination: StellarAddress,
    ) -> Result<WalletSummary, EnrollError> {
        let now: Timestamp = self.clock.now();
        let wallet = self.wallets.enroll(address, secret, destination, now)?;

        let handle = spawn_poll_loop(
            self.scheduler.clone(),
            wallet.clone(),
            self.balances.clone(),
            self.logs.clone(),
            self.clock.clone(),
            self.config.poll_interval,
        );
        self.poll_handles.lock().unwrap().insert(wallet.id, handle);

        Ok(WalletSummary {
            id: wallet.id,
            address: wallet.address().as_str().to_string(),
            destination: wallet.destination.as_str().to_string(),
            created_at: wallet.created_at,
            quarantined: false,
        })
    }

    /// The ledger client backing this supervisor, for read-only passthrough
    /// endpoints (spec §6 `GET /claimable-balances/{address}`).
    pub fn ledger(&self) -> Arc<L> {
        self.scheduler.ledger.clone()
    }

    /// Current sequence number for `address`, served from the shared cache.
    pub async fn fetch_sequence(&self, address: &str) -> Result<i64, pi_core::ClaimError> {
        self.scheduler.sequence_cache.get(address).await
    }

    /// Remove a wallet: cancels its poll loop and every balance armed on
    /// its behalf (spec §4.6).
    pub fn remove_wallet(&self, id: WalletId) -> bool {
        let Some(_wallet) = self.wallets.remove(id) else {
            return false;
        };
        self.balances.remove_all_for_wallet(id);
        self.poll_handles.lock().unwrap().remove(&id);
        true
    }

    /// Signal cancellation to every task and wait up to
    /// `SHUTDOWN_GRACE_SECS` for them to drain.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        for (_, wallet) in self.wallets_for_shutdown() {
            self.balances.remove_all_for_wallet(wallet.id);
        }
        if let Some(handle) = self.sweep_handle.lock().unwrap().take() {
            let _ = tokio::time::timeout(
                std::time::Duration::from_secs(pi_core::SHUTDOWN_GRACE_SECS),
                handle,
            )
            .await;
        }
    }

    fn wallets_for_shutdown(&self) -> Vec<(WalletId, Arc<Wallet>)> {
        self.wallets
            .list()
            .into_iter()
            .filter_map(|s| self.wallets.get(s.id).map(|w| (s.id, w)))
            .collect()
    }
}
