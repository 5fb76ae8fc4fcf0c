//! Per-wallet polling and the process-wide sweep (spec §4.5).

use std::sync::Arc;

use pi_core::predicate::{resolve_unlock, UnlockResolution};
use pi_core::types::{BalanceId, LogLevel};
use pi_core::Clock;
use pi_ledger::LedgerClient;
use tokio::sync::watch;

use crate::balance_registry::BalanceRegistry;
use crate::log_ring::LogRing;
use crate::scheduler::ClaimScheduler;
use crate::wallet_registry::Wallet;

/// One firing of the poll loop: fetch, resolve unlock instants, hand new
/// balances to the scheduler. Balances no longer returned by the ledger
/// are left alone — terminal state transitions drive removal, not poll
/// diffs (spec §4.5 step 3).
pub async fn poll_once<L: LedgerClient + 'static>(
    scheduler: &Arc<ClaimScheduler<L>>,
    wallet: &Arc<Wallet>,
    balances: &BalanceRegistry,
    logs: &LogRing,
    clock: &dyn Clock,
) {
    let records = match scheduler.ledger.fetch_claimable_balances(wallet.address().as_str()).await {
        Ok(records) => records,
        Err(e) => {
            logs.push(
                clock,
                LogLevel::Warning,
                Some(wallet.id),
                format!("poll failed for {}: {e}", wallet.address().masked()),
            );
            return;
        }
    };

    for record in records {
        let amount = match pi_core::amount::parse_amount(&record.amount) {
            Some(a) => a,
            None => {
                logs.push(
                    clock,
                    LogLevel::Warning,
                    Some(wallet.id),
                    format!("unparseable amount {:?} on balance {}", record.amount, record.id),
                );
                continue;
            }
        };

        let predicates: Vec<_> = record.claimants.iter().map(|c| c.predicate.clone()).collect();
        let resolution = resolve_unlock(predicates.iter());
        if matches!(resolution, UnlockResolution::Fallback) {
            logs.push(
                clock,
                LogLevel::Warning,
                Some(wallet.id),
                format!(
                    "balance {} has no interpretable unlock predicate, scheduling at the 24h fallback",
                    record.id
                ),
            );
        }
        let unlock_at = resolution.into_instant(clock);

        let balance_id = BalanceId(record.id);
        if let Some(entry) = balances.insert_if_new(wallet.id, balance_id, amount, unlock_at) {
            scheduler.schedule(wallet.clone(), entry);
        }
    }
}

/// Spawn the recurring per-wallet poll task. Fires immediately, then on
/// `interval`, until the wallet's cancellation signal fires.
pub fn spawn_poll_loop<L: LedgerClient + 'static>(
    scheduler: Arc<ClaimScheduler<L>>,
    wallet: Arc<Wallet>,
    balances: Arc<BalanceRegistry>,
    logs: Arc<LogRing>,
    clock: Arc<dyn Clock>,
    interval: std::time::Duration,
) -> tokio::task::JoinHandle<()> {
    let mut cancel = wallet.cancel_signal();
    tokio::spawn(async move {
        loop {
            poll_once(&scheduler, &wallet, &balances, &logs, clock.as_ref()).await;
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = cancel.changed() => return,
            }
            if *cancel.borrow() {
                return;
            }
        }
    })
}

/// Process-wide sweep (spec §4.5): triggers a poll iteration for every
/// currently-enrolled wallet every `interval`, guarding against a missed
/// individual schedule.
pub fn spawn_sweep<L: LedgerClient + 'static>(
    scheduler: Arc<ClaimScheduler<L>>,
    balances: Arc<BalanceRegistry>,
    logs: Arc<LogRing>,
    clock: Arc<dyn Clock>,
    interval: std::time::Duration,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    let wallets = scheduler.wallets.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => return,
            }
            if *shutdown.borrow() {
                return;
            }
            for summary in wallets.list() {
                if let Some(wallet) = wallets.get(summary.id) {
                    poll_once(&scheduler, &wallet, &balances, &logs, clock.as_ref()).await;
                }
            }
        }
    })
}
