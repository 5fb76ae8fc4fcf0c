//! ClaimScheduler (spec §4.4): per-balance state machine driving a
//! sequence pre-fetch and a claim+payment submission at precise offsets
//! from the unlock instant.
//!
//! Modeled as a single sequential task per balance rather than three
//! independently-armed timers — a spawned future trivially satisfies "at
//! most one of {PreFetch, Submit, Retry} executing at any instant" (spec
//! §8 invariant 2), replacing the reference source's nested callback
//! chains (spec §9) with a timer facility driving one state machine.

use std::sync::Arc;
use std::time::Duration;

use pi_core::error::ClaimError;
use pi_core::types::{BalanceState, LogLevel};
use pi_core::{Clock, Config, TRANSIENT_BACKOFF_SCHEDULE_SECS};
use pi_ledger::{build_and_sign, LedgerClient, SequenceCache};
use tokio::sync::watch;

use crate::balance_registry::{BalanceEntry, BalanceRegistry};
use crate::log_ring::LogRing;
use crate::wallet_registry::{Wallet, WalletRegistry};

pub struct ClaimScheduler<L: LedgerClient> {
    pub ledger: Arc<L>,
    pub sequence_cache: Arc<SequenceCache<L>>,
    pub wallets: Arc<WalletRegistry>,
    pub balances: Arc<BalanceRegistry>,
    pub logs: Arc<LogRing>,
    pub clock: Arc<dyn Clock>,
    pub config: Config,
}

impl<L: LedgerClient + 'static> ClaimScheduler<L> {
    /// Arm the PreFetch/Submit lifecycle for a newly accepted balance.
    pub fn schedule(self: &Arc<Self>, wallet: Arc<Wallet>, entry: Arc<BalanceEntry>) {
        let scheduler = self.clone();
        tokio::spawn(async move { scheduler.run_lifecycle(wallet, entry).await });
    }

    async fn run_lifecycle(self: Arc<Self>, wallet: Arc<Wallet>, entry: Arc<BalanceEntry>) {
        let mut cancel = entry.cancel_signal();

        if !self.prefetch_phase(&wallet, &entry, &mut cancel).await {
            return;
        }
        self.submit_phase(&wallet, &entry, &mut cancel).await;
    }

    /// Armed at `unlockAt - Δprep`. Skips straight to `Ready` if that
    /// instant has already passed by the time the task starts.
    async fn prefetch_phase(
        &self,
        wallet: &Wallet,
        entry: &BalanceEntry,
        cancel: &mut watch::Receiver<bool>,
    ) -> bool {
        let prefetch_at_ms = entry.unlock_at * 1_000 - self.config.prep.as_millis() as i64;

        if !sleep_until_ms(self.clock.as_ref(), prefetch_at_ms, cancel).await {
            return false;
        }
        if self.balances.get(entry.wallet_id, &entry.balance_id).is_none() {
            return false;
        }

        entry.set_state(BalanceState::PreFetching);
        match self.sequence_cache.prime(wallet.address().as_str()).await {
            Ok(_) => {
                self.logs.push(
                    self.clock.as_ref(),
                    LogLevel::Info,
                    Some(wallet.id),
                    format!("sequence pre-fetched for {}", wallet.address().masked()),
                );
            }
            Err(e) => {
                // Priming failure does not abort the submit task — it will
                // simply fetch fresh at submit time (spec §4.4).
                self.logs.push(
                    self.clock.as_ref(),
                    LogLevel::Warning,
                    Some(wallet.id),
                    format!("sequence pre-fetch failed: {e}"),
                );
            }
        }
        entry.set_state(BalanceState::Ready);
        true
    }

    /// Armed at `unlockAt + Δpost`. Retries in place per the policy in
    /// spec §4.4 until a terminal outcome.
    async fn submit_phase(
        &self,
        wallet: &Wallet,
        entry: &BalanceEntry,
        cancel: &mut watch::Receiver<bool>,
    ) {
        let submit_at_ms = entry.unlock_at * 1_000 + self.config.post.as_millis() as i64;

        if !sleep_until_ms(self.clock.as_ref(), submit_at_ms, cancel).await {
            return;
        }

        loop {
            if self.balances.get(entry.wallet_id, &entry.balance_id).is_none() {
                return;
            }
            if wallet.is_quarantined() {
                return;
            }

            entry.set_state(BalanceState::Submitting);
            match self.attempt_submit(wallet, entry).await {
                Ok(()) => {
                    entry.set_state(BalanceState::Succeeded);
                    self.logs.push(
                        self.clock.as_ref(),
                        LogLevel::Success,
                        Some(wallet.id),
                        format!("claimed balance {:?} for {}", entry.balance_id, wallet.address().masked()),
                    );
                    self.balances.remove(entry.wallet_id, &entry.balance_id);
                    return;
                }
                Err(ClaimError::BadSequence) => {
                    self.sequence_cache.invalidate(wallet.address().as_str()).await;
                    entry.set_state(BalanceState::Failed);
                    self.logs.push(
                        self.clock.as_ref(),
                        LogLevel::Warning,
                        Some(wallet.id),
                        "stale sequence number, retrying",
                    );
                    if !sleep_ms(self.clock.as_ref(), pi_core::BAD_SEQUENCE_RETRY_MS, cancel).await {
                        return;
                    }
                    continue;
                }
                Err(ClaimError::BadAuth) => {
                    entry.set_state(BalanceState::Failed);
                    wallet.quarantine();
                    self.logs.push(
                        self.clock.as_ref(),
                        LogLevel::Error,
                        Some(wallet.id),
                        "signature rejected by the ledger, wallet quarantined",
                    );
                    return;
                }
                Err(ClaimError::Logic(reason)) => {
                    entry.set_state(BalanceState::Failed);
                    self.logs.push(
                        self.clock.as_ref(),
                        LogLevel::Error,
                        Some(wallet.id),
                        format!("operation rejected: {reason}"),
                    );
                    self.balances.remove(entry.wallet_id, &entry.balance_id);
                    return;
                }
                Err(ClaimError::Transient(reason)) => {
                    entry.set_state(BalanceState::Failed);
                    let idx = {
                        let mut retry_index = entry.retry_index.lock().unwrap();
                        let idx = *retry_index;
                        *retry_index = (idx + 1).min(TRANSIENT_BACKOFF_SCHEDULE_SECS.len() - 1);
                        idx
                    };
                    let backoff = TRANSIENT_BACKOFF_SCHEDULE_SECS
                        [idx.min(TRANSIENT_BACKOFF_SCHEDULE_SECS.len() - 1)];
                    self.logs.push(
                        self.clock.as_ref(),
                        LogLevel::Warning,
                        Some(wallet.id),
                        format!("transient ledger error, retrying in {backoff}s: {reason}"),
                    );
                    if !sleep_ms(self.clock.as_ref(), backoff * 1_000, cancel).await {
                        return;
                    }
                    continue;
                }
                Err(ClaimError::AuthMismatch) => {
                    // Only raised by the builder if the wallet's secret no
                    // longer derives its own address, which cannot happen
                    // post-enrollment; treated as terminal defensively.
                    entry.set_state(BalanceState::Failed);
                    wallet.quarantine();
                    self.logs.push(
                        self.clock.as_ref(),
                        LogLevel::Error,
                        Some(wallet.id),
                        "wallet key no longer derives its own address",
                    );
                    return;
                }
            }
        }
    }

    async fn attempt_submit(&self, wallet: &Wallet, entry: &BalanceEntry) -> Result<(), ClaimError> {
        let sequence = self.sequence_cache.get(wallet.address().as_str()).await?;
        let envelope = build_and_sign(
            wallet.keypair(),
            wallet.address(),
            &wallet.destination,
            &entry.balance_id,
            entry.amount,
            sequence,
            self.config.tx_fee_stroops,
            self.config.tx_validity_secs,
            &self.config.network_passphrase,
            self.clock.now(),
        )?;

        let outcome = self.ledger.submit(&envelope.blob).await?;
        if outcome.successful {
            Ok(())
        } else {
            Err(ClaimError::Transient(
                "submission returned an unsuccessful outcome with no result code".to_string(),
            ))
        }
    }
}

/// Sleep until `clock.now_ms() >= target_ms`, racing a cancellation signal.
/// Returns `false` if cancelled first. Kept in milliseconds throughout so
/// sub-second `prep`/`post` offsets (the default `Δpost` is 5ms) are not
/// truncated away by a seconds-granularity deadline.
async fn sleep_until_ms(clock: &dyn Clock, target_ms: i64, cancel: &mut watch::Receiver<bool>) -> bool {
    let delay_ms = (target_ms - clock.now_ms()).max(0);
    sleep_ms(clock, delay_ms as u64, cancel).await
}

async fn sleep_ms(_clock: &dyn Clock, delay_ms: u64, cancel: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(Duration::from_millis(delay_ms)) => true,
        _ = cancel.changed() => false,
    }
}
