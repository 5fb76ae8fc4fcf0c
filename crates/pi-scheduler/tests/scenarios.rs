//! End-to-end scheduler scenarios, spec §8 scenarios A/C/D/E.
//!
//! Uses a `FixedClock` advanced in lockstep with tokio's paused virtual
//! time, and a mock `LedgerClient` standing in for the ledger.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pi_core::clock::FixedClock;
use pi_core::error::ClaimError;
use pi_core::{Clock, Config, Predicate};
use pi_crypto::KeyPair;
use pi_ledger::client::{Claimant, ClaimableBalance, LedgerClient, SubmitOutcome};
use pi_scheduler::Supervisor;

struct MockLedger {
    balances: Mutex<Vec<ClaimableBalance>>,
    submit_responses: Mutex<VecDeque<Result<SubmitOutcome, ClaimError>>>,
    submit_calls: AtomicUsize,
    sequence_calls: AtomicUsize,
    sequence: AtomicI64,
}

impl MockLedger {
    fn new() -> Self {
        Self {
            balances: Mutex::new(Vec::new()),
            submit_responses: Mutex::new(VecDeque::new()),
            submit_calls: AtomicUsize::new(0),
            sequence_calls: AtomicUsize::new(0),
            sequence: AtomicI64::new(1),
        }
    }

    fn set_balances(&self, balances: Vec<ClaimableBalance>) {
        *self.balances.lock().unwrap() = balances;
    }

    fn push_submit_response(&self, response: Result<SubmitOutcome, ClaimError>) {
        self.submit_responses.lock().unwrap().push_back(response);
    }

    fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    fn sequence_calls(&self) -> usize {
        self.sequence_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn fetch_claimable_balances(&self, _claimant: &str) -> Result<Vec<ClaimableBalance>, ClaimError> {
        Ok(self.balances.lock().unwrap().clone())
    }

    async fn fetch_sequence(&self, _address: &str) -> Result<i64, ClaimError> {
        self.sequence_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.sequence.fetch_add(1, Ordering::SeqCst))
    }

    async fn submit(&self, _blob: &[u8]) -> Result<SubmitOutcome, ClaimError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submit_responses.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(SubmitOutcome {
                hash: "deadbeef".to_string(),
                successful: true,
            })
        })
    }
}

fn unconditional_balance(id: &str, amount: &str, not_before: i64, destination: &str) -> ClaimableBalance {
    ClaimableBalance {
        id: id.to_string(),
        amount: amount.to_string(),
        claimants: vec![Claimant {
            destination: destination.to_string(),
            predicate: Predicate::Not(Box::new(Predicate::AbsBefore(not_before))),
        }],
    }
}

async fn advance(clock: &FixedClock, secs: i64) {
    tokio::time::advance(Duration::from_secs(secs as u64)).await;
    clock.advance(Duration::from_secs(secs as u64));
}

async fn advance_ms(clock: &FixedClock, millis: i64) {
    tokio::time::advance(Duration::from_millis(millis as u64)).await;
    clock.advance(Duration::from_millis(millis as u64));
}

async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn scenario_a_immediate_unlock_claims_and_removes() {
    let clock = Arc::new(FixedClock::new(1_000));
    let clock_dyn: Arc<dyn Clock> = clock.clone();

    let ledger = Arc::new(MockLedger::new());
    let owner = KeyPair::generate();
    let dest = KeyPair::generate();

    ledger.set_balances(vec![unconditional_balance(
        "bal-a",
        "3.1415926",
        clock.now() - 10,
        dest.address().as_str(),
    )]);

    let mut config = Config::default();
    config.prep = Duration::from_millis(0);
    config.post = Duration::from_millis(0);

    let supervisor = Supervisor::new(config, clock_dyn, ledger.clone());
    supervisor
        .enroll_wallet(owner.address().as_str(), &owner.seed_strkey(), dest.address().clone())
        .unwrap();

    settle().await;
    advance(&clock, 1).await;
    settle().await;

    assert_eq!(ledger.submit_calls(), 1);
    assert!(supervisor.balances.list(None).is_empty());
}

/// Scenario B (spec §8): with the real default offsets (`Δprep = 2000ms`,
/// `Δpost = 5ms`), the pre-fetch and the submit are two distinct events —
/// not the same tick — and the submit reuses the sequence number the
/// pre-fetch already cached rather than fetching it again.
#[tokio::test(start_paused = true)]
async fn scenario_b_prefetch_and_submit_are_distinct_with_default_config() {
    let clock = Arc::new(FixedClock::new(1_000));
    let clock_dyn: Arc<dyn Clock> = clock.clone();

    let ledger = Arc::new(MockLedger::new());
    let owner = KeyPair::generate();
    let dest = KeyPair::generate();

    let unlock_at = clock.now() + 10;
    ledger.set_balances(vec![unconditional_balance(
        "bal-b",
        "1.0",
        unlock_at,
        dest.address().as_str(),
    )]);

    let supervisor = Supervisor::new(Config::default(), clock_dyn, ledger.clone());
    supervisor
        .enroll_wallet(owner.address().as_str(), &owner.seed_strkey(), dest.address().clone())
        .unwrap();
    settle().await;

    // Just short of unlockAt - 2000ms: neither phase has fired yet.
    advance_ms(&clock, 7_900).await;
    settle().await;
    assert_eq!(ledger.sequence_calls(), 0);
    assert_eq!(ledger.submit_calls(), 0);

    // Cross unlockAt - 2000ms: the pre-fetch phase primes the sequence cache.
    advance_ms(&clock, 200).await;
    settle().await;
    assert_eq!(ledger.sequence_calls(), 1);
    assert_eq!(ledger.submit_calls(), 0);

    // Still short of unlockAt + 5ms: the submit has not fired yet.
    advance_ms(&clock, 1_800).await;
    settle().await;
    assert_eq!(ledger.submit_calls(), 0);

    // Cross unlockAt + 5ms: the submit fires and reuses the cached sequence
    // number — no second fetch_sequence call.
    advance_ms(&clock, 105).await;
    settle().await;
    assert_eq!(ledger.submit_calls(), 1);
    assert_eq!(ledger.sequence_calls(), 1);
    assert!(supervisor.balances.list(None).is_empty());
}

#[tokio::test(start_paused = true)]
async fn scenario_c_bad_sequence_then_success() {
    let clock = Arc::new(FixedClock::new(1_000));
    let clock_dyn: Arc<dyn Clock> = clock.clone();

    let ledger = Arc::new(MockLedger::new());
    let owner = KeyPair::generate();
    let dest = KeyPair::generate();

    ledger.set_balances(vec![unconditional_balance(
        "bal-c",
        "1.0",
        clock.now() - 10,
        dest.address().as_str(),
    )]);
    ledger.push_submit_response(Err(ClaimError::BadSequence));
    ledger.push_submit_response(Ok(SubmitOutcome {
        hash: "deadbeef".to_string(),
        successful: true,
    }));

    let mut config = Config::default();
    config.prep = Duration::from_millis(0);
    config.post = Duration::from_millis(0);

    let supervisor = Supervisor::new(config, clock_dyn, ledger.clone());
    supervisor
        .enroll_wallet(owner.address().as_str(), &owner.seed_strkey(), dest.address().clone())
        .unwrap();

    settle().await;
    advance(&clock, 1).await;
    settle().await;
    // BAD_SEQUENCE_RETRY_MS is 100ms; advance past it for the retry.
    advance(&clock, 1).await;
    settle().await;

    assert_eq!(ledger.submit_calls(), 2);
    assert!(supervisor.balances.list(None).is_empty());
}

#[tokio::test]
async fn scenario_d_enrollment_rejects_auth_mismatch() {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(1_000));
    let ledger = Arc::new(MockLedger::new());
    let owner = KeyPair::generate();
    let impostor = KeyPair::generate();
    let dest = KeyPair::generate();

    let supervisor = Supervisor::new(Config::default(), clock, ledger);
    let err = supervisor
        .enroll_wallet(owner.address().as_str(), &impostor.seed_strkey(), dest.address().clone())
        .unwrap_err();

    assert!(matches!(err, pi_scheduler::EnrollError::AuthMismatch));
    assert!(supervisor.wallets.list().is_empty());
}

#[tokio::test(start_paused = true)]
async fn scenario_e_removal_cancels_future_balance() {
    let clock = Arc::new(FixedClock::new(1_000));
    let clock_dyn: Arc<dyn Clock> = clock.clone();

    let ledger = Arc::new(MockLedger::new());
    let owner = KeyPair::generate();
    let dest = KeyPair::generate();

    ledger.set_balances(vec![unconditional_balance(
        "bal-e",
        "1.0",
        clock.now() + 60,
        dest.address().as_str(),
    )]);

    let supervisor = Supervisor::new(Config::default(), clock_dyn, ledger.clone());
    let summary = supervisor
        .enroll_wallet(owner.address().as_str(), &owner.seed_strkey(), dest.address().clone())
        .unwrap();

    settle().await;
    advance(&clock, 10).await;
    settle().await;

    assert!(supervisor.remove_wallet(summary.id));

    advance(&clock, 120).await;
    settle().await;

    assert_eq!(ledger.submit_calls(), 0);
    assert!(supervisor.balances.list(None).is_empty());
}
