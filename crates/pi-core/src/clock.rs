//! Injectable clock (spec §9): every scheduling decision goes through this
//! trait so tests can advance time deterministically instead of racing the
//! wall clock.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use crate::types::Timestamp;

pub trait Clock: Send + Sync {
    /// Current Unix timestamp, seconds.
    fn now(&self) -> Timestamp;

    /// Current Unix timestamp, milliseconds. Default impl derives from
    /// `now()`; `SystemClock` overrides with real sub-second precision.
    fn now_ms(&self) -> i64 {
        self.now() * 1_000
    }
}

/// Wall-clock implementation backing production use.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now().timestamp()
    }

    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock that can be advanced programmatically, for deterministic tests.
/// Real scheduled-task delays should still be driven with
/// `tokio::time::pause`/`advance`; this clock only controls what `now()`
/// returns to application code (e.g. the UnlockResolver's fallback branch).
#[derive(Debug)]
pub struct FixedClock {
    millis: AtomicI64,
}

impl FixedClock {
    pub fn new(seconds: Timestamp) -> Self {
        Self {
            millis: AtomicI64::new(seconds * 1_000),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }

    pub fn set(&self, seconds: Timestamp) {
        self.millis.store(seconds * 1_000, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.millis.load(Ordering::SeqCst) / 1_000
    }

    fn now_ms(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}
