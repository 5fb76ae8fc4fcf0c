//! Bounded in-memory audit log (spec §3 LogRecord, §4.9).
//!
//! Every entry is also emitted through `tracing` at the matching level, so
//! the ring is a queryable snapshot of what already went to stdout/stderr,
//! not a second source of truth.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use pi_core::{Clock, LogLevel, LogRecord, WalletId};

pub struct LogRing {
    capacity: usize,
    next_id: AtomicU64,
    records: Mutex<VecDeque<LogRecord>>,
}

impl LogRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            next_id: AtomicU64::new(1),
            records: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn push(
        &self,
        clock: &dyn Clock,
        level: LogLevel,
        wallet_id: Option<WalletId>,
        message: impl Into<String>,
    ) {
        let message = message.into();
        emit_tracing(level, wallet_id, &message);

        let record = LogRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            timestamp: clock.now(),
            level,
            message,
            wallet_id,
        };

        let mut records = self.records.lock().unwrap();
        if records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// Snapshot, newest first.
    pub fn snapshot(&self) -> Vec<LogRecord> {
        let records = self.records.lock().unwrap();
        records.iter().rev().cloned().collect()
    }

    pub fn clear(&self) {
        self.records.lock().unwrap().clear();
    }
}

fn emit_tracing(level: LogLevel, wallet_id: Option<WalletId>, message: &str) {
    match (level, wallet_id) {
        (LogLevel::Info, Some(w)) => tracing::info!(wallet = %w, "{message}"),
        (LogLevel::Info, None) => tracing::info!("{message}"),
        (LogLevel::Success, Some(w)) => tracing::info!(wallet = %w, outcome = "success", "{message}"),
        (LogLevel::Success, None) => tracing::info!(outcome = "success", "{message}"),
        (LogLevel::Warning, Some(w)) => tracing::warn!(wallet = %w, "{message}"),
        (LogLevel::Warning, None) => tracing::warn!("{message}"),
        (LogLevel::Error, Some(w)) => tracing::error!(wallet = %w, "{message}"),
        (LogLevel::Error, None) => tracing::error!("{message}"),
    }
}
