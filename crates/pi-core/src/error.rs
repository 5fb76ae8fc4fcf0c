use thiserror::Error;

/// Ledger-facing and local error taxonomy (spec §7).
///
/// Every submission failure is classified into one of these before the
/// retry policy is applied; no string-sniffing on error messages.
#[derive(Debug, Error, Clone)]
pub enum ClaimError {
    /// The wallet's secret does not derive to its claimed address. Terminal —
    /// refuses enrollment, or quarantines the wallet if discovered mid-flight.
    #[error("secret does not derive to the expected address")]
    AuthMismatch,

    /// Ledger rejected the transaction with `tx_bad_seq`. Retried fast after
    /// invalidating the cached sequence number.
    #[error("stale sequence number")]
    BadSequence,

    /// Ledger rejected the transaction with `tx_bad_auth`. Terminal for this
    /// balance/wallet.
    #[error("signature rejected by the ledger")]
    BadAuth,

    /// Operation-level rejection (balance already claimed, destination
    /// unfunded, etc). The balance is dropped; not retried.
    #[error("operation rejected: {0}")]
    Logic(String),

    /// Network error, 5xx, timeout, or an unrecognized response shape.
    /// Retried with exponential backoff.
    #[error("transient ledger error: {0}")]
    Transient(String),
}

/// Startup-time configuration failure. Causes a non-zero exit before any
/// task is spawned.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}
