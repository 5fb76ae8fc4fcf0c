//! ─── Claim Scheduler defaults ────────────────────────────────────────────────
//!
//! All of these are overridable via environment variables at startup
//! (see [`crate::config::Config`]); the values here are what ship unconfigured.

/// Time before unlock at which the sequence number is pre-fetched.
pub const DEFAULT_PREP_MS: u64 = 2_000;

/// Time after unlock at which the claim+payment transaction is submitted.
pub const DEFAULT_POST_MS: u64 = 5;

/// Cached sequence numbers are considered fresh for this long.
pub const DEFAULT_SEQ_TTL_MS: u64 = 30_000;

/// Validity window granted to a submitted transaction, in seconds.
pub const DEFAULT_TX_VALIDITY_SECS: i64 = 120;

/// Default transaction fee, in stroops (1 unit = 10_000_000 stroops).
pub const DEFAULT_TX_FEE_STROOPS: u32 = 1_000_000;

/// Per-wallet poll interval.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5 * 60;

/// Process-wide sweep interval (catches missed individual poll schedules).
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 2 * 60;

/// Bounded capacity of the in-memory log ring.
pub const DEFAULT_MAX_LOGS: usize = 500;

/// Hard timeout applied to every ledger HTTP call.
pub const LEDGER_CALL_TIMEOUT_SECS: u64 = 15;

/// Grace period given to in-flight tasks on shutdown before the process exits.
pub const SHUTDOWN_GRACE_SECS: u64 = 5;

/// Conservative fallback unlock horizon used when a claimable balance's
/// predicate tree contains no interpretable `not(abs_before)` clause.
pub const FALLBACK_UNLOCK_HORIZON_SECS: i64 = 24 * 3_600;

/// Backoff schedule (seconds) applied to successive Transient-error retries
/// of the same balance. The index advances per failure and resets on success.
pub const TRANSIENT_BACKOFF_SCHEDULE_SECS: &[u64] = &[5, 15, 30, 60, 120];

/// Fixed re-arm delay after a `BadSequence` rejection.
pub const BAD_SEQUENCE_RETRY_MS: u64 = 100;

/// Default ledger REST endpoint.
pub const DEFAULT_LEDGER_BASE_URL: &str = "https://api.mainnet.minepi.com";

/// Default network passphrase used to salt the transaction signing payload.
pub const DEFAULT_NETWORK_PASSPHRASE: &str = "Pi Network";

/// Default bind address for the HTTP API.
pub const DEFAULT_PORT: u16 = 8080;

/// TTL applied to the server-side cache of `GET /claimable-balances/{address}`.
pub const CLAIMABLE_BALANCES_CACHE_TTL_SECS: u64 = 3 * 60;

/// Number of leading characters kept when masking an address in log messages.
pub const ADDRESS_MASK_PREFIX: usize = 6;

/// Number of trailing characters kept when masking an address in log messages.
pub const ADDRESS_MASK_SUFFIX: usize = 4;
