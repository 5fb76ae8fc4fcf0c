use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{ADDRESS_MASK_PREFIX, ADDRESS_MASK_SUFFIX};

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

/// A claimed/claimable amount, stored as 7-decimal-fraction stroops
/// (1 unit = 10_000_000 stroops), matching the ledger's native asset precision.
pub type Amount = i64;

/// Opaque wallet identifier, assigned by the registry on enrollment.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WalletId(pub u64);

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wallet-{}", self.0)
    }
}

impl fmt::Debug for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WalletId({})", self.0)
    }
}

/// Globally-unique claimable balance identifier, as issued by the ledger
/// (a hex string in the wire format; opaque here).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BalanceId(pub String);

impl fmt::Display for BalanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for BalanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.0;
        if s.len() > 16 {
            write!(f, "BalanceId({}…)", &s[..16])
        } else {
            write!(f, "BalanceId({s})")
        }
    }
}

/// A StrKey-encoded Ed25519 public key (ledger account address).
///
/// Validated on construction: correct version byte, correct length, correct
/// CRC16/XModem checksum. See `pi_crypto::strkey`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StellarAddress(String);

impl StellarAddress {
    /// Construct from an already-validated StrKey string. Prefer
    /// `pi_crypto::strkey::decode_address` for untrusted input.
    pub fn new_unchecked(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 6 / last 4 characters, ellipsis in between — never log a full
    /// address, per the no-PII-in-messages invariant.
    pub fn masked(&self) -> String {
        let s = &self.0;
        if s.len() <= ADDRESS_MASK_PREFIX + ADDRESS_MASK_SUFFIX {
            return "…".to_string();
        }
        format!(
            "{}…{}",
            &s[..ADDRESS_MASK_PREFIX],
            &s[s.len() - ADDRESS_MASK_SUFFIX..]
        )
    }
}

impl fmt::Display for StellarAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for StellarAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StellarAddress({})", self.masked())
    }
}

impl TryFrom<String> for StellarAddress {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Ok(Self(s))
    }
}

impl From<StellarAddress> for String {
    fn from(a: StellarAddress) -> String {
        a.0
    }
}

// ── Scheduling state ─────────────────────────────────────────────────────────

/// State of a tracked claimable balance. Transitions only in the order
/// listed, with `Failed -> PreFetching` allowed on retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceState {
    Pending,
    PreFetching,
    Ready,
    Submitting,
    Succeeded,
    Failed,
}

/// The kind of a scheduled task armed against a balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    PreFetch,
    Submit,
    Retry,
}

// ── Logging ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// An append-only entry in the bounded in-memory log ring. Never contains
/// secrets; addresses appearing in `message` must already be masked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: u64,
    pub timestamp: Timestamp,
    pub level: LogLevel,
    pub message: String,
    pub wallet_id: Option<WalletId>,
}
