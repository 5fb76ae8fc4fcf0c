//! pi-core
//!
//! Shared types, constants, configuration, and predicate evaluation for the
//! Pi claim watcher. Nothing in this crate performs I/O.

pub mod amount;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod predicate;
pub mod types;

pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use constants::*;
pub use error::{ClaimError, ConfigError};
pub use predicate::{Predicate, UnlockResolution};
pub use types::{
    Amount, BalanceId, BalanceState, LogLevel, LogRecord, StellarAddress, TaskKind, Timestamp,
    WalletId,
};
