//! pi-scheduler
//!
//! The Claim Scheduler: registries, the per-balance state machine, the
//! poll loop, and the Supervisor tying them together.

pub mod balance_registry;
pub mod log_ring;
pub mod poll_loop;
pub mod scheduler;
pub mod supervisor;
pub mod wallet_registry;

pub use balance_registry::{BalanceEntry, BalanceRegistry, BalanceSnapshot};
pub use log_ring::LogRing;
pub use scheduler::ClaimScheduler;
pub use supervisor::Supervisor;
pub use wallet_registry::{EnrollError, Wallet, WalletRegistry, WalletSummary};
