//! pi-ledger
//!
//! The ledger-facing I/O layer: the `LedgerClient` capability, the
//! sequence-number cache built on top of it, and the transaction envelope
//! builder. Nothing in here owns scheduling state.

pub mod client;
pub mod dto;
pub mod envelope;
pub mod sequence;

pub use client::{Claimant, ClaimableBalance, HttpLedgerClient, LedgerClient, SubmitOutcome};
pub use envelope::{build_and_sign, SignedEnvelope};
pub use sequence::SequenceCache;
