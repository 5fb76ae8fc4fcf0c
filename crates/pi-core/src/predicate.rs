//! Claimant predicate trees and unlock-instant resolution (spec §4.1, §9).
//!
//! Modeled as a tagged sum type rather than interpreted ad-hoc from JSON —
//! parsing happens once, in `pi_ledger::dto`, producing a `Predicate` that
//! this module walks by recursive descent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::constants::FALLBACK_UNLOCK_HORIZON_SECS;
use crate::types::Timestamp;

/// A claimant predicate, as carried by a claimable balance record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    Unconditional,
    /// Absolute deadline, already normalized to a Unix timestamp. A
    /// ledger-reported `rel_before` (relative to closeTime) is normalized to
    /// this shape by the caller before the tree reaches this module.
    AbsBefore(Timestamp),
    Not(Box<Predicate>),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
}

/// The outcome of resolving a claimable balance's claimant list to an
/// unlock instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockResolution {
    /// A `not(abs_before(T))` clause was found; `T` is the unlock instant.
    Resolved(Timestamp),
    /// No interpretable clause was found anywhere in any claimant's tree;
    /// the caller should log a Warning and use `now + 24h` as a sentinel.
    Fallback,
}

impl UnlockResolution {
    pub fn into_instant(self, clock: &dyn Clock) -> Timestamp {
        match self {
            UnlockResolution::Resolved(t) => t,
            UnlockResolution::Fallback => clock.now() + FALLBACK_UNLOCK_HORIZON_SECS,
        }
    }
}

/// Resolve the unlock instant for a single claimant's predicate tree.
///
/// Returns the smallest `not(abs_before(T))` bound reachable from the root:
/// - A bare `not(abs_before(T))` contributes `T` directly.
/// - `and(a, b)` contributes the smallest bound found in either branch
///   (the claim is only valid once *every* branch is satisfied, so the
///   most restrictive — i.e. latest unlocking — bound actually governs in
///   a fully precise model; this resolver intentionally keeps the spec's
///   simpler rule of taking the smallest `T` found anywhere, document in
///   DESIGN.md as the followed interpretation of spec §4.1).
/// - `or(a, b)` likewise traverses both branches without favoring either.
/// - `unconditional` contributes nothing.
pub fn resolve_claimant(pred: &Predicate) -> Option<Timestamp> {
    match pred {
        Predicate::Unconditional => None,
        Predicate::AbsBefore(_) => None,
        Predicate::Not(inner) => match inner.as_ref() {
            Predicate::AbsBefore(t) => Some(*t),
            other => resolve_claimant(other),
        },
        Predicate::And(a, b) => smallest(resolve_claimant(a), resolve_claimant(b)),
        Predicate::Or(a, b) => smallest(resolve_claimant(a), resolve_claimant(b)),
    }
}

fn smallest(a: Option<Timestamp>, b: Option<Timestamp>) -> Option<Timestamp> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (Some(x), None) => Some(x),
        (None, Some(y)) => Some(y),
        (None, None) => None,
    }
}

/// Resolve the unlock instant across every claimant attached to a balance.
/// The earliest bound found across all claimants wins (spec §4.1).
pub fn resolve_unlock<'a>(claimant_predicates: impl Iterator<Item = &'a Predicate>) -> UnlockResolution {
    let mut earliest: Option<Timestamp> = None;
    for pred in claimant_predicates {
        if let Some(t) = resolve_claimant(pred) {
            earliest = Some(match earliest {
                Some(cur) => cur.min(t),
                None => t,
            });
        }
    }
    match earliest {
        Some(t) => UnlockResolution::Resolved(t),
        None => UnlockResolution::Fallback,
    }
}

/// Normalize an ISO8601 `abs_before` string to a Unix timestamp.
pub fn parse_abs_before(iso8601: &str) -> Option<Timestamp> {
    DateTime::parse_from_rfc3339(iso8601)
        .map(|dt| dt.with_timezone(&Utc).timestamp())
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    fn abs_before(t: Timestamp) -> Predicate {
        Predicate::Not(Box::new(Predicate::AbsBefore(t)))
    }

    #[test]
    fn bare_not_abs_before_resolves_to_its_timestamp() {
        let p = abs_before(1_000);
        assert_eq!(resolve_claimant(&p), Some(1_000));
    }

    #[test]
    fn unconditional_contributes_nothing() {
        assert_eq!(resolve_claimant(&Predicate::Unconditional), None);
    }

    #[test]
    fn earliest_across_claimants_wins() {
        let claimants = vec![Predicate::Unconditional, abs_before(500)];
        let res = resolve_unlock(claimants.iter());
        assert_eq!(res, UnlockResolution::Resolved(500));
    }

    #[test]
    fn no_interpretable_clause_falls_back() {
        let claimants = vec![Predicate::Unconditional, Predicate::Unconditional];
        let res = resolve_unlock(claimants.iter());
        assert_eq!(res, UnlockResolution::Fallback);

        let clock = FixedClock::new(10_000);
        assert_eq!(res.into_instant(&clock), 10_000 + FALLBACK_UNLOCK_HORIZON_SECS);
    }

    #[test]
    fn ties_take_the_smallest() {
        let claimants = vec![abs_before(2_000), abs_before(1_000)];
        let res = resolve_unlock(claimants.iter());
        assert_eq!(res, UnlockResolution::Resolved(1_000));
    }

    #[test]
    fn and_takes_the_most_restrictive_nested_bound() {
        let p = Predicate::And(
            Box::new(Predicate::Unconditional),
            Box::new(abs_before(42)),
        );
        assert_eq!(resolve_claimant(&p), Some(42));
    }

    #[test]
    fn parses_rfc3339_abs_before() {
        let ts = parse_abs_before("2024-01-01T00:00:00Z").unwrap();
        assert_eq!(ts, 1_704_067_200);
    }

    #[test]
    fn purity_is_deterministic_for_a_fixed_input() {
        let claimants = vec![abs_before(7), Predicate::Unconditional];
        let r1 = resolve_unlock(claimants.iter());
        let r2 = resolve_unlock(claimants.iter());
        assert_eq!(r1, r2);
    }
}
