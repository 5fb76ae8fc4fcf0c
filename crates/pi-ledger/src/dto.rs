//! Wire shapes for the ledger's REST API (spec §6), and the conversion from
//! its predicate JSON into `pi_core::Predicate`.

use pi_core::predicate::parse_abs_before;
use pi_core::{Predicate, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct ClaimableBalancesResponse {
    #[serde(rename = "_embedded")]
    pub embedded: Embedded,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Embedded {
    pub records: Vec<ClaimableBalanceRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaimableBalanceRecord {
    pub id: String,
    pub amount: String,
    pub claimants: Vec<ClaimantRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaimantRecord {
    pub destination: String,
    pub predicate: PredicateJson,
}

/// The ledger's JSON predicate shape, parsed one-to-one into this type
/// before being normalized into `pi_core::Predicate`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PredicateJson {
    pub unconditional: Option<bool>,
    pub abs_before: Option<String>,
    pub rel_before: Option<String>,
    #[serde(default)]
    pub not: Option<Box<PredicateJson>>,
    #[serde(default)]
    pub and: Option<[Box<PredicateJson>; 2]>,
    #[serde(default)]
    pub or: Option<[Box<PredicateJson>; 2]>,
}

impl PredicateJson {
    /// Normalize into the tagged sum type, resolving `abs_before` to a Unix
    /// timestamp and treating an unparseable or `rel_before` clause as
    /// non-interpretable (folded into `Unconditional`, which contributes no
    /// bound — the caller's UnlockResolver falls back to the 24h sentinel).
    pub fn into_predicate(self, closed_at: Timestamp) -> Predicate {
        if self.unconditional == Some(true) {
            return Predicate::Unconditional;
        }
        if let Some(iso) = &self.abs_before {
            return match parse_abs_before(iso) {
                Some(t) => Predicate::AbsBefore(t),
                None => Predicate::Unconditional,
            };
        }
        if let Some(rel) = &self.rel_before {
            return match rel.parse::<i64>() {
                Ok(secs) => Predicate::AbsBefore(closed_at + secs),
                Err(_) => Predicate::Unconditional,
            };
        }
        if let Some(inner) = self.not {
            return Predicate::Not(Box::new(inner.into_predicate(closed_at)));
        }
        if let Some([a, b]) = self.and {
            return Predicate::And(
                Box::new(a.into_predicate(closed_at)),
                Box::new(b.into_predicate(closed_at)),
            );
        }
        if let Some([a, b]) = self.or {
            return Predicate::Or(
                Box::new(a.into_predicate(closed_at)),
                Box::new(b.into_predicate(closed_at)),
            );
        }
        Predicate::Unconditional
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountResponse {
    pub sequence: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitTransactionRequest {
    pub tx: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitTransactionResponse {
    pub hash: Option<String>,
    #[serde(default)]
    pub successful: bool,
    #[serde(default)]
    pub extras: Option<SubmitExtras>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitExtras {
    pub result_codes: Option<ResultCodes>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultCodes {
    pub transaction: Option<String>,
    #[serde(default)]
    pub operations: Vec<String>,
}
