//! `LedgerClient`: the narrow I/O capability the scheduler depends on
//! (spec §1, C1). Pure I/O, no retry policy — classification and retry
//! live above this layer.

use std::time::Duration;

use async_trait::async_trait;
use pi_core::error::ClaimError;

use crate::dto::{
    AccountResponse, ClaimableBalancesResponse, SubmitTransactionRequest,
    SubmitTransactionResponse,
};

/// A claimable balance as returned by the ledger, with its predicates
/// already normalized into `pi_core::Predicate` by the caller of
/// `fetch_claimable_balances`.
#[derive(Debug, Clone)]
pub struct ClaimableBalance {
    pub id: String,
    pub amount: String,
    pub claimants: Vec<Claimant>,
}

#[derive(Debug, Clone)]
pub struct Claimant {
    pub destination: String,
    pub predicate: pi_core::Predicate,
}

/// Outcome of a transaction submission, already classified.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub hash: String,
    pub successful: bool,
}

#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn fetch_claimable_balances(
        &self,
        claimant: &str,
    ) -> Result<Vec<ClaimableBalance>, ClaimError>;

    async fn fetch_sequence(&self, address: &str) -> Result<i64, ClaimError>;

    async fn submit(&self, blob: &[u8]) -> Result<SubmitOutcome, ClaimError>;
}

/// `reqwest`-backed implementation talking to the ledger's REST API
/// (spec §6).
pub struct HttpLedgerClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpLedgerClient {
    pub fn new(base_url: String, call_timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(call_timeout)
            .build()
            .expect("reqwest client builder with a plain timeout is infallible");
        Self { http, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn fetch_claimable_balances(
        &self,
        claimant: &str,
    ) -> Result<Vec<ClaimableBalance>, ClaimError> {
        let resp = self
            .http
            .get(self.url("/claimable_balances/"))
            .query(&[("claimant", claimant)])
            .send()
            .await
            .map_err(|e| ClaimError::Transient(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ClaimError::Transient(format!(
                "claimable_balances returned {}",
                resp.status()
            )));
        }

        let body: ClaimableBalancesResponse = resp
            .json()
            .await
            .map_err(|e| ClaimError::Transient(format!("malformed response body: {e}")))?;

        // The ledger's closeTime is not exposed on this endpoint; `rel_before`
        // predicates are normalized against "now" at parse time, which is an
        // acceptable approximation since such predicates never occur in
        // practice for claimable balances (see DESIGN.md).
        let now = chrono::Utc::now().timestamp();

        let balances = body
            .embedded
            .records
            .into_iter()
            .map(|record| ClaimableBalance {
                id: record.id,
                amount: record.amount,
                claimants: record
                    .claimants
                    .into_iter()
                    .map(|c| Claimant {
                        destination: c.destination,
                        predicate: c.predicate.into_predicate(now),
                    })
                    .collect(),
            })
            .collect();

        Ok(balances)
    }

    async fn fetch_sequence(&self, address: &str) -> Result<i64, ClaimError> {
        let resp = self
            .http
            .get(self.url(&format!("/accounts/{address}")))
            .send()
            .await
            .map_err(|e| ClaimError::Transient(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ClaimError::Transient(format!(
                "accounts/{address} returned {}",
                resp.status()
            )));
        }

        let body: AccountResponse = resp
            .json()
            .await
            .map_err(|e| ClaimError::Transient(format!("malformed account response: {e}")))?;

        body.sequence
            .parse()
            .map_err(|_| ClaimError::Transient(format!("unparseable sequence {:?}", body.sequence)))
    }

    async fn submit(&self, blob: &[u8]) -> Result<SubmitOutcome, ClaimError> {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine;

        let req = SubmitTransactionRequest {
            tx: STANDARD.encode(blob),
        };

        let resp = self
            .http
            .post(self.url("/transactions"))
            .form(&req)
            .send()
            .await
            .map_err(|e| ClaimError::Transient(e.to_string()))?;

        let status = resp.status();
        let body: SubmitTransactionResponse = resp
            .json()
            .await
            .map_err(|e| ClaimError::Transient(format!("malformed submit response: {e}")))?;

        if status.is_success() && body.successful {
            return Ok(SubmitOutcome {
                hash: body.hash.unwrap_or_default(),
                successful: true,
            });
        }

        Err(classify_rejection(status, &body))
    }
}

/// Map a rejected submission to its `ClaimError` variant using the
/// structured `result_codes` field — never string-sniffing the message
/// (spec §9).
fn classify_rejection(
    status: reqwest::StatusCode,
    body: &SubmitTransactionResponse,
) -> ClaimError {
    let code = body
        .extras
        .as_ref()
        .and_then(|e| e.result_codes.as_ref())
        .and_then(|rc| rc.transaction.as_deref());

    match code {
        Some("tx_bad_seq") => ClaimError::BadSequence,
        Some("tx_bad_auth") => ClaimError::BadAuth,
        Some(other) if other.starts_with("tx_") => {
            ClaimError::Logic(format!("ledger rejected transaction: {other}"))
        }
        Some(other) => ClaimError::Transient(format!("unrecognized result code: {other}")),
        None if status.is_client_error() => {
            ClaimError::Logic(format!("ledger rejected transaction with status {status}"))
        }
        None => ClaimError::Transient(format!("ledger returned status {status} with no result codes")),
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// An in-memory `LedgerClient` used by `SequenceCache` and scheduler
    /// tests: returns a fixed sequence number and counts calls, optionally
    /// holding each fetch open briefly to exercise coalescing.
    pub struct CountingClient {
        sequence: i64,
        calls: AtomicUsize,
        delay: Mutex<Option<Duration>>,
    }

    impl CountingClient {
        pub fn new(sequence: i64) -> Self {
            Self {
                sequence,
                calls: AtomicUsize::new(0),
                delay: Mutex::new(None),
            }
        }

        pub fn with_delay(self) -> Self {
            *self.delay.lock().unwrap() = Some(Duration::from_millis(20));
            self
        }

        pub fn sequence_calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LedgerClient for CountingClient {
        async fn fetch_claimable_balances(
            &self,
            _claimant: &str,
        ) -> Result<Vec<ClaimableBalance>, ClaimError> {
            Ok(Vec::new())
        }

        async fn fetch_sequence(&self, _address: &str) -> Result<i64, ClaimError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(d) = *self.delay.lock().unwrap() {
                tokio::time::sleep(d).await;
            }
            Ok(self.sequence)
        }

        async fn submit(&self, _blob: &[u8]) -> Result<SubmitOutcome, ClaimError> {
            Ok(SubmitOutcome {
                hash: "deadbeef".to_string(),
                successful: true,
            })
        }
    }

    #[test]
    fn classifies_bad_sequence() {
        let body = SubmitTransactionResponse {
            hash: None,
            successful: false,
            extras: Some(crate::dto::SubmitExtras {
                result_codes: Some(crate::dto::ResultCodes {
                    transaction: Some("tx_bad_seq".to_string()),
                    operations: vec![],
                }),
            }),
        };
        assert!(matches!(
            classify_rejection(reqwest::StatusCode::BAD_REQUEST, &body),
            ClaimError::BadSequence
        ));
    }

    #[test]
    fn classifies_bad_auth() {
        let body = SubmitTransactionResponse {
            hash: None,
            successful: false,
            extras: Some(crate::dto::SubmitExtras {
                result_codes: Some(crate::dto::ResultCodes {
                    transaction: Some("tx_bad_auth".to_string()),
                    operations: vec![],
                }),
            }),
        };
        assert!(matches!(
            classify_rejection(reqwest::StatusCode::BAD_REQUEST, &body),
            ClaimError::BadAuth
        ));
    }

    #[test]
    fn unknown_codes_are_transient() {
        let body = SubmitTransactionResponse {
            hash: None,
            successful: false,
            extras: None,
        };
        assert!(matches!(
            classify_rejection(reqwest::StatusCode::INTERNAL_SERVER_ERROR, &body),
            ClaimError::Transient(_)
        ));
    }
}
