//! Endpoint handlers (spec §6). Each takes its dependencies by `Arc` and
//! returns a `warp::Reply`, raising typed rejections on failure so
//! `error::handle_rejection` can map them to the right status code.

use std::sync::Arc;

use pi_core::types::{StellarAddress, WalletId};
use pi_core::Clock;
use pi_ledger::LedgerClient;
use pi_scheduler::Supervisor;
use warp::{Rejection, Reply};

use crate::cache::ClaimableBalancesCache;
use crate::dto::{
    BalanceDto, BalancesResponse, ClaimableBalanceDto, ClaimableBalancesResponse, HealthResponse,
    LogDto, LogsResponse, MonitorWalletRequest, MonitorWalletResponse, SequenceResponse, WalletDto,
    WalletsResponse,
};
use crate::error::ApiError;

fn wallet_dto(s: pi_scheduler::WalletSummary) -> WalletDto {
    WalletDto {
        id: s.id.0,
        address: s.address,
        destination: s.destination,
        created_at: s.created_at,
        quarantined: s.quarantined,
    }
}

pub async fn monitor_wallet<L: LedgerClient + 'static>(
    body: MonitorWalletRequest,
    supervisor: Arc<Supervisor<L>>,
) -> Result<impl Reply, Rejection> {
    pi_crypto::decode_address(&body.destination).map_err(|_| warp::reject::custom(ApiError::AuthMismatch))?;
    let destination = StellarAddress::new_unchecked(body.destination.clone());

    let summary = supervisor
        .enroll_wallet(&body.address, &body.secret, destination)
        .map_err(|e| warp::reject::custom(ApiError::from(e)))?;

    Ok(warp::reply::json(&MonitorWalletResponse {
        wallet: wallet_dto(summary),
    }))
}

pub async fn list_wallets<L: LedgerClient + 'static>(
    supervisor: Arc<Supervisor<L>>,
) -> Result<impl Reply, Rejection> {
    let wallets = supervisor.wallets.list().into_iter().map(wallet_dto).collect();
    Ok(warp::reply::json(&WalletsResponse { wallets }))
}

pub async fn stop_monitoring<L: LedgerClient + 'static>(
    wallet_id: u64,
    supervisor: Arc<Supervisor<L>>,
) -> Result<impl Reply, Rejection> {
    if !supervisor.remove_wallet(WalletId(wallet_id)) {
        return Err(warp::reject::custom(ApiError::WalletNotFound));
    }
    Ok(warp::reply::json(&serde_json::json!({ "removed": true })))
}

pub async fn claimable_balances<L: LedgerClient + 'static>(
    address: String,
    supervisor: Arc<Supervisor<L>>,
    cache: Arc<ClaimableBalancesCache>,
) -> Result<impl Reply, Rejection> {
    let records = if let Some(cached) = cache.get(&address) {
        cached
    } else {
        let fetched = supervisor
            .ledger()
            .fetch_claimable_balances(&address)
            .await
            .map_err(|e| warp::reject::custom(ApiError::Ledger(e.to_string())))?;
        cache.put(&address, fetched.clone());
        fetched
    };

    let records = records
        .into_iter()
        .map(|b| ClaimableBalanceDto {
            id: b.id,
            amount: b.amount,
            claimants: b
                .claimants
                .into_iter()
                .map(|c| crate::dto::ClaimantDto {
                    destination: c.destination,
                    predicate: c.predicate,
                })
                .collect(),
        })
        .collect();
    Ok(warp::reply::json(&ClaimableBalancesResponse { records }))
}

pub async fn monitored_balances<L: LedgerClient + 'static>(
    wallet_id: Option<u64>,
    supervisor: Arc<Supervisor<L>>,
) -> Result<impl Reply, Rejection> {
    let balances = supervisor
        .balances
        .list(wallet_id.map(WalletId))
        .into_iter()
        .map(|b| BalanceDto {
            wallet_id: b.wallet_id.0,
            balance_id: b.balance_id,
            amount: pi_core::amount::format_amount(b.amount),
            unlock_at: b.unlock_at,
            state: b.state,
        })
        .collect();
    Ok(warp::reply::json(&BalancesResponse { balances }))
}

pub async fn sequence<L: LedgerClient + 'static>(
    address: String,
    supervisor: Arc<Supervisor<L>>,
) -> Result<impl Reply, Rejection> {
    let sequence = supervisor
        .fetch_sequence(&address)
        .await
        .map_err(|e| warp::reject::custom(ApiError::Ledger(e.to_string())))?;
    Ok(warp::reply::json(&SequenceResponse { sequence }))
}

pub async fn list_logs<L: LedgerClient + 'static>(
    supervisor: Arc<Supervisor<L>>,
) -> Result<impl Reply, Rejection> {
    let logs = supervisor
        .logs
        .snapshot()
        .into_iter()
        .map(|r| LogDto {
            id: r.id,
            timestamp: r.timestamp,
            level: r.level,
            message: r.message,
            wallet_id: r.wallet_id.map(|w| w.0),
        })
        .collect();
    Ok(warp::reply::json(&LogsResponse { logs }))
}

pub async fn clear_logs<L: LedgerClient + 'static>(
    supervisor: Arc<Supervisor<L>>,
) -> Result<impl Reply, Rejection> {
    supervisor.logs.clear();
    Ok(warp::reply::json(&serde_json::json!({ "cleared": true })))
}

pub async fn health<L: LedgerClient + 'static>(
    supervisor: Arc<Supervisor<L>>,
) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&HealthResponse {
        status: "ok",
        timestamp: supervisor.clock.now(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pi_core::clock::FixedClock;
    use pi_core::error::ClaimError;
    use pi_ledger::client::{ClaimableBalance, SubmitOutcome};
    use pi_core::Config;

    struct StubLedger;

    #[async_trait::async_trait]
    impl LedgerClient for StubLedger {
        async fn fetch_claimable_balances(&self, _claimant: &str) -> Result<Vec<ClaimableBalance>, ClaimError> {
            Ok(Vec::new())
        }
        async fn fetch_sequence(&self, _address: &str) -> Result<i64, ClaimError> {
            Ok(42)
        }
        async fn submit(&self, _blob: &[u8]) -> Result<SubmitOutcome, ClaimError> {
            Ok(SubmitOutcome {
                hash: "x".to_string(),
                successful: true,
            })
        }
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let clock: Arc<dyn pi_core::Clock> = Arc::new(FixedClock::new(1_234));
        let supervisor = Supervisor::new(Config::default(), clock, Arc::new(StubLedger));
        let reply = health(supervisor).await.unwrap().into_response();
        assert_eq!(reply.status(), warp::http::StatusCode::OK);
    }
}
