//! Filter composition for the REST surface (spec §6), grounded in the
//! owner/host route split of an older warp-based command server: plain
//! `warp::any().map(move || ...)` injection filters feeding `and_then`
//! handlers, recovered through one top-level error mapper.

use std::convert::Infallible;
use std::sync::Arc;

use pi_ledger::LedgerClient;
use pi_scheduler::Supervisor;
use warp::{Filter, Rejection, Reply};

use crate::cache::ClaimableBalancesCache;
use crate::error::handle_rejection;
use crate::handlers;

mod inject {
    use super::*;

    pub fn supervisor<L: LedgerClient + 'static>(
        supervisor: Arc<Supervisor<L>>,
    ) -> impl Filter<Extract = (Arc<Supervisor<L>>,), Error = Infallible> + Clone {
        warp::any().map(move || supervisor.clone())
    }

    pub fn cache(
        cache: Arc<ClaimableBalancesCache>,
    ) -> impl Filter<Extract = (Arc<ClaimableBalancesCache>,), Error = Infallible> + Clone {
        warp::any().map(move || cache.clone())
    }
}

/// Build the full set of routes, wrapped in CORS and the error recovery
/// filter. `allowed_origins` empty means permissive (spec §9: CORS should be
/// driven externally, not hard-coded to a single policy).
pub fn routes<L: LedgerClient + 'static>(
    supervisor: Arc<Supervisor<L>>,
    cache: Arc<ClaimableBalancesCache>,
    allowed_origins: &[String],
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let monitor_wallet = warp::path("monitor-wallet")
        .and(warp::post())
        .and(warp::body::json())
        .and(inject::supervisor(supervisor.clone()))
        .and_then(handlers::monitor_wallet);

    let list_wallets = warp::path("wallets")
        .and(warp::get())
        .and(inject::supervisor(supervisor.clone()))
        .and_then(handlers::list_wallets);

    let stop_monitoring = warp::path("stop-monitoring")
        .and(warp::path::param::<u64>())
        .and(warp::path::end())
        .and(warp::delete())
        .and(inject::supervisor(supervisor.clone()))
        .and_then(handlers::stop_monitoring);

    let claimable_balances = warp::path("claimable-balances")
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::get())
        .and(inject::supervisor(supervisor.clone()))
        .and(inject::cache(cache))
        .and_then(handlers::claimable_balances);

    let monitored_balances_all = warp::path("monitored-balances")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::any().map(|| None::<u64>))
        .and(inject::supervisor(supervisor.clone()))
        .and_then(handlers::monitored_balances);
    let monitored_balances_for_wallet = warp::path("monitored-balances")
        .and(warp::path::param::<u64>())
        .and(warp::path::end())
        .and(warp::get())
        .and_then(|id: u64| async move { Ok::<_, Rejection>(Some(id)) })
        .and(inject::supervisor(supervisor.clone()))
        .and_then(handlers::monitored_balances);
    let monitored_balances = monitored_balances_for_wallet.or(monitored_balances_all);

    let sequence = warp::path("sequence")
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::get())
        .and(inject::supervisor(supervisor.clone()))
        .and_then(handlers::sequence);

    let list_logs = warp::path("logs")
        .and(warp::path::end())
        .and(warp::get())
        .and(inject::supervisor(supervisor.clone()))
        .and_then(handlers::list_logs);
    let clear_logs = warp::path("logs")
        .and(warp::path::end())
        .and(warp::delete())
        .and(inject::supervisor(supervisor.clone()))
        .and_then(handlers::clear_logs);

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and(inject::supervisor(supervisor.clone()))
        .and_then(handlers::health);

    let cors = build_cors(allowed_origins);

    monitor_wallet
        .or(list_wallets)
        .or(stop_monitoring)
        .or(claimable_balances)
        .or(monitored_balances)
        .or(sequence)
        .or(list_logs)
        .or(clear_logs)
        .or(health)
        .recover(handle_rejection)
        .with(cors)
}

fn build_cors(allowed_origins: &[String]) -> warp::cors::Builder {
    let cors = warp::cors()
        .allow_methods(vec!["GET", "POST", "DELETE"])
        .allow_headers(vec!["content-type"]);

    if allowed_origins.is_empty() {
        cors.allow_any_origin()
    } else {
        let origins: Vec<&str> = allowed_origins.iter().map(String::as_str).collect();
        cors.allow_origins(origins)
    }
}
