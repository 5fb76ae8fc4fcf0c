//! REST surface for wallet enrollment and state queries (spec §6). A thin
//! warp layer over `pi_scheduler::Supervisor` — no business logic lives
//! here beyond request/response shaping and the claimable-balances cache.

pub mod cache;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use pi_ledger::LedgerClient;
use pi_scheduler::Supervisor;

pub use cache::ClaimableBalancesCache;
pub use error::ApiError;

/// Bind and serve the REST API until the process is asked to stop. Callers
/// drive shutdown externally (e.g. a signal handler calling
/// `Supervisor::shutdown`); this future simply never resolves under normal
/// operation.
pub async fn serve<L: LedgerClient + 'static>(supervisor: Arc<Supervisor<L>>, addr: SocketAddr) {
    let cache = Arc::new(ClaimableBalancesCache::new(
        supervisor.clock.clone(),
        pi_core::CLAIMABLE_BALANCES_CACHE_TTL_SECS as i64,
    ));
    let allowed_origins = supervisor.config.cors_allowed_origins.clone();
    let routes = routes::routes(supervisor, cache, &allowed_origins);
    warp::serve(routes).run(addr).await;
}
