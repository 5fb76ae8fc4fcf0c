//! JSON request/response shapes for the REST surface (spec §6).

use pi_core::types::{BalanceState, LogLevel};
use pi_core::Predicate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct MonitorWalletRequest {
    pub address: String,
    pub secret: String,
    pub destination: String,
}

#[derive(Debug, Serialize)]
pub struct WalletDto {
    pub id: u64,
    pub address: String,
    pub destination: String,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    pub quarantined: bool,
}

#[derive(Debug, Serialize)]
pub struct MonitorWalletResponse {
    pub wallet: WalletDto,
}

#[derive(Debug, Serialize)]
pub struct WalletsResponse {
    pub wallets: Vec<WalletDto>,
}

#[derive(Debug, Serialize)]
pub struct BalanceDto {
    #[serde(rename = "walletId")]
    pub wallet_id: u64,
    #[serde(rename = "balanceId")]
    pub balance_id: String,
    pub amount: String,
    #[serde(rename = "unlockAt")]
    pub unlock_at: i64,
    pub state: BalanceState,
}

#[derive(Debug, Serialize)]
pub struct BalancesResponse {
    pub balances: Vec<BalanceDto>,
}

#[derive(Debug, Serialize, Clone)]
pub struct ClaimantDto {
    pub destination: String,
    pub predicate: Predicate,
}

#[derive(Debug, Serialize, Clone)]
pub struct ClaimableBalanceDto {
    pub id: String,
    pub amount: String,
    pub claimants: Vec<ClaimantDto>,
}

#[derive(Debug, Serialize)]
pub struct ClaimableBalancesResponse {
    pub records: Vec<ClaimableBalanceDto>,
}

#[derive(Debug, Serialize)]
pub struct SequenceResponse {
    pub sequence: i64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: i64,
}

#[derive(Debug, Serialize)]
pub struct LogDto {
    pub id: u64,
    pub timestamp: i64,
    pub level: LogLevel,
    pub message: String,
    #[serde(rename = "walletId", skip_serializing_if = "Option::is_none")]
    pub wallet_id: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub logs: Vec<LogDto>,
}
