//! REST-facing error type and its `warp::reject::Reject` wiring.

use serde::Serialize;
use warp::http::StatusCode;
use warp::{Rejection, Reply};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("wallet secret does not derive to the supplied address")]
    AuthMismatch,
    #[error("a wallet for this address is already monitored")]
    DuplicateWallet,
    #[error("no wallet with that id is monitored")]
    WalletNotFound,
    #[error("upstream ledger error: {0}")]
    Ledger(String),
}

impl warp::reject::Reject for ApiError {}

impl From<pi_scheduler::EnrollError> for ApiError {
    fn from(e: pi_scheduler::EnrollError) -> Self {
        match e {
            pi_scheduler::EnrollError::AuthMismatch => ApiError::AuthMismatch,
            pi_scheduler::EnrollError::DuplicateAddress => ApiError::DuplicateWallet,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn status_for(err: &ApiError) -> StatusCode {
    match err {
        ApiError::AuthMismatch => StatusCode::UNPROCESSABLE_ENTITY,
        ApiError::DuplicateWallet => StatusCode::CONFLICT,
        ApiError::WalletNotFound => StatusCode::NOT_FOUND,
        ApiError::Ledger(_) => StatusCode::BAD_GATEWAY,
    }
}

/// Top-level `.recover()` handler: converts rejected `ApiError`s and
/// warp's own built-in rejections (404, bad body, ...) into a JSON body
/// with the matching status code.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, std::convert::Infallible> {
    let (status, message) = if let Some(api_err) = err.find::<ApiError>() {
        (status_for(api_err), api_err.to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if err.find::<warp::filters::body::BodyDeserializeError>().is_some() {
        (StatusCode::BAD_REQUEST, "invalid request body".to_string())
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorBody { error: message }),
        status,
    ))
}
