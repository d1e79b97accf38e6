use axum::{
    extract::{Path, State},
    response::Json,
};

use crate::{
    auth::AuthUser, services::withdrawals::WithdrawalProcessed, ApiResponse, ApiResult, AppState,
};

#[utoipa::path(
    post,
    path = "/api/v1/withdrawals/{id}/process",
    params(
        ("id" = String, Path, description = "Withdrawal ID")
    ),
    responses(
        (status = 200, description = "Withdrawal submitted to the gateway", body = ApiResponse<WithdrawalProcessed>),
        (status = 400, description = "Withdrawal not in approved status, or gateway rejection", body = crate::errors::ErrorResponse),
        (status = 403, description = "Admin access required", body = crate::errors::ErrorResponse),
        (status = 404, description = "Withdrawal not found", body = crate::errors::ErrorResponse),
        (status = 502, description = "Gateway transport failure", body = crate::errors::ErrorResponse)
    ),
    tag = "Withdrawals"
)]
pub async fn process_withdrawal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<WithdrawalProcessed> {
    let processed = state.services.withdrawals.process(&user, &id).await?;
    Ok(Json(ApiResponse::success(processed)))
}

#[utoipa::path(
    get,
    path = "/api/v1/withdrawals/{id}/status",
    params(
        ("id" = String, Path, description = "Withdrawal ID")
    ),
    responses(
        (status = 200, description = "Reconciled withdrawal status", body = ApiResponse<WithdrawalProcessed>),
        (status = 400, description = "Withdrawal has no gateway transaction", body = crate::errors::ErrorResponse),
        (status = 403, description = "Admin access required", body = crate::errors::ErrorResponse),
        (status = 404, description = "Withdrawal not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Withdrawals"
)]
pub async fn check_withdrawal_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<WithdrawalProcessed> {
    let status = state.services.withdrawals.check_status(&user, &id).await?;
    Ok(Json(ApiResponse::success(status)))
}
