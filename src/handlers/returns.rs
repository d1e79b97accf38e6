use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::AuthUser,
    services::returns::{ProcessReturnCommand, ReturnProcessed, ReturnRequestRecord},
    ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct ReturnListQuery {
    /// Seller document id; admins may query any seller.
    pub seller_id: Option<String>,
    /// Filter by return-request status.
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequestList {
    pub return_requests: Vec<ReturnRequestRecord>,
}

#[utoipa::path(
    post,
    path = "/api/v1/returns/process",
    request_body = ProcessReturnCommand,
    responses(
        (status = 200, description = "Return processed", body = ApiResponse<ReturnProcessed>),
        (status = 400, description = "Invalid action, mismatch, or already processed", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller is not a seller on this order", body = crate::errors::ErrorResponse),
        (status = 404, description = "Return request or order not found", body = crate::errors::ErrorResponse),
        (status = 502, description = "Courier transport failure", body = crate::errors::ErrorResponse)
    ),
    tag = "Returns"
)]
pub async fn process_return(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ProcessReturnCommand>,
) -> ApiResult<ReturnProcessed> {
    let processed = state.services.returns.process_return(&user, payload).await?;
    Ok(Json(ApiResponse::success(processed)))
}

#[utoipa::path(
    get,
    path = "/api/v1/returns",
    params(ReturnListQuery),
    responses(
        (status = 200, description = "Return requests for the seller", body = ApiResponse<ReturnRequestList>),
        (status = 403, description = "Caller has no access to this seller", body = crate::errors::ErrorResponse),
        (status = 404, description = "Seller not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Returns"
)]
pub async fn list_seller_return_requests(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ReturnListQuery>,
) -> ApiResult<ReturnRequestList> {
    let return_requests = state
        .services
        .returns
        .list_seller_return_requests(&user, query.seller_id, query.status)
        .await?;
    Ok(Json(ApiResponse::success(ReturnRequestList {
        return_requests,
    })))
}
