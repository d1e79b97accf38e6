use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    models::Seller,
    services::{
        authorization,
        payout_ledger::{AdjustmentRecord, AdjustmentSummary, SettlementReport},
    },
    store, ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentListQuery {
    /// Seller document id; admins may query any seller.
    pub seller_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentList {
    pub adjustments: Vec<AdjustmentRecord>,
    pub summary: AdjustmentSummary,
}

#[utoipa::path(
    get,
    path = "/api/v1/payout-adjustments",
    params(AdjustmentListQuery),
    responses(
        (status = 200, description = "Adjustments with totals", body = ApiResponse<AdjustmentList>),
        (status = 403, description = "Caller has no access to this seller", body = crate::errors::ErrorResponse),
        (status = 404, description = "Seller not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Payout Adjustments"
)]
pub async fn list_adjustments(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AdjustmentListQuery>,
) -> ApiResult<AdjustmentList> {
    let seller_id = match query.seller_id {
        Some(requested) => {
            let Some(doc) = state.store.get(store::SELLERS, &requested).await? else {
                return Err(ServiceError::NotFound(format!(
                    "Seller {requested} not found"
                )));
            };
            let seller: Seller = doc.parse()?;
            if !authorization::can_view_seller_adjustments(&user, &seller) {
                return Err(ServiceError::Forbidden(
                    "You do not have access to this seller".into(),
                ));
            }
            requested
        }
        None => authorization::resolve_own_seller_id(state.store.as_ref(), &user).await?,
    };

    let (adjustments, summary) = state
        .services
        .payout_ledger
        .list_for_seller(&seller_id)
        .await?;
    Ok(Json(ApiResponse::success(AdjustmentList {
        adjustments,
        summary,
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/payout-adjustments/process",
    responses(
        (status = 200, description = "Settlement report with per-record outcomes", body = ApiResponse<SettlementReport>),
        (status = 401, description = "Unauthenticated", body = crate::errors::ErrorResponse),
        (status = 403, description = "Admin access required", body = crate::errors::ErrorResponse)
    ),
    tag = "Payout Adjustments"
)]
pub async fn settle_pending(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<SettlementReport> {
    user.require_admin()?;
    let report = state
        .services
        .payout_ledger
        .settle_pending(&user.uid)
        .await?;
    Ok(Json(ApiResponse::success(report)))
}
