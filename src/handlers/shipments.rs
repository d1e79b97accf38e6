use axum::{
    extract::{Path, State},
    response::Json,
};

use crate::{
    auth::AuthUser,
    services::shipments::{CreateShipmentCommand, ShipmentCreated, ShipmentView},
    ApiResponse, ApiResult, AppState,
};

#[utoipa::path(
    post,
    path = "/api/v1/shipments",
    request_body = CreateShipmentCommand,
    responses(
        (status = 200, description = "Shipment booked", body = ApiResponse<ShipmentCreated>),
        (status = 400, description = "Missing fields, bad order status, or courier rejection", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthenticated", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller has no access to this order", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order already has a shipment", body = crate::errors::ErrorResponse),
        (status = 500, description = "Shipment booked but the order record is stale", body = crate::errors::ErrorResponse)
    ),
    tag = "Shipments"
)]
pub async fn create_shipment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateShipmentCommand>,
) -> ApiResult<ShipmentCreated> {
    let created = state
        .services
        .shipments
        .create_shipment(&user, payload)
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/shipments/{order_id}",
    params(
        ("order_id" = String, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Shipment record", body = ApiResponse<ShipmentView>),
        (status = 404, description = "Order or shipment not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Shipments"
)]
pub async fn get_shipment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
) -> ApiResult<ShipmentView> {
    let view = state
        .services
        .shipments
        .get_shipment(&user, &order_id)
        .await?;
    Ok(Json(ApiResponse::success(view)))
}
