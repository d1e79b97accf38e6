//! DentPal operations API library.
//!
//! Shipment orchestration, return processing, seller payout adjustments,
//! and withdrawal settlement for the DentPal marketplace dashboard.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod clients;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod openapi;
pub mod services;
pub mod store;

use std::sync::Arc;

use axum::{
    response::Json,
    routing::{get, post},
    Router,
};
use http::Method;
use chrono::Utc;
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::ToSchema;

use crate::{
    clients::{CourierApi, PaymentGateway},
    handlers::AppServices,
    store::DocumentStore,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub services: AppServices,
}

impl AppState {
    pub fn new(
        config: config::AppConfig,
        store: Arc<dyn DocumentStore>,
        courier: Arc<dyn CourierApi>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let services = AppServices::new(store.clone(), courier, gateway);
        Self {
            config: Arc::new(config),
            store,
            services,
        }
    }
}

/// Success envelope shared by every endpoint.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Builds the HTTP router. CORS is open to all origins; preflight OPTIONS
/// requests are answered by the CORS layer with an empty 200.
pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/v1/shipments", post(handlers::shipments::create_shipment))
        .route(
            "/api/v1/shipments/:order_id",
            get(handlers::shipments::get_shipment),
        )
        .route(
            "/api/v1/returns/process",
            post(handlers::returns::process_return),
        )
        .route(
            "/api/v1/returns",
            get(handlers::returns::list_seller_return_requests),
        )
        .route(
            "/api/v1/payout-adjustments",
            get(handlers::payout_adjustments::list_adjustments),
        )
        .route(
            "/api/v1/payout-adjustments/process",
            post(handlers::payout_adjustments::settle_pending),
        )
        .route(
            "/api/v1/withdrawals/:id/process",
            post(handlers::withdrawals::process_withdrawal),
        )
        .route(
            "/api/v1/withdrawals/:id/status",
            // Dashboards poll with GET; the legacy admin panel POSTs.
            get(handlers::withdrawals::check_withdrawal_status)
                .post(handlers::withdrawals::check_withdrawal_status),
        )
        .merge(openapi::swagger_ui())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
