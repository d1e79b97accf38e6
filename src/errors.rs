use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::store::StoreError;

/// Error body returned by every endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Not Found",
    "message": "Order ORD-1042 not found",
    "details": null,
    "timestamp": "2026-08-30T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Conflict")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Additional diagnostic detail (status-gate diagnostics, upstream payloads)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Order is not in a shippable state. Carries the raw and normalized
    /// status strings so support can see exactly what the document held.
    #[error("Order status '{raw}' does not allow shipment creation")]
    InvalidOrderStatus { raw: String, normalized: String },

    #[error("Authentication error: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Admin-gated operation invoked by a non-admin. Uniform across every
    /// admin-only endpoint.
    #[error("Unauthorized. Admin access required.")]
    AdminAccessRequired,

    #[error("Not found: {0}")]
    NotFound(String),

    /// Shipment already booked for this order.
    #[error("Order already has a shipment (tracking {tracking_id})")]
    AlreadyShipped { tracking_id: String },

    /// The upstream service answered but reported a business failure.
    #[error("Upstream rejected request: {message}")]
    UpstreamRejected {
        message: String,
        payload: serde_json::Value,
    },

    /// The upstream service could not be reached or timed out.
    #[error("Upstream service unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The external side effect happened but the local write did not.
    /// The caller must learn the tracking id: a real-world shipment exists
    /// even though our own record is stale.
    #[error("Shipment {tracking_id} was created but the order record could not be updated: {message}")]
    PartialFulfillment {
        tracking_id: String,
        reference_no: String,
        message: String,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_)
            | Self::BadRequest(_)
            | Self::InvalidOrderStatus { .. }
            | Self::UpstreamRejected { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) | Self::AdminAccessRequired => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyShipped { .. } => StatusCode::CONFLICT,
            Self::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::PartialFulfillment { .. } | Self::Store(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message suitable for HTTP responses. Store and internal errors are
    /// collapsed to a generic message so implementation detail never leaks.
    pub fn response_message(&self) -> String {
        match self {
            Self::Store(_) => "Database error".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Structured diagnostics attached to the response body, where the
    /// taxonomy calls for them.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::InvalidOrderStatus { raw, normalized } => Some(json!({
                "rawStatus": raw,
                "normalizedStatus": normalized,
                "allowedStatuses": crate::services::shipments::SHIPPABLE_STATUSES,
            })),
            Self::UpstreamRejected { payload, .. } => Some(payload.clone()),
            Self::AlreadyShipped { tracking_id } => Some(json!({
                "trackingId": tracking_id,
            })),
            Self::PartialFulfillment {
                tracking_id,
                reference_no,
                ..
            } => Some(json!({
                "trackingId": tracking_id,
                "shippingReferenceNo": reference_no,
                "shipmentCreated": true,
                "orderUpdated": false,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: self.details(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn status_code_mapping() {
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::Unauthenticated("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::AdminAccessRequired.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServiceError::AlreadyShipped {
                tracking_id: "T1".into()
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::UpstreamUnavailable("down".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ServiceError::UpstreamRejected {
                message: "no coverage".into(),
                payload: json!({}),
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::PartialFulfillment {
                tracking_id: "T1".into(),
                reference_no: "DPAL-1".into(),
                message: "write failed".into(),
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn admin_gate_message_is_uniform() {
        assert_eq!(
            ServiceError::AdminAccessRequired.response_message(),
            "Unauthorized. Admin access required."
        );
    }

    #[test]
    fn store_errors_hide_detail() {
        let err = ServiceError::Store(StoreError::Backend("connection refused".into()));
        assert_eq!(err.response_message(), "Database error");
    }

    #[tokio::test]
    async fn partial_fulfillment_response_carries_tracking_id() {
        let err = ServiceError::PartialFulfillment {
            tracking_id: "JRS-9107".into(),
            reference_no: "DPAL-O77".into(),
            message: "order write failed".into(),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        let details = payload.details.expect("details");
        assert_eq!(details["trackingId"], "JRS-9107");
        assert_eq!(details["shipmentCreated"], true);
        assert_eq!(details["orderUpdated"], false);
        assert!(payload.message.contains("JRS-9107"));
    }

    #[tokio::test]
    async fn invalid_status_response_includes_diagnostics() {
        let err = ServiceError::InvalidOrderStatus {
            raw: " CANCELLED ".into(),
            normalized: "cancelled".into(),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        let details = payload.details.expect("details");
        assert_eq!(details["rawStatus"], " CANCELLED ");
        assert!(details["allowedStatuses"].is_array());
    }
}
