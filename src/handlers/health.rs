use axum::response::Json;
use serde_json::{json, Value};

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy")
    ),
    tag = "Health"
)]
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "dentpal-ops-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
