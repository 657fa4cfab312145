use axum::Json;
use serde_json::{Value, json};

/// GET /api/healthcheck
pub async fn healthcheck() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
