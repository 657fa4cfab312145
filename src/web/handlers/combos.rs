use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_extra::extract::WithRejection;
use serde_json::{Value, json};
use validator::Validate;

use super::{IdPath, JsonBody};
use crate::error::AppResult;
use crate::models::{ComboPatch, NewCombo};
use crate::web::api::AppState;
use crate::web::auth::AuthUser;

/// GET /api/combos
pub async fn list_combos(State(state): State<AppState>) -> Json<Value> {
    let combos = state.store.list_combos().await;
    Json(json!({ "success": true, "data": combos }))
}

/// GET /api/combos/{id}
pub async fn get_combo(
    State(state): State<AppState>,
    WithRejection(Path(combo_id), _): IdPath,
) -> AppResult<Json<Value>> {
    let combo = state.store.get_combo(combo_id).await?;
    Ok(Json(json!({ "success": true, "data": combo })))
}

/// POST /api/combos
pub async fn create_combo(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Json(input), _): JsonBody<NewCombo>,
) -> AppResult<impl IntoResponse> {
    auth.require_staff()?;
    input.validate()?;
    let combo = state.store.create_combo(auth.user_id, input).await?;
    tracing::info!(combo_id = combo.id, user_id = auth.user_id, "Combo created");
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": combo }))))
}

/// PUT /api/combos/{id}
pub async fn update_combo(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Path(combo_id), _): IdPath,
    WithRejection(Json(patch), _): JsonBody<ComboPatch>,
) -> AppResult<Json<Value>> {
    auth.require_staff()?;
    patch.validate()?;
    let combo = state
        .store
        .update_combo(combo_id, auth.user_id, auth.is_admin(), patch)
        .await?;
    Ok(Json(json!({ "success": true, "data": combo })))
}

/// DELETE /api/combos/{id}
pub async fn delete_combo(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Path(combo_id), _): IdPath,
) -> AppResult<Json<Value>> {
    auth.require_staff()?;
    state.store.delete_combo(combo_id, auth.user_id, auth.is_admin()).await?;
    tracing::info!(combo_id, user_id = auth.user_id, "Combo deleted");
    Ok(Json(json!({ "success": true, "message": "Combo deleted successfully" })))
}
