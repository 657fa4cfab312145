use axum::Json;
use axum::extract::State;
use axum_extra::extract::WithRejection;
use serde_json::{Value, json};
use validator::Validate;

use super::JsonBody;
use crate::error::AppResult;
use crate::models::ProfileUpdate;
use crate::web::api::AppState;
use crate::web::auth::AuthUser;

/// GET /api/user/profile
pub async fn get_profile(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Value>> {
    let user = state.store.get_user(auth.user_id).await?;
    Ok(Json(json!({ "success": true, "data": user })))
}

/// PUT /api/user/profile
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Json(update), _): JsonBody<ProfileUpdate>,
) -> AppResult<Json<Value>> {
    update.validate()?;
    let user = state.store.update_profile(auth.user_id, update).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully",
        "data": user,
    })))
}
