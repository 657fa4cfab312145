use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_extra::extract::WithRejection;
use serde_json::{Value, json};
use validator::Validate;

use super::{IdPath, JsonBody};
use crate::error::AppResult;
use crate::models::{NewUser, Role, SystemConfigInput};
use crate::web::api::AppState;
use crate::web::auth::{AuthUser, hash_password};
use crate::web::models::{RegisterRequest, RoleChangeRequest, UserSummary};

/// GET /api/admin/users
pub async fn list_users(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Value>> {
    auth.require_admin()?;
    let users = state.store.list_users().await;
    Ok(Json(json!({ "success": true, "data": users })))
}

/// POST /api/admin/users
pub async fn create_staff(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Json(payload), _): JsonBody<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    auth.require_admin()?;
    let payload = payload.trimmed();
    payload.validate()?;
    let password_hash = hash_password(&payload.password, state.config.auth.bcrypt_cost).await?;
    let user = state
        .store
        .create_user(NewUser {
            username: payload.username,
            email: payload.email,
            password_hash,
            role: Role::Staff,
        })
        .await?;

    tracing::info!(admin_id = auth.user_id, user_id = user.id, "Staff account created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "user": UserSummary::from(&user) })),
    ))
}

/// PUT /api/admin/users/{id}/role
pub async fn change_role(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Path(user_id), _): IdPath,
    WithRejection(Json(payload), _): JsonBody<RoleChangeRequest>,
) -> AppResult<Json<Value>> {
    auth.require_admin()?;
    let user = state.store.set_role(user_id, payload.role).await?;
    tracing::info!(admin_id = auth.user_id, user_id, role = %user.role, "Role changed");
    Ok(Json(json!({
        "success": true,
        "message": "User role updated successfully",
        "user": UserSummary::from(&user),
    })))
}

/// POST /api/admin/system-config
pub async fn create_system_config(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Json(input), _): JsonBody<SystemConfigInput>,
) -> AppResult<impl IntoResponse> {
    auth.require_admin()?;
    input.validate()?;
    let config = state.store.create_system_config(input).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": config }))))
}

/// GET /api/admin/system-config
pub async fn get_system_config(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Value>> {
    auth.require_admin()?;
    let config = state.store.get_system_config().await?;
    Ok(Json(json!({ "success": true, "data": config })))
}

/// PUT /api/admin/system-config
pub async fn update_system_config(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Json(input), _): JsonBody<SystemConfigInput>,
) -> AppResult<Json<Value>> {
    auth.require_admin()?;
    input.validate()?;
    let config = state.store.update_system_config(input).await?;
    Ok(Json(json!({ "success": true, "data": config })))
}

/// DELETE /api/admin/system-config
pub async fn delete_system_config(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Value>> {
    auth.require_admin()?;
    state.store.delete_system_config().await?;
    Ok(Json(json!({ "success": true, "message": "System config deleted" })))
}
