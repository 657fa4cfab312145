use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_extra::extract::WithRejection;
use chrono::Utc;
use serde_json::json;
use validator::Validate;

use super::JsonBody;
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, Role};
use crate::web::api::AppState;
use crate::web::auth::{AuthUser, hash_password};
use crate::web::jwt::TokenService;
use crate::web::models::{LoginRequest, LoginResponse, RegisterRequest, UserSummary};

const BAD_CREDENTIALS: &str = "Invalid username or password";

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): JsonBody<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    let payload = payload.trimmed();
    payload.validate()?;
    let password_hash = hash_password(&payload.password, state.config.auth.bcrypt_cost).await?;
    let user = state
        .store
        .create_user(NewUser {
            username: payload.username,
            email: payload.email,
            password_hash,
            role: Role::Customer,
        })
        .await?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User registered successfully",
            "user": UserSummary::from(&user),
        })),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): JsonBody<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    sign_in(&state, payload, false).await.map(Json)
}

/// POST /api/auth/staff-login
pub async fn staff_login(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): JsonBody<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    sign_in(&state, payload, true).await.map(Json)
}

async fn sign_in(state: &AppState, payload: LoginRequest, staff_only: bool) -> AppResult<LoginResponse> {
    let user = state
        .auth_backend
        .authenticate(payload.username.trim(), &payload.password)
        .await?
        .ok_or_else(|| {
            tracing::info!(username = %payload.username, "Failed login");
            AppError::Unauthorized(BAD_CREDENTIALS.to_string())
        })?;

    if staff_only && !user.role.is_staff() {
        tracing::info!(user_id = user.id, "Customer attempted staff login");
        return Err(AppError::forbidden("Staff or admin access required"));
    }

    let token = state.tokens.issue(&user)?;
    state.store.record_login(user.id, Utc::now()).await?;
    tracing::info!(user_id = user.id, role = %user.role, "User logged in");

    Ok(LoginResponse {
        success: true,
        message: "Login successful",
        token,
        user: UserSummary::from(&user),
        is_admin: staff_only.then_some(user.role == Role::Admin),
    })
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> Json<serde_json::Value> {
    let ttl = TokenService::remaining_lifetime(&auth.claims);
    state.token_blacklist.revoke(auth.token, ttl);
    tracing::info!(user_id = auth.user_id, ttl_secs = ttl.as_secs(), "Token revoked on logout");
    Json(json!({ "success": true, "message": "Logged out successfully" }))
}
