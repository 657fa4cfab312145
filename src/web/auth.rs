//! Credential checking and the authentication gate.
//!
//! [`AuthUser`] is an extractor: any handler that takes it only runs for a
//! request carrying a valid, unrevoked token. The token is read from the
//! `Authorization: Bearer` header, falling back to the `jwt` cookie.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};

use crate::error::{AppError, AppResult};
use crate::models::{Role, User};
use crate::store::Store;
use crate::web::api::AppState;
use crate::web::jwt::Claims;

pub const TOKEN_COOKIE: &str = "jwt";

const TOKEN_REQUIRED: &str = "Authorization token required";
const TOKEN_INVALID: &str = "Invalid or expired token";
const PERMISSION_DENIED: &str = "You don't have permission to access this resource";

/// Pluggable username/password check.
#[async_trait]
pub trait AuthBackend: Send + Sync + 'static {
    /// The matching user if the credentials are valid.
    async fn authenticate(&self, username: &str, password: &str) -> AppResult<Option<User>>;
}

/// Checks credentials against bcrypt hashes held in the [`Store`].
pub struct StoreAuthBackend {
    store: Store,
}

impl StoreAuthBackend {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuthBackend for StoreAuthBackend {
    async fn authenticate(&self, username: &str, password: &str) -> AppResult<Option<User>> {
        let Some(user) = self.store.find_user_by_username(username).await else {
            return Ok(None);
        };
        let valid = verify_password(password, &user.password_hash).await?;
        Ok(valid.then_some(user))
    }
}

/// Hash on the blocking pool; bcrypt is deliberately slow.
pub async fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    let password = password.to_string();
    Ok(tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??)
}

pub async fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    Ok(tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??)
}

/// Bearer token if present, else the `jwt` cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.typed_get::<Authorization<Bearer>>() {
        return Some(auth.token().to_string());
    }
    CookieJar::from_headers(headers)
        .get(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// The caller behind a verified token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,
    /// The raw token, kept so logout can revoke it.
    pub token: String,
    pub claims: Claims,
}

impl AuthUser {
    /// Fail with 403 unless the caller holds one of `roles`.
    pub fn require_any(&self, roles: &[Role]) -> AppResult<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            tracing::debug!(user_id = self.user_id, role = %self.role, "Role check failed");
            Err(AppError::forbidden(PERMISSION_DENIED))
        }
    }

    pub fn require_staff(&self) -> AppResult<()> {
        self.require_any(&[Role::Staff, Role::Admin])
    }

    pub fn require_admin(&self) -> AppResult<()> {
        self.require_any(&[Role::Admin])
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized(TOKEN_REQUIRED.to_string()))?;

        if state.token_blacklist.is_revoked(&token) {
            tracing::debug!("Rejected revoked token");
            return Err(AppError::Unauthorized(TOKEN_INVALID.to_string()));
        }

        let claims = state.tokens.verify(&token).map_err(|err| {
            tracing::debug!(error = %err, "Rejected token");
            AppError::Unauthorized(TOKEN_INVALID.to_string())
        })?;

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.username.clone(),
            role: claims.role,
            token,
            claims,
        })
    }
}
