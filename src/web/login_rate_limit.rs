use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::net::{IpAddr, SocketAddr};

use crate::error::AppError;
use crate::web::api::AppState;

/// Middleware for rate limiting login attempts per IP.
pub async fn login_rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = client_ip(&req);
    if !state.rate_limiter.check_and_increment(ip).await {
        tracing::warn!(%ip, "Login rate limit exceeded");
        return Err(AppError::TooManyRequests("Too many login attempts".to_string()));
    }
    Ok(next.run(req).await)
}

/// Connection address if known, else the first `X-Forwarded-For` hop, else loopback.
fn client_ip(req: &Request) -> IpAddr {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
        .or_else(|| {
            req.headers()
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').next())
                .and_then(|s| s.trim().parse().ok())
        })
        .unwrap_or(IpAddr::from([127, 0, 0, 1]))
}
