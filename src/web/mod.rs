//! HTTP layer: router, authentication gate and request handlers.

pub mod api;
pub mod auth;
pub mod handlers;
pub mod jwt;
pub mod login_rate_limit;
pub mod models;
pub mod rate_limiter;
pub mod token_blacklist;
