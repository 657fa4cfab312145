//! Shared application state and the Axum router.

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::store::Store;
use crate::web::auth::{AuthBackend, StoreAuthBackend};
use crate::web::handlers::{admin, auth, books, combos, health, orders, reviews, users};
use crate::web::jwt::TokenService;
use crate::web::login_rate_limit::login_rate_limit_middleware;
use crate::web::rate_limiter::RateLimiter;
use crate::web::token_blacklist::TokenBlacklist;

pub struct AppStateInner {
    pub config: Config,
    pub store: Store,
    pub auth_backend: Box<dyn AuthBackend>,
    pub tokens: TokenService,
    pub token_blacklist: TokenBlacklist,
    pub rate_limiter: RateLimiter,
}

pub type AppState = Arc<AppStateInner>;

impl AppStateInner {
    /// Wire the default services for `config` around `store`.
    pub fn new(config: Config, store: Store) -> AppState {
        let tokens = TokenService::new(&config.auth.jwt_secret, config.auth.jwt_expiration());
        let rate_limiter =
            RateLimiter::new(config.auth.login_max_attempts, config.auth.login_window());
        Arc::new(Self {
            auth_backend: Box::new(StoreAuthBackend::new(store.clone())),
            tokens,
            token_blacklist: TokenBlacklist::new(),
            rate_limiter,
            store,
            config,
        })
    }
}

/// Creates the Axum router with all the API endpoints.
pub fn create_router(state: AppState) -> Router {
    let login_limit = || from_fn_with_state(state.clone(), login_rate_limit_middleware);
    let cors = cors_layer(&state.config.server.cors_allowed_origins);

    Router::new()
        .route("/api/healthcheck", get(health::healthcheck))
        // auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login).route_layer(login_limit()))
        .route("/api/auth/staff-login", post(auth::staff_login).route_layer(login_limit()))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/user/profile", get(users::get_profile).put(users::update_profile))
        // catalog
        .route("/api/books", get(books::list_books).post(books::create_book))
        .route("/api/books/by-title", get(books::books_by_title))
        .route("/api/books/by-author", get(books::books_by_author))
        .route("/api/books/by-category", get(books::books_by_category))
        .route("/api/books/search", get(books::search_books))
        .route(
            "/api/books/{id}",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        .route(
            "/api/books/{id}/reviews",
            get(reviews::list_reviews).post(reviews::create_review),
        )
        .route("/api/books/{id}/combos", get(books::combos_for_book))
        .route("/api/categories", get(books::list_categories))
        .route(
            "/api/reviews/{id}",
            put(reviews::update_review).delete(reviews::delete_review),
        )
        // orders
        .route("/api/orders", get(orders::my_orders).post(orders::create_order))
        .route("/api/orders/all", get(orders::all_orders))
        .route("/api/orders/{id}", get(orders::get_order).put(orders::update_order))
        .route("/api/orders/{id}/status", put(orders::update_order_status))
        // combos
        .route("/api/combos", get(combos::list_combos).post(combos::create_combo))
        .route(
            "/api/combos/{id}",
            get(combos::get_combo).put(combos::update_combo).delete(combos::delete_combo),
        )
        // admin
        .route("/api/admin/users", get(admin::list_users).post(admin::create_staff))
        .route("/api/admin/users/{id}/role", put(admin::change_role))
        .route(
            "/api/admin/system-config",
            get(admin::get_system_config)
                .post(admin::create_system_config)
                .put(admin::update_system_config)
                .delete(admin::delete_system_config),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `["*"]` allows any origin without credentials. Otherwise the listed
/// origins are allowed with credentials so the `jwt` cookie is sent.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.trim().parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}
