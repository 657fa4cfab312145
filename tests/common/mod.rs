//! Shared harness for driving the router in-process.
#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use ebook_store::config::{BootstrapAdmin, Config};
use ebook_store::store::Store;
use ebook_store::web::api::{AppState, AppStateInner, create_router};
use http_body_util::BodyExt; // for .collect().await
use serde_json::{Value, json};
use tower::util::ServiceExt; // for `oneshot`

pub const ADMIN_PASSWORD: &str = "admin-pass";

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.auth.jwt_secret = "integration-test-secret".to_string();
    config.auth.bcrypt_cost = 4;
    config.auth.login_max_attempts = 1_000;
    config.admin = Some(BootstrapAdmin {
        username: "admin".to_string(),
        email: "admin@example.com".to_string(),
        password: ADMIN_PASSWORD.to_string(),
    });
    config
}

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let store = Store::new();
        if let Some(admin) = &config.admin {
            ebook_store::bootstrap_admin(&store, admin, config.auth.bcrypt_cost).await.unwrap();
        }
        let state = AppStateInner::new(config, store);
        let router = create_router(state.clone());
        Self { state, router }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json = if body.is_empty() { Value::Null } else { serde_json::from_slice(&body).unwrap() };
        (status, json)
    }

    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn register(&self, username: &str) -> (StatusCode, Value) {
        self.call(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": "password1",
            })),
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.call(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await
    }

    /// Register a customer and return a token for it.
    pub async fn customer_token(&self, username: &str) -> String {
        let (status, _) = self.register(username).await;
        assert_eq!(status, StatusCode::CREATED);
        self.token_for(username, "password1").await
    }

    pub async fn admin_token(&self) -> String {
        self.token_for("admin", ADMIN_PASSWORD).await
    }

    /// Have the admin create a staff account and return a token for it.
    pub async fn staff_token(&self, username: &str) -> String {
        let admin = self.admin_token().await;
        let (status, _) = self
            .call(
                "POST",
                "/api/admin/users",
                Some(&admin),
                Some(json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": "password1",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        self.token_for(username, "password1").await
    }

    async fn token_for(&self, username: &str, password: &str) -> String {
        let (status, body) = self.login(username, password).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Create a book as staff and return its id.
    pub async fn create_book(&self, staff: &str, title: &str, isbn: &str, price: f64, stock: u32) -> u64 {
        let (status, body) = self
            .call("POST", "/api/books", Some(staff), Some(book_json(title, isbn, price, stock)))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create book failed: {body}");
        body["data"]["id"].as_u64().unwrap()
    }
}

pub fn book_json(title: &str, isbn: &str, price: f64, stock: u32) -> Value {
    json!({
        "title": title,
        "author": "Jane Writer",
        "description": format!("A book called {title}"),
        "price": price,
        "stock": stock,
        "category": "Programming",
        "isbn": isbn,
        "pages": 320,
        "language": "English",
    })
}
