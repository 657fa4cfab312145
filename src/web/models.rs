//! Request and response bodies that exist only at the HTTP boundary.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{OrderLine, OrderStatus, PaymentMethod, Role, User};

/// Registration and staff-account creation body.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "username must be between 3 and 50 characters"))]
    pub username: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

impl RegisterRequest {
    /// Strip surrounding whitespace from the identity fields before validation.
    pub fn trimmed(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Public view of a user returned by login and registration.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: &'static str,
    pub token: String,
    pub user: UserSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct RoleChangeRequest {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct OrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, Validate)]
pub struct OrderRequest {
    #[validate(
        length(min = 1, message = "order_items must contain at least one item"),
        nested
    )]
    pub order_items: Vec<OrderLine>,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl PageQuery {
    pub const DEFAULT_LIMIT: usize = 10;
    pub const MAX_LIMIT: usize = 100;

    /// Page is at least 1; limit is clamped to `1..=MAX_LIMIT`.
    pub fn resolve(&self) -> (usize, usize) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT);
        (page, limit)
    }
}
