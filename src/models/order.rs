use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Canceled,
}

impl OrderStatus {
    /// Orders still being worked on; books in them cannot be deleted.
    pub fn is_active(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Card,
    #[serde(rename = "COD")]
    Cod,
    BankTransfer,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: u64,
    pub book_id: u64,
    pub quantity: u32,
    /// Unit price captured when the item was added.
    pub price: f64,
    pub discount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: u64,
    pub user_id: u64,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One requested line of an order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct OrderLine {
    pub book_id: u64,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: u32,
}

/// Order joined with its buyer and book details, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    pub id: u64,
    pub user_id: u64,
    pub username: Option<String>,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub order_items: Vec<OrderItemDetails>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderItemDetails {
    pub id: u64,
    pub book_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub quantity: u32,
    pub discount: f64,
    pub price: f64,
}

/// Thresholds for the background order sweeper.
#[derive(Debug, Clone, Copy)]
pub struct ExpiryPolicy {
    pub pending_timeout: chrono::Duration,
    pub canceled_retention: chrono::Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpiryReport {
    pub canceled: usize,
    pub purged: usize,
}
