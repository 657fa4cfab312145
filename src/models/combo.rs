use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::book::Book;

#[derive(Debug, Clone)]
pub struct Combo {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub created_by: u64,
    pub items: Vec<ComboItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct ComboItem {
    pub book_id: u64,
    /// Set when the book is deleted from the catalog.
    pub is_hidden: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewCombo {
    #[validate(length(min = 1, max = 100, message = "title is required and must be at most 100 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    #[validate(length(min = 1, message = "book_ids must contain at least one book"))]
    pub book_ids: Vec<u64>,
}

/// Empty strings and a missing `book_ids` leave the combo unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ComboPatch {
    #[serde(default)]
    #[validate(length(max = 100, message = "title must be at most 100 characters"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub book_ids: Option<Vec<u64>>,
}

/// Combo joined with its visible books and creator.
#[derive(Debug, Clone, Serialize)]
pub struct ComboDetails {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub created_by: u64,
    pub created_by_username: Option<String>,
    pub books: Vec<Book>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookComboSummary {
    pub combo_id: u64,
    pub title: String,
    pub description: String,
    pub created_by: String,
}
