use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: u64,
    pub user_id: u64,
    pub book_id: u64,
    pub rating: u8,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewWithAuthor {
    #[serde(flatten)]
    pub review: Review,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewReview {
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: u8,
    #[serde(default)]
    #[validate(length(max = 500, message = "comment must be at most 500 characters"))]
    pub comment: String,
}

/// Partial review update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ReviewPatch {
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: Option<u8>,
    #[validate(length(max = 500, message = "comment must be at most 500 characters"))]
    pub comment: Option<String>,
}

/// Mean rating rounded to two decimals; zero with no ratings.
pub fn average_rating(ratings: impl IntoIterator<Item = u8>) -> f64 {
    let (sum, count) = ratings
        .into_iter()
        .fold((0u64, 0u64), |(sum, count), r| (sum + u64::from(r), count + 1));
    if count == 0 {
        return 0.0;
    }
    let mean = sum as f64 / count as f64;
    (mean * 100.0).round() / 100.0
}
