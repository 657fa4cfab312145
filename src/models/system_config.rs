use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Store-wide pricing settings. At most one exists.
#[derive(Debug, Clone, Serialize)]
pub struct SystemConfig {
    pub shipping_fee: f64,
    /// Percentage, 0 to 100.
    pub promotion: f64,
    pub promotion_info: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SystemConfigInput {
    #[serde(default)]
    #[validate(range(min = 0.0, message = "shipping_fee must be >= 0"))]
    pub shipping_fee: f64,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0, message = "promotion must be between 0 and 100"))]
    pub promotion: f64,
    #[serde(default)]
    pub promotion_info: String,
}
