//! Domain entities and the input types that create or modify them.

pub mod book;
pub mod combo;
pub mod order;
pub mod review;
pub mod system_config;
pub mod user;

pub use book::{Book, BookDraft, BookQuery, Category};
pub use combo::{BookComboSummary, Combo, ComboDetails, ComboItem, ComboPatch, NewCombo};
pub use order::{
    ExpiryPolicy, ExpiryReport, Order, OrderDetails, OrderItem, OrderItemDetails, OrderLine,
    OrderStatus, PaymentMethod,
};
pub use review::{NewReview, Review, ReviewPatch, ReviewWithAuthor};
pub use system_config::{SystemConfig, SystemConfigInput};
pub use user::{NewUser, ProfileUpdate, Role, User};
