//! In-memory repository for every domain table.
//!
//! All tables live behind one async `RwLock`, so each `Store` method is atomic
//! with respect to the others. Methods are grouped by aggregate in the
//! submodules; joins that the API needs (order lines with book titles, combos
//! with their books) are assembled here under the same guard.

mod books;
mod combos;
pub mod order_expiry;
mod orders;
mod reviews;
mod system_config;
mod users;

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::{Book, Combo, Order, Review, SystemConfig, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Invalid(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Default)]
struct Tables {
    users: BTreeMap<u64, User>,
    books: BTreeMap<u64, Book>,
    orders: BTreeMap<u64, Order>,
    reviews: BTreeMap<u64, Review>,
    combos: BTreeMap<u64, Combo>,
    system_config: Option<SystemConfig>,
    ids: IdSequences,
}

#[derive(Default)]
struct IdSequences {
    user: u64,
    book: u64,
    order: u64,
    order_item: u64,
    review: u64,
    combo: u64,
}

fn next_id(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

impl Tables {
    fn username_of(&self, user_id: u64) -> Option<String> {
        self.users.get(&user_id).map(|u| u.username.clone())
    }

    /// Catalog lookup that ignores soft-deleted books.
    fn live_book(&self, book_id: u64) -> Option<&Book> {
        self.books.get(&book_id).filter(|b| !b.is_deleted())
    }
}

#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<RwLock<Tables>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }
}
