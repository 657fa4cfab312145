use chrono::Utc;

use super::{Store, StoreError, StoreResult, Tables, next_id};
use crate::models::{Book, BookDraft, BookQuery, Category};

impl Tables {
    fn isbn_taken(&self, isbn: &str, except: Option<u64>) -> bool {
        self.books
            .values()
            .any(|b| !b.is_deleted() && Some(b.id) != except && b.isbn == isbn)
    }
}

impl Store {
    pub async fn create_book(&self, draft: BookDraft) -> StoreResult<Book> {
        let mut tables = self.inner.write().await;
        let isbn = draft.isbn.trim().to_string();
        if tables.isbn_taken(&isbn, None) {
            return Err(StoreError::Conflict("A book with this ISBN already exists".to_string()));
        }

        let now = Utc::now();
        let id = next_id(&mut tables.ids.book);
        let book = Book {
            id,
            cover_image: draft.cover_or_default(),
            title: draft.title.trim().to_string(),
            author: draft.author.trim().to_string(),
            description: draft.description,
            price: draft.price,
            stock: draft.stock,
            category: draft.category,
            publisher: draft.publisher,
            isbn,
            pages: draft.pages,
            language: draft.language,
            published_at: draft.published_at,
            average_rating: 0.0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.books.insert(id, book.clone());
        Ok(book)
    }

    pub async fn get_book(&self, book_id: u64) -> StoreResult<Book> {
        self.inner
            .read()
            .await
            .live_book(book_id)
            .cloned()
            .ok_or(StoreError::NotFound("Book"))
    }

    /// The book plus how many reviews it has.
    pub async fn get_book_with_review_count(&self, book_id: u64) -> StoreResult<(Book, usize)> {
        let tables = self.inner.read().await;
        let book = tables.live_book(book_id).cloned().ok_or(StoreError::NotFound("Book"))?;
        let reviews = tables.reviews.values().filter(|r| r.book_id == book_id).count();
        Ok((book, reviews))
    }

    /// Replace every editable field of a book.
    pub async fn update_book(&self, book_id: u64, draft: BookDraft) -> StoreResult<Book> {
        let mut tables = self.inner.write().await;
        if tables.live_book(book_id).is_none() {
            return Err(StoreError::NotFound("Book"));
        }
        let isbn = draft.isbn.trim().to_string();
        if tables.isbn_taken(&isbn, Some(book_id)) {
            return Err(StoreError::Conflict("A book with this ISBN already exists".to_string()));
        }

        let book = tables.books.get_mut(&book_id).ok_or(StoreError::NotFound("Book"))?;
        book.cover_image = draft.cover_or_default();
        book.title = draft.title.trim().to_string();
        book.author = draft.author.trim().to_string();
        book.description = draft.description;
        book.price = draft.price;
        book.stock = draft.stock;
        book.category = draft.category;
        book.publisher = draft.publisher;
        book.isbn = isbn;
        book.pages = draft.pages;
        book.language = draft.language;
        book.published_at = draft.published_at;
        book.updated_at = Utc::now();
        Ok(book.clone())
    }

    /// Soft-delete a book and hide it from every combo.
    ///
    /// Refused while the book is part of a pending or processing order.
    pub async fn delete_book(&self, book_id: u64) -> StoreResult<()> {
        let mut tables = self.inner.write().await;
        if tables.live_book(book_id).is_none() {
            return Err(StoreError::NotFound("Book"));
        }
        let in_active_order = tables
            .orders
            .values()
            .filter(|o| o.status.is_active())
            .any(|o| o.items.iter().any(|item| item.book_id == book_id));
        if in_active_order {
            return Err(StoreError::Invalid(
                "Cannot delete this book because it is part of an unprocessed order".to_string(),
            ));
        }

        for combo in tables.combos.values_mut() {
            for item in combo.items.iter_mut().filter(|item| item.book_id == book_id) {
                item.is_hidden = true;
            }
        }
        if let Some(book) = tables.books.get_mut(&book_id) {
            book.deleted_at = Some(Utc::now());
        }
        Ok(())
    }

    /// One page of the catalog plus the total number of live books.
    pub async fn list_books(&self, page: usize, limit: usize) -> (Vec<Book>, usize) {
        let tables = self.inner.read().await;
        let live = tables.books.values().filter(|b| !b.is_deleted());
        let total = live.clone().count();
        let offset = page.saturating_sub(1).saturating_mul(limit);
        (live.skip(offset).take(limit).cloned().collect(), total)
    }

    pub async fn search_books(&self, query: &BookQuery) -> Vec<Book> {
        self.inner
            .read()
            .await
            .books
            .values()
            .filter(|b| !b.is_deleted() && query.matches(b))
            .cloned()
            .collect()
    }

    pub async fn books_in_category(&self, category: Category) -> Vec<Book> {
        self.inner
            .read()
            .await
            .books
            .values()
            .filter(|b| !b.is_deleted() && b.category == category)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn draft(title: &str, isbn: &str, price: f64, stock: u32) -> BookDraft {
        BookDraft {
            title: title.to_string(),
            author: "Some Author".to_string(),
            description: format!("All about {title}"),
            price,
            stock,
            cover_image: None,
            category: Category::Technology,
            publisher: String::new(),
            published_at: String::new(),
            isbn: isbn.to_string(),
            pages: 100,
            language: "English".to_string(),
        }
    }

    #[tokio::test]
    async fn test_isbn_must_be_unique_among_live_books() {
        let store = Store::new();
        let book = store.create_book(draft("First", "1111111111", 10.0, 1)).await.unwrap();
        assert!(matches!(
            store.create_book(draft("Second", "1111111111", 10.0, 1)).await,
            Err(StoreError::Conflict(_))
        ));

        store.delete_book(book.id).await.unwrap();
        assert!(store.create_book(draft("Second", "1111111111", 10.0, 1)).await.is_ok());
    }

    #[tokio::test]
    async fn test_deleted_books_leave_catalog() {
        let store = Store::new();
        let a = store.create_book(draft("Alpha", "1000000001", 10.0, 1)).await.unwrap();
        store.create_book(draft("Beta", "1000000002", 10.0, 1)).await.unwrap();
        store.delete_book(a.id).await.unwrap();

        assert!(matches!(store.get_book(a.id).await, Err(StoreError::NotFound("Book"))));
        let (page, total) = store.list_books(1, 10).await;
        assert_eq!(total, 1);
        assert_eq!(page[0].title, "Beta");
        assert!(matches!(store.delete_book(a.id).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_pagination() {
        let store = Store::new();
        for i in 0..25 {
            store
                .create_book(draft(&format!("Book {i:02}"), &format!("20000000{i:02}"), 5.0, 1))
                .await
                .unwrap();
        }
        let (page, total) = store.list_books(3, 10).await;
        assert_eq!(total, 25);
        assert_eq!(page.len(), 5);
        assert_eq!(page[0].title, "Book 20");
        let (empty, _) = store.list_books(9, 10).await;
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_search_matches_any_field() {
        let store = Store::new();
        store.create_book(draft("Rust in Action", "3000000001", 10.0, 1)).await.unwrap();
        store.create_book(draft("Gardening", "3000000002", 10.0, 1)).await.unwrap();

        let query = BookQuery { title: Some("rust".to_string()), ..Default::default() };
        assert_eq!(store.search_books(&query).await.len(), 1);

        let query = BookQuery {
            title: Some("nothing".to_string()),
            description: Some("garden".to_string()),
            ..Default::default()
        };
        let found = store.search_books(&query).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Gardening");

        assert_eq!(store.search_books(&BookQuery::default()).await.len(), 2);
    }
}
