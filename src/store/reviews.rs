use chrono::Utc;

use super::{Store, StoreError, StoreResult, Tables, next_id};
use crate::models::review::average_rating;
use crate::models::{NewReview, Review, ReviewPatch, ReviewWithAuthor};

impl Tables {
    fn refresh_average_rating(&mut self, book_id: u64) {
        let average = average_rating(
            self.reviews.values().filter(|r| r.book_id == book_id).map(|r| r.rating),
        );
        if let Some(book) = self.books.get_mut(&book_id) {
            book.average_rating = average;
        }
    }
}

impl Store {
    /// One review per user and book. Recomputes the book's average rating.
    pub async fn create_review(
        &self,
        user_id: u64,
        book_id: u64,
        input: NewReview,
    ) -> StoreResult<Review> {
        let mut tables = self.inner.write().await;
        if tables.live_book(book_id).is_none() {
            return Err(StoreError::NotFound("Book"));
        }
        if tables.reviews.values().any(|r| r.book_id == book_id && r.user_id == user_id) {
            return Err(StoreError::Conflict("You have already reviewed this book".to_string()));
        }

        let now = Utc::now();
        let id = next_id(&mut tables.ids.review);
        let review = Review {
            id,
            user_id,
            book_id,
            rating: input.rating,
            comment: input.comment,
            created_at: now,
            updated_at: now,
        };
        tables.reviews.insert(id, review.clone());
        tables.refresh_average_rating(book_id);
        Ok(review)
    }

    pub async fn update_review(
        &self,
        review_id: u64,
        user_id: u64,
        patch: ReviewPatch,
    ) -> StoreResult<Review> {
        let mut tables = self.inner.write().await;
        let review = tables.reviews.get_mut(&review_id).ok_or(StoreError::NotFound("Review"))?;
        if review.user_id != user_id {
            return Err(StoreError::Forbidden(
                "You don't have permission to update this review".to_string(),
            ));
        }
        if let Some(rating) = patch.rating {
            review.rating = rating;
        }
        if let Some(comment) = patch.comment {
            review.comment = comment;
        }
        review.updated_at = Utc::now();
        let review = review.clone();
        tables.refresh_average_rating(review.book_id);
        Ok(review)
    }

    /// Remove a review. Only its author or an admin may do so.
    pub async fn delete_review(&self, review_id: u64, user_id: u64, is_admin: bool) -> StoreResult<()> {
        let mut tables = self.inner.write().await;
        let review = tables.reviews.get(&review_id).ok_or(StoreError::NotFound("Review"))?;
        if review.user_id != user_id && !is_admin {
            return Err(StoreError::Forbidden(
                "You don't have permission to delete this review".to_string(),
            ));
        }
        let book_id = review.book_id;
        tables.reviews.remove(&review_id);
        tables.refresh_average_rating(book_id);
        Ok(())
    }

    /// Reviews of a live book, newest first.
    pub async fn reviews_for_book(&self, book_id: u64) -> StoreResult<Vec<ReviewWithAuthor>> {
        let tables = self.inner.read().await;
        if tables.live_book(book_id).is_none() {
            return Err(StoreError::NotFound("Book"));
        }
        Ok(tables
            .reviews
            .values()
            .rev()
            .filter(|r| r.book_id == book_id)
            .map(|r| ReviewWithAuthor { review: r.clone(), username: tables.username_of(r.user_id) })
            .collect())
    }
}
