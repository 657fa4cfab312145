use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::{Value, json};
use validator::Validate;

use super::{IdPath, JsonBody, QueryParams};
use crate::error::{AppError, AppResult};
use crate::models::{BookDraft, BookQuery, Category};
use crate::web::api::AppState;
use crate::web::auth::AuthUser;
use crate::web::models::PageQuery;

/// GET /api/books
pub async fn list_books(
    State(state): State<AppState>,
    WithRejection(Query(query), _): QueryParams<PageQuery>,
) -> Json<Value> {
    let (page, limit) = query.resolve();
    let (books, total) = state.store.list_books(page, limit).await;
    Json(json!({
        "success": true,
        "data": books,
        "total": total,
        "page": page,
        "limit": limit,
    }))
}

/// GET /api/books/{id}
pub async fn get_book(
    State(state): State<AppState>,
    WithRejection(Path(book_id), _): IdPath,
) -> AppResult<Json<Value>> {
    let (book, reviews_count) = state.store.get_book_with_review_count(book_id).await?;
    Ok(Json(json!({ "success": true, "data": book, "reviews_count": reviews_count })))
}

#[derive(Debug, Deserialize)]
pub struct TitleQuery {
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthorQuery {
    pub author: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

fn required(value: Option<String>, name: &str) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::bad_request(format!("{name} parameter is required")))
}

/// GET /api/books/by-title
pub async fn books_by_title(
    State(state): State<AppState>,
    WithRejection(Query(query), _): QueryParams<TitleQuery>,
) -> AppResult<Json<Value>> {
    let title = required(query.title, "title")?;
    let books = state
        .store
        .search_books(&BookQuery { title: Some(title), ..Default::default() })
        .await;
    Ok(Json(json!({ "success": true, "data": books })))
}

/// GET /api/books/by-author
pub async fn books_by_author(
    State(state): State<AppState>,
    WithRejection(Query(query), _): QueryParams<AuthorQuery>,
) -> AppResult<Json<Value>> {
    let author = required(query.author, "author")?;
    let books = state
        .store
        .search_books(&BookQuery { author: Some(author), ..Default::default() })
        .await;
    Ok(Json(json!({ "success": true, "data": books })))
}

/// GET /api/books/by-category
pub async fn books_by_category(
    State(state): State<AppState>,
    WithRejection(Query(query), _): QueryParams<CategoryQuery>,
) -> AppResult<Json<Value>> {
    let category: Category = required(query.category, "category")?
        .parse()
        .map_err(AppError::BadRequest)?;
    let books = state.store.books_in_category(category).await;
    Ok(Json(json!({ "success": true, "data": books })))
}

/// GET /api/books/search
pub async fn search_books(
    State(state): State<AppState>,
    WithRejection(Query(query), _): QueryParams<BookQuery>,
) -> Json<Value> {
    let books = state.store.search_books(&query).await;
    Json(json!({ "success": true, "data": books }))
}

/// GET /api/categories
pub async fn list_categories() -> Json<Value> {
    let names: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
    Json(json!({ "success": true, "data": names }))
}

/// POST /api/books
pub async fn create_book(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Json(draft), _): JsonBody<BookDraft>,
) -> AppResult<impl IntoResponse> {
    auth.require_staff()?;
    draft.validate()?;
    let book = state.store.create_book(draft).await?;
    tracing::info!(book_id = book.id, user_id = auth.user_id, "Book created");
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": book }))))
}

/// PUT /api/books/{id}
pub async fn update_book(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Path(book_id), _): IdPath,
    WithRejection(Json(draft), _): JsonBody<BookDraft>,
) -> AppResult<Json<Value>> {
    auth.require_staff()?;
    draft.validate()?;
    let book = state.store.update_book(book_id, draft).await?;
    tracing::info!(book_id, user_id = auth.user_id, "Book updated");
    Ok(Json(json!({ "success": true, "data": book })))
}

/// DELETE /api/books/{id}
pub async fn delete_book(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Path(book_id), _): IdPath,
) -> AppResult<Json<Value>> {
    auth.require_staff()?;
    state.store.delete_book(book_id).await?;
    tracing::info!(book_id, user_id = auth.user_id, "Book deleted");
    Ok(Json(json!({ "success": true, "message": "Book deleted successfully" })))
}

/// GET /api/books/{id}/combos
pub async fn combos_for_book(
    State(state): State<AppState>,
    WithRejection(Path(book_id), _): IdPath,
) -> AppResult<Json<Value>> {
    let combos = state.store.combos_for_book(book_id).await?;
    Ok(Json(json!({ "success": true, "book_id": book_id, "combos": combos })))
}
