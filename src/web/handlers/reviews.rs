use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_extra::extract::WithRejection;
use serde_json::{Value, json};
use validator::Validate;

use super::{IdPath, JsonBody};
use crate::error::AppResult;
use crate::models::{NewReview, ReviewPatch};
use crate::web::api::AppState;
use crate::web::auth::AuthUser;

/// GET /api/books/{id}/reviews
pub async fn list_reviews(
    State(state): State<AppState>,
    WithRejection(Path(book_id), _): IdPath,
) -> AppResult<Json<Value>> {
    let reviews = state.store.reviews_for_book(book_id).await?;
    Ok(Json(json!({ "reviews": reviews })))
}

/// POST /api/books/{id}/reviews
pub async fn create_review(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Path(book_id), _): IdPath,
    WithRejection(Json(input), _): JsonBody<NewReview>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let review = state.store.create_review(auth.user_id, book_id, input).await?;
    tracing::info!(review_id = review.id, book_id, user_id = auth.user_id, "Review created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Review created", "review": review })),
    ))
}

/// PUT /api/reviews/{id}
pub async fn update_review(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Path(review_id), _): IdPath,
    WithRejection(Json(patch), _): JsonBody<ReviewPatch>,
) -> AppResult<Json<Value>> {
    patch.validate()?;
    let review = state.store.update_review(review_id, auth.user_id, patch).await?;
    Ok(Json(json!({ "success": true, "message": "Review updated", "review": review })))
}

/// DELETE /api/reviews/{id}
pub async fn delete_review(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Path(review_id), _): IdPath,
) -> AppResult<Json<Value>> {
    state.store.delete_review(review_id, auth.user_id, auth.is_admin()).await?;
    tracing::info!(review_id, user_id = auth.user_id, "Review deleted");
    Ok(Json(json!({ "success": true, "message": "Review deleted" })))
}
