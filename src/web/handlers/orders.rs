use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_extra::extract::WithRejection;
use serde_json::{Value, json};
use validator::Validate;

use super::{IdPath, JsonBody};
use crate::error::{AppError, AppResult};
use crate::web::api::AppState;
use crate::web::auth::AuthUser;
use crate::web::models::{OrderRequest, OrderStatusRequest};

/// POST /api/orders
pub async fn create_order(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Json(request), _): JsonBody<OrderRequest>,
) -> AppResult<impl IntoResponse> {
    request.validate()?;
    let order = state
        .store
        .create_order(auth.user_id, &request.order_items, request.payment_method)
        .await?;
    tracing::info!(order_id = order.id, user_id = auth.user_id, total = order.total_amount, "Order placed");
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": order }))))
}

/// GET /api/orders
pub async fn my_orders(State(state): State<AppState>, auth: AuthUser) -> Json<Value> {
    let orders = state.store.orders_for_user(auth.user_id).await;
    Json(json!({ "success": true, "data": orders }))
}

/// GET /api/orders/all
pub async fn all_orders(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Value>> {
    auth.require_staff()?;
    let orders = state.store.all_orders().await;
    Ok(Json(json!({ "success": true, "data": orders })))
}

/// GET /api/orders/{id}
///
/// Customers only see their own orders; anything else is reported as missing.
pub async fn get_order(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Path(order_id), _): IdPath,
) -> AppResult<Json<Value>> {
    let order = state.store.get_order_details(order_id).await?;
    if order.user_id != auth.user_id && !auth.role.is_staff() {
        return Err(AppError::not_found("Order not found"));
    }
    Ok(Json(json!({ "success": true, "data": order })))
}

/// PUT /api/orders/{id}
pub async fn update_order(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Path(order_id), _): IdPath,
    WithRejection(Json(request), _): JsonBody<OrderRequest>,
) -> AppResult<Json<Value>> {
    request.validate()?;
    let order = state
        .store
        .replace_order_items(order_id, auth.user_id, &request.order_items, request.payment_method)
        .await?;
    Ok(Json(json!({ "success": true, "message": "Order updated", "data": order })))
}

/// PUT /api/orders/{id}/status
pub async fn update_order_status(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Path(order_id), _): IdPath,
    WithRejection(Json(request), _): JsonBody<OrderStatusRequest>,
) -> AppResult<Json<Value>> {
    auth.require_staff()?;
    let order = state.store.set_order_status(order_id, request.status).await?;
    tracing::info!(order_id, status = ?order.status, user_id = auth.user_id, "Order status changed");
    Ok(Json(json!({
        "success": true,
        "message": "Order status updated",
        "data": { "id": order.id, "status": order.status },
    })))
}
