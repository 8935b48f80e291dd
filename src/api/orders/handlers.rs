use crate::api::extract::{AdminUser, AuthUser};
use crate::api::models::*;
use crate::storage::OrderRecord;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use bson::oid::ObjectId;
use tracing::info;

pub async fn create_order_handler(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    let (items, total) = request.validate().map_err(AppError::BadRequest)?;

    let order = OrderRecord::new(user.user_id.clone(), items, total);
    state.store.insert_order(&order).await?;

    // Placing an order empties the cart
    state.store.replace_cart(&user.user_id, &[]).await?;

    info!(
        user_id = %user.user_id,
        order_id = %order.id,
        lines = order.items.len(),
        total,
        "Order placed"
    );

    Ok((StatusCode::CREATED, Json(OrderResponse { order: order.into() })))
}

pub async fn list_orders_handler(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<OrdersResponse>, AppError> {
    let orders = state.store.list_orders(Some(&user.user_id)).await?;

    Ok(Json(OrdersResponse {
        orders: orders.into_iter().map(OrderView::from).collect(),
    }))
}

pub async fn list_all_orders_handler(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<OrdersResponse>, AppError> {
    let orders = state.store.list_orders(None).await?;

    Ok(Json(OrdersResponse {
        orders: orders.into_iter().map(OrderView::from).collect(),
    }))
}

/// Any status may follow any other; only the value itself is checked
pub async fn update_status_handler(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(order_id): Path<String>,
    ApiJson(request): ApiJson<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let status = request.validate().map_err(AppError::BadRequest)?;

    let id = ObjectId::parse_str(&order_id)
        .map_err(|_| AppError::BadRequest("Invalid order id".to_string()))?;

    let order = state
        .store
        .set_order_status(id, status)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    info!(admin_id = %admin.user_id, order_id = %id, status = %status, "Order status updated");

    Ok(Json(OrderResponse { order: order.into() }))
}
