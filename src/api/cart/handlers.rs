use crate::api::extract::AuthUser;
use crate::api::models::*;
use axum::{Json, extract::State};
use serde_json::Value;
use tracing::info;

pub async fn get_cart_handler(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<CartResponse>, AppError> {
    let items = state.store.cart_items(&user.user_id).await?;
    let total = cart_total(&items);

    Ok(Json(CartResponse { items, total }))
}

pub async fn update_cart_handler(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<UpdateCartRequest>,
) -> Result<Json<CartUpdatedResponse>, AppError> {
    let Some(Value::Array(items)) = request.items else {
        return Err(AppError::BadRequest("Items must be a list".to_string()));
    };

    state.store.replace_cart(&user.user_id, &items).await?;

    let total = cart_total(&items);
    info!(user_id = %user.user_id, lines = items.len(), total, "Cart updated");

    Ok(Json(CartUpdatedResponse {
        message: "Cart updated".to_string(),
        total,
    }))
}
