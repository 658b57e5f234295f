use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::auth::{AuthUser, Role};
use crate::engine::ledger::LineItem;
use crate::error::AppError;
use crate::models::order::{Address, Order, OrderStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/user/history", get(order_history))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/status", patch(set_order_status))
        .route("/orders/:id/cancel", post(cancel_order))
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub restaurant_id: String,
    pub items: Vec<LineItem>,
    pub delivery_address: Address,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    user.require(Role::Customer)?;

    let order = state.ledger.create(
        &user.user_id,
        &payload.restaurant_id,
        &payload.items,
        payload.delivery_address,
    )?;
    state.metrics.orders_created_total.inc();

    Ok((StatusCode::CREATED, Json(order)))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(state.ledger.get(&id)?))
}

#[derive(Deserialize)]
pub struct SetStatusRequest {
    pub status: OrderStatus,
}

/// Trusted-caller transition; restaurants move orders through preparation,
/// admins may drive any permitted edge.
async fn set_order_status(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<SetStatusRequest>,
) -> Result<Json<Value>, AppError> {
    user.require(Role::Restaurant)?;

    state.ledger.set_status(&id, payload.status)?;
    Ok(Json(json!({ "message": "order status updated" })))
}

async fn cancel_order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    user.require(Role::Customer)?;

    state.ledger.cancel(&id, &user.user_id)?;
    Ok(Json(json!({ "message": "order cancelled" })))
}

async fn order_history(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<Order>>, AppError> {
    user.require(Role::Customer)?;

    Ok(Json(state.ledger.history_for_customer(&user.user_id)))
}
