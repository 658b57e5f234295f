use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::auth::{AuthUser, Role};
use crate::engine::stats::CourierStatistics;
use crate::error::AppError;
use crate::models::courier::{CourierStatus, GeoPoint};
use crate::models::order::Order;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/couriers/location", post(update_location))
        .route("/couriers/status", patch(update_status))
        .route("/couriers/available-orders", get(available_orders))
        .route("/couriers/accept-order/:order_id", post(accept_order))
        .route(
            "/couriers/complete-delivery/:order_id",
            post(complete_delivery),
        )
        .route("/couriers/statistics", get(statistics))
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub location: GeoPoint,
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<Value>, AppError> {
    user.require(Role::Courier)?;

    state.registry.set_location(&user.user_id, payload.location)?;
    Ok(Json(json!({ "message": "location updated" })))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: CourierStatus,
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    user.require(Role::Courier)?;

    state.registry.set_status(&user.user_id, payload.status)?;
    Ok(Json(json!({ "message": "status updated" })))
}

#[derive(Deserialize)]
pub struct GeoQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<f64>,
}

impl GeoQuery {
    /// The distance filter applies only when all three parameters are
    /// present.
    fn filter(&self) -> Result<(Option<GeoPoint>, Option<f64>), AppError> {
        match (self.lat, self.lng, self.radius) {
            (Some(lat), Some(lng), Some(radius)) => {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                    return Err(AppError::Validation("lat/lng out of range".to_string()));
                }
                if radius <= 0.0 {
                    return Err(AppError::Validation("radius must be > 0".to_string()));
                }
                Ok((Some(GeoPoint { lat, lng }), Some(radius)))
            }
            (None, None, None) => Ok((None, None)),
            _ => Err(AppError::Validation(
                "lat, lng and radius must be supplied together".to_string(),
            )),
        }
    }
}

async fn available_orders(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<GeoQuery>,
) -> Result<Json<Vec<Order>>, AppError> {
    user.require(Role::Courier)?;

    let (near, radius) = query.filter()?;
    Ok(Json(state.dispatch.list_ready_orders(near, radius)))
}

async fn accept_order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(order_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    user.require(Role::Courier)?;

    state.dispatch.accept_order(&user.user_id, &order_id).await?;
    Ok(Json(json!({ "message": "order accepted" })))
}

async fn complete_delivery(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(order_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    user.require(Role::Courier)?;

    state
        .dispatch
        .complete_delivery(&user.user_id, &order_id)
        .await?;
    Ok(Json(json!({ "message": "delivery completed" })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

async fn statistics(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<CourierStatistics>, AppError> {
    user.require(Role::Courier)?;

    Ok(Json(state.stats.statistics(
        &user.user_id,
        query.start_date,
        query.end_date,
    )))
}
