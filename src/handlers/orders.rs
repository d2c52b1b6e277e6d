use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use super::common::{
    created_response, double_option, success_response, validate_input, PaginationParams,
};
use crate::{
    errors::ApiError,
    services::orders::{CreateOrderInput, UpdateOrderInput},
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub supplier_id: Uuid,
    pub product_id: Uuid,
    #[validate(range(min = 0))]
    pub quantity: i32,
    pub expected_delivery_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, Default)]
pub struct UpdateOrderRequest {
    #[validate(range(min = 0))]
    pub quantity: Option<i32>,
    pub expected_delivery_date: Option<NaiveDate>,
    /// Explicit `null` reverts a recorded delivery
    #[serde(default, deserialize_with = "double_option")]
    pub actual_delivery_date: Option<Option<NaiveDate>>,
    pub notes: Option<String>,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let id = state
        .services
        .orders
        .create_order(CreateOrderInput {
            supplier_id: payload.supplier_id,
            product_id: payload.product_id,
            quantity: payload.quantity,
            expected_delivery_date: payload.expected_delivery_date,
            notes: payload.notes,
        })
        .await?;

    Ok(created_response(json!({ "id": id })))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .get_order(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {} not found", id)))?;

    Ok(success_response(order))
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = state
        .services
        .orders
        .list_orders(params.per_page, params.offset())
        .await?;

    Ok(success_response(orders))
}

async fn update_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let order = state
        .services
        .orders
        .update_order(
            id,
            UpdateOrderInput {
                quantity: payload.quantity,
                expected_delivery_date: payload.expected_delivery_date,
                actual_delivery_date: payload.actual_delivery_date,
                notes: payload.notes,
            },
        )
        .await?;

    Ok(success_response(order))
}

pub fn order_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order).put(update_order))
}
