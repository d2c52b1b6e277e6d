use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use super::common::{
    created_response, double_option, no_content_response, success_response, validate_input,
    PaginationParams,
};
use crate::{
    errors::ApiError,
    services::products::{CreateProductInput, UpdateProductInput},
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub category: String,
    pub price: Decimal,
    #[validate(range(min = 0))]
    pub quantity: i32,
    #[validate(range(min = 0))]
    pub low_stock_threshold: Option<i32>,
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, Default)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 50))]
    pub category: Option<String>,
    pub price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub quantity: Option<i32>,
    #[validate(range(min = 0))]
    pub low_stock_threshold: Option<i32>,
    /// Explicit `null` detaches the product from its supplier
    #[serde(default, deserialize_with = "double_option")]
    pub supplier_id: Option<Option<Uuid>>,
}

async fn create_product(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let id = state
        .services
        .products
        .create_product(CreateProductInput {
            name: payload.name,
            category: payload.category,
            price: payload.price,
            quantity: payload.quantity,
            low_stock_threshold: payload.low_stock_threshold,
            supplier_id: payload.supplier_id,
        })
        .await?;

    Ok(created_response(json!({ "id": id })))
}

async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .products
        .get_product(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {} not found", id)))?;

    Ok(success_response(product))
}

async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .services
        .products
        .list_products(params.per_page, params.offset())
        .await?;

    Ok(success_response(products))
}

async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let product = state
        .services
        .products
        .update_product(
            id,
            UpdateProductInput {
                name: payload.name,
                category: payload.category,
                price: payload.price,
                quantity: payload.quantity,
                low_stock_threshold: payload.low_stock_threshold,
                supplier_id: payload.supplier_id,
            },
        )
        .await?;

    Ok(success_response(product))
}

async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.products.delete_product(id).await?;
    Ok(no_content_response())
}

async fn export_products(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let csv = state.services.export.products_csv().await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"products.csv\"",
            ),
        ],
        csv,
    ))
}

pub fn product_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/export", get(export_products))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}
