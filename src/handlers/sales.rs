use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::common::{created_response, success_response, validate_input, PaginationParams};
use crate::{
    entities::sale,
    errors::ApiError,
    services::sales::RecordSaleInput,
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct RecordSaleRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

/// A sale joined with its product name for display.
#[derive(Debug, Serialize)]
struct SaleResponse {
    #[serde(flatten)]
    sale: sale::Model,
    product_name: Option<String>,
}

async fn record_sale(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RecordSaleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let sale = state
        .services
        .sales
        .record_sale(RecordSaleInput {
            product_id: payload.product_id,
            quantity: payload.quantity,
        })
        .await?;

    Ok(created_response(sale))
}

async fn get_sale(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let sale = state
        .services
        .sales
        .get_sale(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Sale {} not found", id)))?;

    Ok(success_response(sale))
}

async fn list_sales(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let sales = state
        .services
        .sales
        .list_sales(params.per_page, params.offset())
        .await?;

    let sales: Vec<SaleResponse> = sales
        .into_iter()
        .map(|(sale, product)| SaleResponse {
            sale,
            product_name: product.map(|p| p.name),
        })
        .collect();

    Ok(success_response(sales))
}

async fn export_sales(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let csv = state.services.export.sales_csv().await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"sales.csv\"",
            ),
        ],
        csv,
    ))
}

pub fn sale_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_sales).post(record_sale))
        .route("/export", get(export_sales))
        .route("/:id", get(get_sale))
}
