use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use super::common::{
    created_response, no_content_response, success_response, validate_input, PaginationParams,
};
use crate::{
    errors::ApiError,
    services::suppliers::{CreateSupplierInput, UpdateSupplierInput},
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSupplierRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub contact: String,
}

#[derive(Debug, Deserialize, Validate, Default)]
pub struct UpdateSupplierRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub contact: Option<String>,
}

async fn create_supplier(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateSupplierRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let id = state
        .services
        .suppliers
        .create_supplier(CreateSupplierInput {
            name: payload.name,
            contact: payload.contact,
        })
        .await?;

    Ok(created_response(json!({ "id": id })))
}

async fn get_supplier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let supplier = state
        .services
        .suppliers
        .get_supplier(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Supplier {} not found", id)))?;

    Ok(success_response(supplier))
}

async fn list_suppliers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let suppliers = state
        .services
        .suppliers
        .list_suppliers(params.per_page, params.offset())
        .await?;

    Ok(success_response(suppliers))
}

async fn update_supplier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSupplierRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let supplier = state
        .services
        .suppliers
        .update_supplier(
            id,
            UpdateSupplierInput {
                name: payload.name,
                contact: payload.contact,
            },
        )
        .await?;

    Ok(success_response(supplier))
}

async fn delete_supplier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.suppliers.delete_supplier(id).await?;
    Ok(no_content_response())
}

async fn supplier_analytics(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state.services.suppliers.supplier_analytics().await?;
    Ok(success_response(stats))
}

pub fn supplier_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_suppliers).post(create_supplier))
        .route("/analytics", get(supplier_analytics))
        .route(
            "/:id",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
}
