//! Stockroom API Library
//!
//! Inventory tracking backend: suppliers, products, sales and supplier
//! purchase orders, with low-stock detection, a 30-day sales-velocity
//! stockout forecast, CSV export and admin notifications.
#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod notifications;
pub mod services;

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

/// Routes mounted under `/api/v1`.
pub fn api_v1_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/suppliers", handlers::suppliers::supplier_routes())
        .nest("/products", handlers::products::product_routes())
        .nest("/sales", handlers::sales::sale_routes())
        .nest("/orders", handlers::orders::order_routes())
        .nest("/dashboard", handlers::dashboard::dashboard_routes())
}

/// Full application router without middleware layers; shared between the
/// binary and the integration tests.
pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "stockroom-api up" }))
        .nest("/health", handlers::health::health_routes())
        .nest("/api/v1", api_v1_routes())
        .with_state(state)
}
