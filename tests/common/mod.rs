#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use stockroom_api::{
    app_router,
    config::AppConfig,
    db,
    entities::{product, sale, supplier, supplier_order},
    events::{self, EventSender},
    handlers::AppServices,
    notifications::RecordingNotifier,
    AppState,
};

/// In-process application over an in-memory SQLite database, with a
/// recording notifier so tests can assert on admin alerts.
pub struct TestApp {
    pub router: Router,
    pub db: Arc<db::DbPool>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".into(),
            "127.0.0.1".into(),
            18080,
            "test".into(),
        );
        // A single pooled connection keeps the in-memory schema alive for
        // the whole test.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("test database should connect");
        db::run_migrations(&pool)
            .await
            .expect("test migrations should apply");

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        tokio::spawn(events::process_events(event_rx));

        let db_pool = Arc::new(pool);
        let notifier = Arc::new(RecordingNotifier::new());
        let services = AppServices::new(
            db_pool.clone(),
            Arc::new(event_sender.clone()),
            notifier.clone(),
        );

        let state = Arc::new(AppState {
            db: db_pool.clone(),
            config: cfg,
            event_sender,
            services,
        });

        Self {
            router: app_router(state),
            db: db_pool,
            notifier,
        }
    }

    /// Sends one request through the router and returns status plus raw body.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("request should build"),
            None => builder.body(Body::empty()).expect("request should build"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should collect");

        (status, bytes.to_vec())
    }

    /// Like `request`, but parses the body as JSON.
    pub async fn request_json(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, bytes) = self.request(method, uri, body).await;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body should be JSON")
        };
        (status, json)
    }
}

/// Inserts a supplier directly, bypassing the API.
pub async fn seed_supplier(app: &TestApp, name: &str) -> supplier::Model {
    supplier::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        contact: Set(format!("{}@example.com", name.to_lowercase())),
        ..Default::default()
    }
    .insert(&*app.db)
    .await
    .expect("supplier should insert")
}

/// Inserts a product directly, bypassing the API.
pub async fn seed_product(
    app: &TestApp,
    name: &str,
    quantity: i32,
    low_stock_threshold: i32,
    supplier_id: Option<Uuid>,
) -> product::Model {
    product::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        category: Set("General".to_string()),
        price: Set(Decimal::new(999, 2)),
        quantity: Set(quantity),
        low_stock_threshold: Set(low_stock_threshold),
        supplier_id: Set(supplier_id),
        ..Default::default()
    }
    .insert(&*app.db)
    .await
    .expect("product should insert")
}

/// Inserts a purchase order with an explicit order date, so tests can pin
/// the listing order.
pub async fn seed_order(
    app: &TestApp,
    supplier_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    order_date: NaiveDate,
) -> supplier_order::Model {
    supplier_order::ActiveModel {
        id: Set(Uuid::new_v4()),
        supplier_id: Set(supplier_id),
        product_id: Set(product_id),
        quantity: Set(quantity),
        order_date: Set(order_date),
        expected_delivery_date: Set(order_date + Duration::days(14)),
        actual_delivery_date: Set(None),
        notes: Set(String::new()),
    }
    .insert(&*app.db)
    .await
    .expect("order should insert")
}

/// Inserts a sale with an explicit sale date, so tests can position sales
/// inside or outside the forecast window.
pub async fn seed_sale(
    app: &TestApp,
    product_id: Uuid,
    quantity: i32,
    sale_date: DateTime<Utc>,
) -> sale::Model {
    sale::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        quantity: Set(quantity),
        sale_date: Set(sale_date),
    }
    .insert(&*app.db)
    .await
    .expect("sale should insert")
}
