mod common;

use axum::http::StatusCode;
use sea_orm::EntityTrait;
use serde_json::json;
use uuid::Uuid;

use common::{seed_product, TestApp};
use stockroom_api::entities::product;

#[tokio::test]
async fn oversell_is_rejected_and_stock_untouched() {
    let app = TestApp::spawn().await;
    let widget = seed_product(&app, "Widget", 10, 5, None).await;

    let (status, body) = app
        .request_json(
            "POST",
            "/api/v1/sales",
            Some(json!({ "product_id": widget.id, "quantity": 15 })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "quantity");
    assert_eq!(body["message"], "Not enough stock. Only 10 left.");

    let reloaded = product::Entity::find_by_id(widget.id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.quantity, 10);
    assert!(app.notifier.messages().is_empty());
}

#[tokio::test]
async fn sale_decrements_stock_and_notifies() {
    let app = TestApp::spawn().await;
    let widget = seed_product(&app, "Widget", 10, 5, None).await;

    let (status, body) = app
        .request_json(
            "POST",
            "/api/v1/sales",
            Some(json!({ "product_id": widget.id, "quantity": 5 })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["quantity"], 5);

    let reloaded = product::Entity::find_by_id(widget.id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.quantity, 5);

    // Remaining stock hit the threshold, so both alerts go out, sale first.
    let subjects = app.notifier.subjects();
    assert_eq!(
        subjects,
        vec!["New Sale: Widget", "Low Stock Alert: Widget"]
    );

    let messages = app.notifier.messages();
    assert_eq!(
        messages[0].1,
        "A sale of 5 units for Widget was recorded. Remaining stock: 5."
    );
    assert_eq!(messages[1].1, "Widget is low on stock: 5 left.");
}

#[tokio::test]
async fn sale_above_threshold_sends_only_sale_alert() {
    let app = TestApp::spawn().await;
    let widget = seed_product(&app, "Widget", 100, 5, None).await;

    let (status, _) = app
        .request_json(
            "POST",
            "/api/v1/sales",
            Some(json!({ "product_id": widget.id, "quantity": 3 })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(app.notifier.subjects(), vec!["New Sale: Widget"]);
}

#[tokio::test]
async fn sale_for_missing_product_is_404() {
    let app = TestApp::spawn().await;

    let (status, _) = app
        .request_json(
            "POST",
            "/api/v1/sales",
            Some(json!({ "product_id": Uuid::new_v4(), "quantity": 1 })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn zero_quantity_sale_is_rejected() {
    let app = TestApp::spawn().await;
    let widget = seed_product(&app, "Widget", 10, 5, None).await;

    let (status, _) = app
        .request_json(
            "POST",
            "/api/v1/sales",
            Some(json!({ "product_id": widget.id, "quantity": 0 })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn selling_exactly_the_stock_drains_it() {
    let app = TestApp::spawn().await;
    let widget = seed_product(&app, "Widget", 4, 2, None).await;

    let (status, _) = app
        .request_json(
            "POST",
            "/api/v1/sales",
            Some(json!({ "product_id": widget.id, "quantity": 4 })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);

    let reloaded = product::Entity::find_by_id(widget.id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.quantity, 0);
    assert_eq!(
        app.notifier.subjects(),
        vec!["New Sale: Widget", "Low Stock Alert: Widget"]
    );
}
