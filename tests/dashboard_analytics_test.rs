mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use common::{seed_product, seed_sale, TestApp};

#[tokio::test]
async fn fast_seller_appears_in_forecast() {
    let app = TestApp::spawn().await;
    // 90 units over the 30-day window: 3.0/day against 20 in stock leaves
    // 6.67 days, inside the 7-day horizon.
    let fast = seed_product(&app, "Fast", 20, 0, None).await;
    seed_sale(&app, fast.id, 90, Utc::now() - Duration::days(10)).await;

    let (status, body) = app.request_json("GET", "/api/v1/dashboard", None).await;

    assert_eq!(status, StatusCode::OK);
    let forecast = body["forecasted_out"].as_array().unwrap();
    assert_eq!(forecast.len(), 1);
    assert_eq!(forecast[0]["name"], "Fast");
    assert_eq!(forecast[0]["days_left"], 6);
    assert_eq!(forecast[0]["avg_daily_sales"], 3.0);
}

#[tokio::test]
async fn slow_seller_is_not_forecast() {
    let app = TestApp::spawn().await;
    // 3 units over the window: 0.1/day against 100 in stock is 1000 days.
    let slow = seed_product(&app, "Slow", 100, 0, None).await;
    seed_sale(&app, slow.id, 3, Utc::now() - Duration::days(5)).await;

    let (status, body) = app.request_json("GET", "/api/v1/dashboard", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["forecasted_out"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn sales_outside_window_do_not_count() {
    let app = TestApp::spawn().await;
    let stale = seed_product(&app, "Stale", 5, 0, None).await;
    seed_sale(&app, stale.id, 500, Utc::now() - Duration::days(45)).await;

    let (status, body) = app.request_json("GET", "/api/v1/dashboard", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["forecasted_out"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn low_stock_set_and_notifications() {
    let app = TestApp::spawn().await;
    seed_product(&app, "AtThreshold", 5, 5, None).await;
    seed_product(&app, "Below", 1, 5, None).await;
    seed_product(&app, "Healthy", 50, 5, None).await;

    let (status, body) = app.request_json("GET", "/api/v1/dashboard", None).await;

    assert_eq!(status, StatusCode::OK);
    let mut low: Vec<&str> = body["low_stock"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    low.sort_unstable();
    assert_eq!(low, vec!["AtThreshold", "Below"]);

    let notifications = body["notifications"].as_array().unwrap();
    assert!(notifications.contains(&Value::String(
        "Low stock: AtThreshold (5 left)".to_string()
    )));
    assert!(notifications.contains(&Value::String("Low stock: Below (1 left)".to_string())));
    assert_eq!(notifications.len(), 2);
}

#[tokio::test]
async fn recent_sales_are_capped_and_newest_first() {
    let app = TestApp::spawn().await;
    let widget = seed_product(&app, "Widget", 1000, 5, None).await;

    for day in 1..=7 {
        seed_sale(&app, widget.id, day, Utc::now() - Duration::days(i64::from(day))).await;
    }

    let (status, body) = app.request_json("GET", "/api/v1/dashboard", None).await;

    assert_eq!(status, StatusCode::OK);
    let recent = body["recent_sales"].as_array().unwrap();
    assert_eq!(recent.len(), 5);
    // Seeded quantity equals the age in days, so newest-first reads 1..=5.
    let quantities: Vec<i64> = recent.iter().map(|s| s["quantity"].as_i64().unwrap()).collect();
    assert_eq!(quantities, vec![1, 2, 3, 4, 5]);
    assert_eq!(recent[0]["product_name"], "Widget");
}

#[tokio::test]
async fn dashboard_reflects_a_recorded_sale() {
    let app = TestApp::spawn().await;
    let widget = seed_product(&app, "Widget", 6, 5, None).await;

    let (status, _) = app
        .request_json(
            "POST",
            "/api/v1/sales",
            Some(json!({ "product_id": widget.id, "quantity": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.request_json("GET", "/api/v1/dashboard", None).await;

    assert_eq!(status, StatusCode::OK);
    let low = body["low_stock"].as_array().unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0]["quantity"], 4);
    assert_eq!(body["recent_sales"].as_array().unwrap().len(), 1);
}
