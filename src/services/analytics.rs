use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{product, sale},
    errors::ServiceError,
};

/// Trailing window the sales-velocity forecast averages over.
pub const FORECAST_WINDOW_DAYS: i64 = 30;

/// Products projected to stock out within this horizon enter the forecast set.
pub const STOCKOUT_HORIZON_DAYS: f64 = 7.0;

/// How many recent sales the dashboard surfaces.
const RECENT_SALES_LIMIT: u64 = 5;

/// A product projected to run out of stock within the horizon.
#[derive(Debug, Clone, Serialize)]
pub struct StockForecast {
    pub product_id: Uuid,
    pub name: String,
    /// Whole days of stock left at the trailing average rate, rounded down
    pub days_left: i64,
    /// Trailing average units sold per day, rounded to 2 decimal places
    pub avg_daily_sales: f64,
}

/// Every product at or below its configured low-stock threshold.
pub fn low_stock_products(catalog: &[product::Model]) -> Vec<product::Model> {
    catalog
        .iter()
        .filter(|p| p.is_low_stock())
        .cloned()
        .collect()
}

/// Projects stockouts from the trailing window of sales.
///
/// A product with no sales in the window has no measurable velocity and can
/// never stock out within the horizon, so it is skipped before any division.
pub fn forecast_stockouts(
    catalog: &[product::Model],
    sold_in_window: &HashMap<Uuid, i64>,
) -> Vec<StockForecast> {
    catalog
        .iter()
        .filter_map(|product| {
            let total_sold = sold_in_window.get(&product.id).copied().unwrap_or(0);
            if total_sold <= 0 {
                return None;
            }
            let avg_daily_sales = total_sold as f64 / FORECAST_WINDOW_DAYS as f64;
            let days_left = f64::from(product.quantity) / avg_daily_sales;
            if days_left < STOCKOUT_HORIZON_DAYS {
                Some(StockForecast {
                    product_id: product.id,
                    name: product.name.clone(),
                    days_left: days_left.floor() as i64,
                    avg_daily_sales: (avg_daily_sales * 100.0).round() / 100.0,
                })
            } else {
                None
            }
        })
        .collect()
}

/// A recent sale with its product resolved for display.
#[derive(Debug, Clone, Serialize)]
pub struct RecentSale {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub quantity: i32,
    pub sale_date: DateTime<Utc>,
}

/// Everything the dashboard renders in one round of queries.
#[derive(Debug, Serialize)]
pub struct DashboardReport {
    pub products: Vec<product::Model>,
    pub low_stock: Vec<product::Model>,
    pub recent_sales: Vec<RecentSale>,
    pub forecasted_out: Vec<StockForecast>,
    /// In-app notification strings, one per low-stock product
    pub notifications: Vec<String>,
}

/// Read-only analytics over the product catalog and sale history.
#[derive(Clone)]
pub struct AnalyticsService {
    db: Arc<DbPool>,
}

impl AnalyticsService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Total units sold per product since `since`.
    async fn sold_since(&self, since: DateTime<Utc>) -> Result<HashMap<Uuid, i64>, ServiceError> {
        let sales = sale::Entity::find()
            .filter(sale::Column::SaleDate.gte(since))
            .all(&*self.db)
            .await?;

        let mut totals: HashMap<Uuid, i64> = HashMap::new();
        for s in sales {
            *totals.entry(s.product_id).or_insert(0) += i64::from(s.quantity);
        }
        Ok(totals)
    }

    /// Assembles the dashboard report: full catalog, low-stock set, recent
    /// sales, stockout forecast and notification strings.
    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardReport, ServiceError> {
        let products = product::Entity::find().all(&*self.db).await?;
        let low_stock = low_stock_products(&products);

        let since = Utc::now() - Duration::days(FORECAST_WINDOW_DAYS);
        let sold = self.sold_since(since).await?;
        let forecasted_out = forecast_stockouts(&products, &sold);

        let recent_sales = sale::Entity::find()
            .find_also_related(product::Entity)
            .order_by_desc(sale::Column::SaleDate)
            .limit(RECENT_SALES_LIMIT)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|(s, p)| RecentSale {
                id: s.id,
                product_id: s.product_id,
                product_name: p.map(|p| p.name),
                quantity: s.quantity,
                sale_date: s.sale_date,
            })
            .collect();

        let notifications = low_stock
            .iter()
            .map(|p| format!("Low stock: {} ({} left)", p.name, p.quantity))
            .collect();

        Ok(DashboardReport {
            products,
            low_stock,
            recent_sales,
            forecasted_out,
            notifications,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product(name: &str, quantity: i32, low_stock_threshold: i32) -> product::Model {
        product::Model {
            id: Uuid::new_v4(),
            name: name.into(),
            category: "Test".into(),
            price: dec!(1.00),
            quantity,
            low_stock_threshold,
            supplier_id: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn low_stock_membership_iff_at_or_below_threshold() {
        let catalog = vec![
            product("at", 5, 5),
            product("below", 2, 5),
            product("above", 6, 5),
        ];

        let low: Vec<_> = low_stock_products(&catalog)
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(low, vec!["at", "below"]);
    }

    #[test]
    fn no_sales_in_window_never_forecast() {
        let catalog = vec![product("idle", 1, 0)];
        let sold = HashMap::new();

        assert!(forecast_stockouts(&catalog, &sold).is_empty());
    }

    #[test]
    fn fast_seller_is_forecast_with_floored_days() {
        // quantity=20, sold=90 over 30 days: avg 3.0/day, 6.67 days left
        let p = product("fast", 20, 0);
        let sold = HashMap::from([(p.id, 90)]);

        let forecast = forecast_stockouts(&[p], &sold);
        assert_eq!(forecast.len(), 1);
        assert_eq!(forecast[0].days_left, 6);
        assert!((forecast[0].avg_daily_sales - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn slow_seller_is_excluded() {
        // quantity=100, sold=3 over 30 days: avg 0.1/day, 1000 days left
        let p = product("slow", 100, 0);
        let sold = HashMap::from([(p.id, 3)]);

        assert!(forecast_stockouts(&[p], &sold).is_empty());
    }

    #[test]
    fn exactly_seven_days_left_is_excluded() {
        // quantity=21 at 3.0/day is exactly 7.0 days, not strictly below
        let p = product("boundary", 21, 0);
        let sold = HashMap::from([(p.id, 90)]);

        assert!(forecast_stockouts(&[p], &sold).is_empty());
    }

    #[test]
    fn average_rate_is_rounded_to_two_places() {
        // sold=91 over 30 days: 3.0333... rounds to 3.03
        let p = product("rounded", 10, 0);
        let sold = HashMap::from([(p.id, 91)]);

        let forecast = forecast_stockouts(&[p], &sold);
        assert_eq!(forecast.len(), 1);
        assert!((forecast[0].avg_daily_sales - 3.03).abs() < f64::EPSILON);
        // 10 / 3.0333 = 3.296 days, floored
        assert_eq!(forecast[0].days_left, 3);
    }
}
