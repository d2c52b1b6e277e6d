use std::sync::Arc;

use sea_orm::EntityTrait;
use tracing::instrument;

use crate::{
    db::DbPool,
    entities::{product, sale, supplier},
    errors::ServiceError,
};

/// Builds CSV exports of the catalog and the sale history.
#[derive(Clone)]
pub struct ExportService {
    db: Arc<DbPool>,
}

impl ExportService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// The full product catalog as CSV, supplier names resolved.
    #[instrument(skip(self))]
    pub async fn products_csv(&self) -> Result<Vec<u8>, ServiceError> {
        let products = product::Entity::find()
            .find_also_related(supplier::Entity)
            .all(&*self.db)
            .await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record([
                "Name",
                "Category",
                "Supplier",
                "Price",
                "Quantity",
                "Low Stock Threshold",
            ])
            .map_err(|e| ServiceError::InternalError(format!("CSV write failed: {}", e)))?;

        for (p, s) in products {
            let supplier_name = s.map(|s| s.name).unwrap_or_default();
            let price = p.price.to_string();
            let quantity = p.quantity.to_string();
            let threshold = p.low_stock_threshold.to_string();
            writer
                .write_record([
                    p.name.as_str(),
                    p.category.as_str(),
                    supplier_name.as_str(),
                    price.as_str(),
                    quantity.as_str(),
                    threshold.as_str(),
                ])
                .map_err(|e| ServiceError::InternalError(format!("CSV write failed: {}", e)))?;
        }

        writer
            .into_inner()
            .map_err(|e| ServiceError::InternalError(format!("CSV flush failed: {}", e)))
    }

    /// The full sale history as CSV, in store order, product names resolved.
    #[instrument(skip(self))]
    pub async fn sales_csv(&self) -> Result<Vec<u8>, ServiceError> {
        let sales = sale::Entity::find()
            .find_also_related(product::Entity)
            .all(&*self.db)
            .await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["Product", "Quantity", "Sale Date"])
            .map_err(|e| ServiceError::InternalError(format!("CSV write failed: {}", e)))?;

        for (s, p) in sales {
            let product_name = p.map(|p| p.name).unwrap_or_default();
            let quantity = s.quantity.to_string();
            let sale_date = s.sale_date.to_rfc3339();
            writer
                .write_record([product_name.as_str(), quantity.as_str(), sale_date.as_str()])
                .map_err(|e| ServiceError::InternalError(format!("CSV write failed: {}", e)))?;
        }

        writer
            .into_inner()
            .map_err(|e| ServiceError::InternalError(format!("CSV flush failed: {}", e)))
    }
}
