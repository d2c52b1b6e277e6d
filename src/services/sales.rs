use std::sync::Arc;

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{product, sale},
    errors::ServiceError,
    events::{Event, EventSender},
    notifications::{self, AdminNotifier},
};

/// A proposed sale, not yet validated against stock.
#[derive(Debug, Clone)]
pub struct RecordSaleInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Service that records sales against product stock.
#[derive(Clone)]
pub struct SaleService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    notifier: Arc<dyn AdminNotifier>,
}

impl SaleService {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        notifier: Arc<dyn AdminNotifier>,
    ) -> Self {
        Self {
            db,
            event_sender,
            notifier,
        }
    }

    /// Validates the proposed sale against available stock, decrements the
    /// product quantity and persists the sale in one transaction, then emits
    /// the admin notifications.
    ///
    /// A rejected sale leaves all state unchanged and surfaces a
    /// quantity-field-scoped error.
    #[instrument(skip(self), fields(product_id = %input.product_id, quantity = input.quantity))]
    pub async fn record_sale(&self, input: RecordSaleInput) -> Result<sale::Model, ServiceError> {
        if input.quantity < 1 {
            return Err(ServiceError::ValidationError(
                "Sale quantity must be at least 1".to_string(),
            ));
        }

        let db = &*self.db;
        let txn = db.begin().await?;

        let product = product::Entity::find_by_id(input.product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", input.product_id))
            })?;

        if input.quantity > product.quantity {
            return Err(ServiceError::InsufficientStock {
                available: product.quantity,
            });
        }

        // Guarded decrement: a concurrent sale that drained the stock first
        // makes this a no-op, which surfaces as the same insufficient-stock
        // rejection instead of driving the quantity negative.
        let update = product::Entity::update_many()
            .col_expr(
                product::Column::Quantity,
                Expr::col(product::Column::Quantity).sub(input.quantity),
            )
            .filter(product::Column::Id.eq(input.product_id))
            .filter(product::Column::Quantity.gte(input.quantity))
            .exec(&txn)
            .await?;

        if update.rows_affected == 0 {
            return Err(ServiceError::InsufficientStock {
                available: product.quantity,
            });
        }

        let sale = sale::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product.id),
            quantity: Set(input.quantity),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        let remaining = product.quantity - input.quantity;
        info!(sale_id = %sale.id, remaining, "sale recorded");

        let (subject, body) =
            notifications::sale_recorded_message(&product.name, input.quantity, remaining);
        self.notifier.notify_admins(&subject, &body).await;

        if remaining <= product.low_stock_threshold {
            let (subject, body) = notifications::low_stock_message(&product.name, remaining);
            self.notifier.notify_admins(&subject, &body).await;
            self.publish(Event::LowStockDetected {
                product_id: product.id,
                quantity: remaining,
                threshold: product.low_stock_threshold,
            })
            .await;
        }

        self.publish(Event::SaleRecorded {
            sale_id: sale.id,
            product_id: product.id,
            quantity: input.quantity,
            remaining,
        })
        .await;

        Ok(sale)
    }

    /// Gets a sale by ID
    #[instrument(skip(self))]
    pub async fn get_sale(&self, sale_id: &Uuid) -> Result<Option<sale::Model>, ServiceError> {
        let sale = sale::Entity::find_by_id(*sale_id).one(&*self.db).await?;
        Ok(sale)
    }

    /// Lists sales with their products, newest first
    #[instrument(skip(self))]
    pub async fn list_sales(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<(sale::Model, Option<product::Model>)>, ServiceError> {
        let sales = sale::Entity::find()
            .find_also_related(product::Entity)
            .order_by_desc(sale::Column::SaleDate)
            .limit(Some(limit))
            .offset(offset)
            .all(&*self.db)
            .await?;

        Ok(sales)
    }

    async fn publish(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            error!("Failed to publish event: {}", e);
        }
    }
}
