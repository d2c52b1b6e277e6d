use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, EntityTrait, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{product, supplier, supplier_order},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Delivery status of a purchase order, derived from its dates at read time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
pub enum OrderStatus {
    Pending,
    Delayed,
    Delivered,
}

impl OrderStatus {
    /// Resolves the status from the delivery dates and the evaluation date.
    ///
    /// Delivered wins regardless of how the dates compare; otherwise an order
    /// is Delayed once the evaluation date passes the promised date.
    pub fn resolve(expected: NaiveDate, actual: Option<NaiveDate>, today: NaiveDate) -> Self {
        if actual.is_some() {
            OrderStatus::Delivered
        } else if today > expected {
            OrderStatus::Delayed
        } else {
            OrderStatus::Pending
        }
    }
}

/// A purchase order with its derived status, as returned to callers.
#[derive(Debug, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: supplier_order::Model,
    pub status: OrderStatus,
}

impl OrderView {
    /// Resolves the status as of now; never cached, since the comparison
    /// depends on the evaluation date.
    pub fn new(order: supplier_order::Model) -> Self {
        let status = OrderStatus::resolve(
            order.expected_delivery_date,
            order.actual_delivery_date,
            Utc::now().date_naive(),
        );
        Self { order, status }
    }
}

#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    pub supplier_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub expected_delivery_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateOrderInput {
    pub quantity: Option<i32>,
    pub expected_delivery_date: Option<NaiveDate>,
    /// `Some(None)` clears a previously recorded delivery
    pub actual_delivery_date: Option<Option<NaiveDate>>,
    pub notes: Option<String>,
}

/// Service for managing supplier purchase orders
#[derive(Clone)]
pub struct SupplierOrderService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl SupplierOrderService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a new purchase order
    #[instrument(skip(self))]
    pub async fn create_order(&self, input: CreateOrderInput) -> Result<Uuid, ServiceError> {
        if input.quantity < 0 {
            return Err(ServiceError::ValidationError(
                "Order quantity cannot be negative".to_string(),
            ));
        }

        let db = &*self.db;
        supplier::Entity::find_by_id(input.supplier_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supplier {} not found", input.supplier_id))
            })?;
        product::Entity::find_by_id(input.product_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", input.product_id))
            })?;

        let order = supplier_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            supplier_id: Set(input.supplier_id),
            product_id: Set(input.product_id),
            quantity: Set(input.quantity),
            expected_delivery_date: Set(input.expected_delivery_date),
            actual_delivery_date: Set(None),
            notes: Set(input.notes.unwrap_or_default()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!("Supplier order created: {}", order.id);
        self.publish(Event::SupplierOrderCreated(order.id)).await;

        Ok(order.id)
    }

    /// Gets an order by ID, with its derived status
    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: &Uuid) -> Result<Option<OrderView>, ServiceError> {
        let order = supplier_order::Entity::find_by_id(*order_id)
            .one(&*self.db)
            .await?;
        Ok(order.map(OrderView::new))
    }

    /// Lists orders newest first, each with its derived status
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<OrderView>, ServiceError> {
        let orders = supplier_order::Entity::find()
            .order_by_desc(supplier_order::Column::OrderDate)
            .limit(Some(limit))
            .offset(offset)
            .all(&*self.db)
            .await?;

        Ok(orders.into_iter().map(OrderView::new).collect())
    }

    /// Updates an order; recording an actual delivery date is what moves an
    /// order to Delivered on subsequent reads.
    #[instrument(skip(self))]
    pub async fn update_order(
        &self,
        order_id: Uuid,
        input: UpdateOrderInput,
    ) -> Result<OrderView, ServiceError> {
        let db = &*self.db;
        let order = supplier_order::Entity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let mut active: supplier_order::ActiveModel = order.into();
        if let Some(quantity) = input.quantity {
            if quantity < 0 {
                return Err(ServiceError::ValidationError(
                    "Order quantity cannot be negative".to_string(),
                ));
            }
            active.quantity = Set(quantity);
        }
        if let Some(expected) = input.expected_delivery_date {
            active.expected_delivery_date = Set(expected);
        }
        if let Some(actual) = input.actual_delivery_date {
            active.actual_delivery_date = Set(actual);
        }
        if let Some(notes) = input.notes {
            active.notes = Set(notes);
        }

        let updated = active.update(db).await?;

        info!("Supplier order updated: {}", order_id);
        self.publish(Event::SupplierOrderUpdated(order_id)).await;

        Ok(OrderView::new(updated))
    }

    async fn publish(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            error!("Failed to publish event: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn delivered_wins_regardless_of_dates() {
        let today = date(2024, 6, 15);
        // Delivered late
        assert_eq!(
            OrderStatus::resolve(date(2024, 6, 1), Some(date(2024, 6, 10)), today),
            OrderStatus::Delivered
        );
        // Delivered before the promised date even arrives
        assert_eq!(
            OrderStatus::resolve(date(2024, 6, 20), Some(date(2024, 6, 14)), today),
            OrderStatus::Delivered
        );
    }

    #[test]
    fn overdue_without_delivery_is_delayed() {
        let today = date(2024, 6, 15);
        assert_eq!(
            OrderStatus::resolve(date(2024, 6, 14), None, today),
            OrderStatus::Delayed
        );
    }

    #[test]
    fn due_today_or_later_is_pending() {
        let today = date(2024, 6, 15);
        assert_eq!(
            OrderStatus::resolve(date(2024, 6, 15), None, today),
            OrderStatus::Pending
        );
        assert_eq!(
            OrderStatus::resolve(date(2024, 7, 1), None, today),
            OrderStatus::Pending
        );
    }

    #[test]
    fn status_display_matches_wire_format() {
        assert_eq!(OrderStatus::Delayed.to_string(), "Delayed");
    }
}
