use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, EntityTrait, QuerySelect,
};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{product, supplier},
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone)]
pub struct CreateProductInput {
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub quantity: i32,
    /// Defaults to `product::DEFAULT_LOW_STOCK_THRESHOLD` when unset
    pub low_stock_threshold: Option<i32>,
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub low_stock_threshold: Option<i32>,
    /// `Some(None)` clears the supplier reference
    pub supplier_id: Option<Option<Uuid>>,
}

/// Service for managing the product catalog
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ProductService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a new product
    #[instrument(skip(self))]
    pub async fn create_product(&self, input: CreateProductInput) -> Result<Uuid, ServiceError> {
        let db = &*self.db;

        if let Some(supplier_id) = input.supplier_id {
            supplier::Entity::find_by_id(supplier_id)
                .one(db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Supplier {} not found", supplier_id))
                })?;
        }

        let mut active = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            category: Set(input.category),
            price: Set(input.price),
            quantity: Set(input.quantity),
            supplier_id: Set(input.supplier_id),
            ..Default::default()
        };
        if let Some(threshold) = input.low_stock_threshold {
            active.low_stock_threshold = Set(threshold);
        }

        let product = active.insert(db).await?;

        info!("Product created: {}", product.id);
        self.publish(Event::ProductCreated(product.id)).await;

        Ok(product.id)
    }

    /// Gets a product by ID
    #[instrument(skip(self))]
    pub async fn get_product(
        &self,
        product_id: &Uuid,
    ) -> Result<Option<product::Model>, ServiceError> {
        let product = product::Entity::find_by_id(*product_id)
            .one(&*self.db)
            .await?;
        Ok(product)
    }

    /// Lists all products
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<product::Model>, ServiceError> {
        let products = product::Entity::find()
            .limit(Some(limit))
            .offset(offset)
            .all(&*self.db)
            .await?;

        Ok(products)
    }

    /// Updates an existing product
    #[instrument(skip(self))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        let db = &*self.db;
        let product = product::Entity::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let mut active: product::ActiveModel = product.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(category) = input.category {
            active.category = Set(category);
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(quantity) = input.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(threshold) = input.low_stock_threshold {
            active.low_stock_threshold = Set(threshold);
        }
        if let Some(supplier_id) = input.supplier_id {
            if let Some(supplier_id) = supplier_id {
                supplier::Entity::find_by_id(supplier_id)
                    .one(db)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Supplier {} not found", supplier_id))
                    })?;
            }
            active.supplier_id = Set(supplier_id);
        }

        let updated = active.update(db).await?;

        info!("Product updated: {}", product_id);
        self.publish(Event::ProductUpdated(product_id)).await;

        Ok(updated)
    }

    /// Deletes a product; its sales and open purchase orders cascade away.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let result = product::Entity::delete_by_id(product_id)
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Product {} not found",
                product_id
            )));
        }

        info!("Product deleted: {}", product_id);
        self.publish(Event::ProductDeleted(product_id)).await;

        Ok(())
    }

    async fn publish(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            error!("Failed to publish event: {}", e);
        }
    }
}
