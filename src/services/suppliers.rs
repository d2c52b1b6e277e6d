use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QuerySelect,
};
use serde::Serialize;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{product, sale, supplier},
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone)]
pub struct CreateSupplierInput {
    pub name: String,
    pub contact: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateSupplierInput {
    pub name: Option<String>,
    pub contact: Option<String>,
}

/// Per-supplier rollup: how many products they supply and how many sales
/// those products have seen.
#[derive(Debug, Serialize)]
pub struct SupplierStats {
    pub supplier: supplier::Model,
    pub total_products: u64,
    pub total_sales: u64,
}

/// Service for managing suppliers
#[derive(Clone)]
pub struct SupplierService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl SupplierService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a new supplier
    #[instrument(skip(self))]
    pub async fn create_supplier(&self, input: CreateSupplierInput) -> Result<Uuid, ServiceError> {
        let supplier = supplier::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            contact: Set(input.contact),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!("Supplier created: {}", supplier.id);
        self.publish(Event::SupplierCreated(supplier.id)).await;

        Ok(supplier.id)
    }

    /// Gets a supplier by ID
    #[instrument(skip(self))]
    pub async fn get_supplier(
        &self,
        supplier_id: &Uuid,
    ) -> Result<Option<supplier::Model>, ServiceError> {
        let supplier = supplier::Entity::find_by_id(*supplier_id)
            .one(&*self.db)
            .await?;
        Ok(supplier)
    }

    /// Lists all suppliers
    #[instrument(skip(self))]
    pub async fn list_suppliers(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<supplier::Model>, ServiceError> {
        let suppliers = supplier::Entity::find()
            .limit(Some(limit))
            .offset(offset)
            .all(&*self.db)
            .await?;

        Ok(suppliers)
    }

    /// Updates an existing supplier
    #[instrument(skip(self))]
    pub async fn update_supplier(
        &self,
        supplier_id: Uuid,
        input: UpdateSupplierInput,
    ) -> Result<supplier::Model, ServiceError> {
        let db = &*self.db;
        let supplier = supplier::Entity::find_by_id(supplier_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supplier {} not found", supplier_id))
            })?;

        let mut active: supplier::ActiveModel = supplier.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(contact) = input.contact {
            active.contact = Set(contact);
        }

        let updated = active.update(db).await?;

        info!("Supplier updated: {}", supplier_id);
        self.publish(Event::SupplierUpdated(supplier_id)).await;

        Ok(updated)
    }

    /// Deletes a supplier; their products survive with the reference cleared,
    /// their open purchase orders cascade away.
    #[instrument(skip(self))]
    pub async fn delete_supplier(&self, supplier_id: Uuid) -> Result<(), ServiceError> {
        let result = supplier::Entity::delete_by_id(supplier_id)
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Supplier {} not found",
                supplier_id
            )));
        }

        info!("Supplier deleted: {}", supplier_id);
        self.publish(Event::SupplierDeleted(supplier_id)).await;

        Ok(())
    }

    /// Per-supplier product and sale counts.
    #[instrument(skip(self))]
    pub async fn supplier_analytics(&self) -> Result<Vec<SupplierStats>, ServiceError> {
        let db = &*self.db;
        let suppliers = supplier::Entity::find().all(db).await?;

        let mut stats = Vec::with_capacity(suppliers.len());
        for s in suppliers {
            let products = product::Entity::find()
                .filter(product::Column::SupplierId.eq(s.id))
                .all(db)
                .await?;
            let product_ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();

            let total_sales = if product_ids.is_empty() {
                0
            } else {
                sale::Entity::find()
                    .filter(sale::Column::ProductId.is_in(product_ids))
                    .count(db)
                    .await?
            };

            stats.push(SupplierStats {
                supplier: s,
                total_products: products.len() as u64,
                total_sales,
            });
        }

        Ok(stats)
    }

    async fn publish(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            error!("Failed to publish event: {}", e);
        }
    }
}
