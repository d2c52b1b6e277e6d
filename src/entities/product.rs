use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Stock level a product defaults to alerting at when none is configured.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 5;

/// Product entity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Product name
    #[validate(length(
        min = 1,
        max = 100,
        message = "Product name must be between 1 and 100 characters"
    ))]
    pub name: String,

    /// Product category, possibly empty
    #[validate(length(max = 50, message = "Category must be at most 50 characters"))]
    pub category: String,

    /// Unit price
    pub price: Decimal,

    /// Units currently on hand
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,

    /// Stock level at or below which the product is flagged as low stock
    #[validate(range(min = 0, message = "Low stock threshold cannot be negative"))]
    pub low_stock_threshold: i32,

    /// Supplying vendor, if any
    pub supplier_id: Option<Uuid>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// Whether the product sits at or below its configured alert level.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.low_stock_threshold
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Supplier,
    #[sea_orm(has_many = "super::sale::Entity")]
    Sales,
    #[sea_orm(has_many = "super::supplier_order::Entity")]
    SupplierOrders,
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sales.def()
    }
}

impl Related<super::supplier_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SupplierOrders.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        if insert {
            if let ActiveValue::NotSet = active_model.low_stock_threshold {
                active_model.low_stock_threshold = Set(DEFAULT_LOW_STOCK_THRESHOLD);
            }
            active_model.created_at = Set(Utc::now());
        }
        active_model.updated_at = Set(Some(Utc::now()));

        let model: Model = active_model.clone().try_into().map_err(|_| {
            DbErr::Custom("Failed to convert ActiveModel to Model for validation".to_string())
        })?;

        if let Err(err) = model.validate() {
            return Err(DbErr::Custom(format!("Validation error: {}", err)));
        }

        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product(quantity: i32, low_stock_threshold: i32) -> Model {
        Model {
            id: Uuid::new_v4(),
            name: "Widget".into(),
            category: "Hardware".into(),
            price: dec!(9.99),
            quantity,
            low_stock_threshold,
            supplier_id: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn low_stock_at_or_below_threshold() {
        assert!(product(5, 5).is_low_stock());
        assert!(product(0, 5).is_low_stock());
        assert!(!product(6, 5).is_low_stock());
    }
}
