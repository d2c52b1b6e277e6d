use std::sync::Arc;

use crate::{
    db::DbPool,
    events::EventSender,
    notifications::AdminNotifier,
    services::{
        analytics::AnalyticsService, export::ExportService, orders::SupplierOrderService,
        products::ProductService, sales::SaleService, suppliers::SupplierService,
    },
};

pub mod common;
pub mod dashboard;
pub mod health;
pub mod orders;
pub mod products;
pub mod sales;
pub mod suppliers;

pub use crate::AppState;

/// All application services, constructed once and shared through the router
/// state.
#[derive(Clone)]
pub struct AppServices {
    pub suppliers: SupplierService,
    pub products: ProductService,
    pub sales: SaleService,
    pub orders: SupplierOrderService,
    pub analytics: AnalyticsService,
    pub export: ExportService,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        notifier: Arc<dyn AdminNotifier>,
    ) -> Self {
        Self {
            suppliers: SupplierService::new(db.clone(), event_sender.clone()),
            products: ProductService::new(db.clone(), event_sender.clone()),
            sales: SaleService::new(db.clone(), event_sender.clone(), notifier),
            orders: SupplierOrderService::new(db.clone(), event_sender),
            analytics: AnalyticsService::new(db.clone()),
            export: ExportService::new(db),
        }
    }
}
