use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Supplier events
    SupplierCreated(Uuid),
    SupplierUpdated(Uuid),
    SupplierDeleted(Uuid),

    // Product events
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),

    // Sale events
    SaleRecorded {
        sale_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        remaining: i32,
    },
    LowStockDetected {
        product_id: Uuid,
        quantity: i32,
        threshold: i32,
    },

    // Purchase order events
    SupplierOrderCreated(Uuid),
    SupplierOrderUpdated(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Background consumer for the application event channel.
///
/// Runs until every `EventSender` is dropped and the channel closes.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::LowStockDetected {
                product_id,
                quantity,
                threshold,
            } => {
                warn!(
                    %product_id,
                    quantity, threshold, "product crossed its low-stock threshold"
                );
            }
            other => {
                info!(event = ?other, "event processed");
            }
        }
    }
    info!("Event channel closed; processor exiting");
}
