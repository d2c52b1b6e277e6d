use async_trait::async_trait;
use std::sync::Mutex;
use tracing::warn;

/// Capability for delivering plain-text subject/body alerts to
/// administrators. Injected into the services that emit alerts so tests can
/// substitute a recording stub.
#[async_trait]
pub trait AdminNotifier: Send + Sync {
    async fn notify_admins(&self, subject: &str, body: &str);
}

/// Builds the alert sent for every recorded sale.
pub fn sale_recorded_message(product: &str, quantity: i32, remaining: i32) -> (String, String) {
    (
        format!("New Sale: {}", product),
        format!(
            "A sale of {} units for {} was recorded. Remaining stock: {}.",
            quantity, product, remaining
        ),
    )
}

/// Builds the alert sent when a sale leaves a product at or below its
/// low-stock threshold.
pub fn low_stock_message(product: &str, remaining: i32) -> (String, String) {
    (
        format!("Low Stock Alert: {}", product),
        format!("{} is low on stock: {} left.", product, remaining),
    )
}

/// Production notifier: surfaces alerts in the service log, addressed to the
/// configured admin mailbox. A real mail transport slots in behind the same
/// trait.
pub struct LogNotifier {
    admin_email: String,
}

impl LogNotifier {
    pub fn new(admin_email: impl Into<String>) -> Self {
        Self {
            admin_email: admin_email.into(),
        }
    }
}

#[async_trait]
impl AdminNotifier for LogNotifier {
    async fn notify_admins(&self, subject: &str, body: &str) {
        warn!(to = %self.admin_email, subject, "{}", body);
    }
}

/// Records every notification instead of delivering it; used by tests to
/// assert on notification side effects.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All (subject, body) pairs recorded so far, in delivery order.
    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn subjects(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .map(|(subject, _)| subject)
            .collect()
    }

    pub fn clear(&self) {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

#[async_trait]
impl AdminNotifier for RecordingNotifier {
    async fn notify_admins(&self, subject: &str, body: &str) {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((subject.to_string(), body.to_string()));
    }
}
