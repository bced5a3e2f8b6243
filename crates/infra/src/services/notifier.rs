use thiserror::Error;

use printworks_orders::{Order, UserContact};

#[derive(Debug, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Receives every newly placed order (e.g. to send a confirmation email).
pub trait OrderNotifier: Send + Sync {
    fn order_placed(&self, order: &Order, contact: Option<&UserContact>) -> Result<(), NotifyError>;
}

/// Default notifier: writes the notification to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl OrderNotifier for TracingNotifier {
    fn order_placed(&self, order: &Order, contact: Option<&UserContact>) -> Result<(), NotifyError> {
        tracing::info!(
            order_id = %order.id,
            user_id = %order.user_id,
            recipient = contact.map(|c| c.email.as_str()).unwrap_or("<unknown>"),
            total = %order.total,
            status = ?order.status,
            "order confirmation"
        );
        Ok(())
    }
}
