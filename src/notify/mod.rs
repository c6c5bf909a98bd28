//! Notification seam
//!
//! After a transfer commits and its ledger record is written, the engine
//! emits a `money_received` event for the recipient. Delivery transport and
//! sender display-name enrichment belong to the push collaborator behind
//! [`Notifier`]; a failed emission never affects the committed transfer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Event emitted to the recipient after a completed transfer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyReceived {
    #[serde(rename = "type")]
    pub event_type: &'static str,
    pub amount: Decimal,
    pub sender_id: Uuid,
    /// Filled in by the delivery adapter; the user entity lives elsewhere.
    pub sender_name: Option<String>,
    pub recipient_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub transaction_id: Uuid,
}

impl MoneyReceived {
    pub fn new(amount: Decimal, sender_id: Uuid, recipient_id: Uuid, transaction_id: Uuid) -> Self {
        Self {
            event_type: "money_received",
            amount,
            sender_id,
            sender_name: None,
            recipient_id,
            timestamp: Utc::now(),
            transaction_id,
        }
    }
}

/// Notification errors
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Delivery collaborator for recipient notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn money_received(&self, event: MoneyReceived) -> Result<(), NotifyError>;
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for std::sync::Arc<T> {
    async fn money_received(&self, event: MoneyReceived) -> Result<(), NotifyError> {
        (**self).money_received(event).await
    }
}

/// Notifier that records events in the log. Stands in for a real push
/// transport in development and tests.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn money_received(&self, event: MoneyReceived) -> Result<(), NotifyError> {
        tracing::info!(
            recipient_id = %event.recipient_id,
            sender_id = %event.sender_id,
            amount = %event.amount,
            transaction_id = %event.transaction_id,
            "money_received notification"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_event_wire_shape() {
        let sender = Uuid::new_v4();
        let recipient = Uuid::new_v4();
        let txn = Uuid::new_v4();
        let event = MoneyReceived::new(dec!(3.00), sender, recipient, txn);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "money_received");
        assert_eq!(json["senderId"], sender.to_string());
        assert_eq!(json["transactionId"], txn.to_string());
        assert!(json.get("timestamp").is_some());
    }
}
