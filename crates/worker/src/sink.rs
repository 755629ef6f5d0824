//! Where ticket cards go.

use async_trait::async_trait;
use ticketcast_events::{NotificationCard, WebhookDelivery, WebhookError};

/// Accepts one card per call. Implementations make a single attempt.
#[async_trait]
pub trait CardSink: Send + Sync {
    async fn send(&self, url: &str, card: &NotificationCard) -> Result<(), WebhookError>;
}

#[async_trait]
impl CardSink for WebhookDelivery {
    async fn send(&self, url: &str, card: &NotificationCard) -> Result<(), WebhookError> {
        self.post_card(url, card).await
    }
}
