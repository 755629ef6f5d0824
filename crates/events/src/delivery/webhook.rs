//! Webhook delivery of ticket cards.
//!
//! [`WebhookDelivery`] sends a JSON-encoded [`NotificationCard`] to an
//! incoming-webhook URL via HTTP POST. Each card gets exactly one attempt;
//! failures are reported to the caller, which decides whether to move on.

use std::time::Duration;

use crate::card::NotificationCard;

/// Default HTTP request timeout for a single delivery.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Longest response body kept in [`WebhookError::HttpStatus`].
const MAX_ERROR_BODY_CHARS: usize = 512;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for webhook delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {status}: {body}")]
    HttpStatus {
        status: u16,
        /// Response body (truncated), usually the receiver's reason.
        body: String,
    },
}

// ---------------------------------------------------------------------------
// WebhookDelivery
// ---------------------------------------------------------------------------

/// Delivers ticket cards to an incoming-webhook endpoint.
#[derive(Debug, Clone)]
pub struct WebhookDelivery {
    client: reqwest::Client,
}

impl WebhookDelivery {
    /// Create a delivery service whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// POST `card` to `url`. Any 2xx response is success.
    pub async fn post_card(&self, url: &str, card: &NotificationCard) -> Result<(), WebhookError> {
        let response = self.client.post(url).json(card).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(WebhookError::HttpStatus {
            status: status.as_u16(),
            body: truncate(body.trim(), MAX_ERROR_BODY_CHARS),
        })
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
