//! Ticket notification cards and their delivery.
//!
//! - [`NotificationCard`] — the Adaptive Card message rendered for one
//!   ticket.
//! - [`delivery`] — external delivery channels (webhook).

pub mod card;
pub mod delivery;

pub use card::NotificationCard;
pub use delivery::webhook::{WebhookDelivery, WebhookError};
