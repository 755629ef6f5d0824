//! External delivery channels for ticket notifications.

pub mod webhook;
