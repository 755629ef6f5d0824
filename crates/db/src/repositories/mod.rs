//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept a `&mut PgConnection` as the first argument.

pub mod ticket_repo;

pub use ticket_repo::TicketRepo;
