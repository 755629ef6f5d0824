//! Shared building blocks for the ticket notifier.
//!
//! Everything in this crate is free of I/O: domain identifiers, the
//! ticket filter that parameterizes the database query, cron schedule
//! evaluation, and the single-run guard used by the scheduler.

pub mod error;
pub mod filter;
pub mod run_guard;
pub mod schedule;
pub mod types;
