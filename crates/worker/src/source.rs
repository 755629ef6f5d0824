//! Where pending tickets come from.
//!
//! A run opens one [`TicketSession`], fetches once, and closes it. The
//! production source opens a dedicated PostgreSQL connection per session.

use async_trait::async_trait;
use sqlx::{Connection, PgConnection};
use ticketcast_core::filter::TicketFilter;
use ticketcast_db::models::ticket::TicketRecord;
use ticketcast_db::repositories::TicketRepo;
use ticketcast_db::DbSettings;

/// Opens sessions against the ticket store.
#[async_trait]
pub trait TicketSource: Send + Sync {
    async fn open(&self) -> Result<Box<dyn TicketSession>, sqlx::Error>;
}

/// One open connection to the ticket store.
///
/// `close` consumes the session, so it can be called at most once.
#[async_trait]
pub trait TicketSession: Send {
    async fn fetch(&mut self, filter: &TicketFilter) -> Result<Vec<TicketRecord>, sqlx::Error>;

    async fn close(self: Box<Self>) -> Result<(), sqlx::Error>;
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

/// Opens a fresh [`PgConnection`] for each session.
pub struct PgTicketSource {
    settings: DbSettings,
}

impl PgTicketSource {
    pub fn new(settings: DbSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl TicketSource for PgTicketSource {
    async fn open(&self) -> Result<Box<dyn TicketSession>, sqlx::Error> {
        tracing::debug!(
            host = %self.settings.host,
            port = self.settings.port,
            database = %self.settings.database,
            "Connecting to ticket database"
        );
        let conn = ticketcast_db::connect(&self.settings).await?;
        Ok(Box::new(PgTicketSession { conn }))
    }
}

struct PgTicketSession {
    conn: PgConnection,
}

#[async_trait]
impl TicketSession for PgTicketSession {
    async fn fetch(&mut self, filter: &TicketFilter) -> Result<Vec<TicketRecord>, sqlx::Error> {
        TicketRepo::list_open(&mut self.conn, filter).await
    }

    async fn close(self: Box<Self>) -> Result<(), sqlx::Error> {
        self.conn.close().await
    }
}
