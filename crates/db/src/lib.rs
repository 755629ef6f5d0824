//! Database access for the ticket notifier.
//!
//! Runs are infrequent (a handful per day) and must not hold a connection
//! between them, so this crate hands out single [`PgConnection`]s rather
//! than a pool. Callers close the connection when the run is done.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgSslMode};
use sqlx::{Connection, PgConnection};

pub mod models;
pub mod repositories;

/// Default PostgreSQL port.
pub const DEFAULT_PORT: u16 = 5432;

/// Default time allowed for establishing a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection parameters for the ticket database.
#[derive(Clone)]
pub struct DbSettings {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub ssl_mode: PgSslMode,
    pub connect_timeout: Duration,
}

impl DbSettings {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
            .ssl_mode(self.ssl_mode)
    }
}

impl std::fmt::Debug for DbSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("ssl_mode", &self.ssl_mode)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Open a single connection, failing with an I/O timeout error if the server
/// does not answer within `settings.connect_timeout`.
pub async fn connect(settings: &DbSettings) -> Result<PgConnection, sqlx::Error> {
    let options = settings.connect_options();
    match tokio::time::timeout(settings.connect_timeout, PgConnection::connect_with(&options))
        .await
    {
        Ok(result) => result,
        Err(_) => Err(sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            format!(
                "connecting to {}:{} timed out after {}s",
                settings.host,
                settings.port,
                settings.connect_timeout.as_secs()
            ),
        ))),
    }
}
