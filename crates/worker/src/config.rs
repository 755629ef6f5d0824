//! Notifier configuration loaded from environment variables.
//!
//! | Env Var                     | Required | Default         |
//! |-----------------------------|----------|-----------------|
//! | `PG_HOST`                   | no       | `localhost`     |
//! | `PG_PORT`                   | no       | `5432`          |
//! | `PG_DATABASE`               | yes      | --              |
//! | `PG_USER`                   | yes      | --              |
//! | `PG_PASSWORD`               | no       | empty           |
//! | `PG_SSL_MODE`               | no       | `prefer`        |
//! | `PG_CONNECT_TIMEOUT_SECS`   | no       | `10`            |
//! | `TEAMS_WEBHOOK_URL`         | per run  | --              |
//! | `TICKET_TYPE_IDS`           | yes      | --              |
//! | `TICKET_PROJECT_ID`         | yes      | --              |
//! | `TICKET_EXCLUDED_STATUS_ID` | yes      | --              |
//! | `SUPPORT_TYPE_FIELD_ID`     | no       | --              |
//! | `NOTIFY_CRON`               | no       | `0 10,17 * * *` |
//! | `NOTIFY_TIMEZONE`           | no       | `Asia/Kolkata`  |
//! | `RUN_ON_START`              | no       | `true`          |
//! | `DISPATCH_DELAY_MS`         | no       | `200`           |
//! | `WEBHOOK_TIMEOUT_MS`        | no       | `15000`         |
//!
//! A missing webhook URL is deliberately not a load error: the process
//! keeps its schedule and every run reports the gap.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::PgSslMode;
use ticketcast_core::error::CoreError;
use ticketcast_core::filter::TicketFilter;
use ticketcast_core::schedule::{CronSchedule, DEFAULT_CRON, DEFAULT_TIMEZONE};
use ticketcast_core::types::DbId;
use ticketcast_db::{DbSettings, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT};

/// Default pause after each successfully delivered card.
pub const DEFAULT_DISPATCH_DELAY: Duration = Duration::from_millis(200);

/// Default per-request webhook timeout.
pub const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_millis(15_000);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Everything the notifier needs for its lifetime.
#[derive(Clone)]
pub struct NotifierConfig {
    pub db: DbSettings,
    pub webhook_url: Option<String>,
    pub filter: TicketFilter,
    pub schedule: CronSchedule,
    pub run_on_start: bool,
    pub dispatch_delay: Duration,
    pub webhook_timeout: Duration,
}

impl NotifierConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its raw value. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let ssl_mode = match env.get("PG_SSL_MODE") {
            Some(raw) => PgSslMode::from_str(&raw).map_err(|e| ConfigError::Invalid {
                var: "PG_SSL_MODE",
                reason: e.to_string(),
            })?,
            None => PgSslMode::Prefer,
        };

        let db = DbSettings {
            host: env.get("PG_HOST").unwrap_or_else(|| "localhost".into()),
            port: env.parse("PG_PORT")?.unwrap_or(DEFAULT_PORT),
            database: env.require("PG_DATABASE")?,
            user: env.require("PG_USER")?,
            password: env.get("PG_PASSWORD").unwrap_or_default(),
            ssl_mode,
            connect_timeout: env
                .parse::<u64>("PG_CONNECT_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT),
        };

        let filter = TicketFilter {
            type_ids: parse_id_list("TICKET_TYPE_IDS", &env.require("TICKET_TYPE_IDS")?)?,
            project_id: env
                .parse("TICKET_PROJECT_ID")?
                .ok_or(ConfigError::Missing("TICKET_PROJECT_ID"))?,
            excluded_status_id: env
                .parse("TICKET_EXCLUDED_STATUS_ID")?
                .ok_or(ConfigError::Missing("TICKET_EXCLUDED_STATUS_ID"))?,
            support_type_field_id: env.parse("SUPPORT_TYPE_FIELD_ID")?,
        };
        filter.validate()?;

        let schedule = CronSchedule::parse(
            &env.get("NOTIFY_CRON").unwrap_or_else(|| DEFAULT_CRON.into()),
            &env.get("NOTIFY_TIMEZONE")
                .unwrap_or_else(|| DEFAULT_TIMEZONE.into()),
        )?;

        let run_on_start = match env.get("RUN_ON_START") {
            Some(raw) => parse_bool("RUN_ON_START", &raw)?,
            None => true,
        };

        let dispatch_delay = env
            .parse::<u64>("DISPATCH_DELAY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_DISPATCH_DELAY);

        let webhook_timeout = match env.parse::<u64>("WEBHOOK_TIMEOUT_MS")? {
            Some(0) => {
                return Err(ConfigError::Invalid {
                    var: "WEBHOOK_TIMEOUT_MS",
                    reason: "must be greater than zero".into(),
                })
            }
            Some(ms) => Duration::from_millis(ms),
            None => DEFAULT_WEBHOOK_TIMEOUT,
        };

        Ok(Self {
            db,
            webhook_url: env.get("TEAMS_WEBHOOK_URL"),
            filter,
            schedule,
            run_on_start,
            dispatch_delay,
            webhook_timeout,
        })
    }
}

impl fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Webhook URLs embed their credential; only report presence.
        f.debug_struct("NotifierConfig")
            .field("db", &self.db)
            .field("webhook_url", &self.webhook_url.as_ref().map(|_| "<set>"))
            .field("filter", &self.filter)
            .field("schedule", &self.schedule)
            .field("run_on_start", &self.run_on_start)
            .field("dispatch_delay", &self.dispatch_delay)
            .field("webhook_timeout", &self.webhook_timeout)
            .finish()
    }
}

/// Variable lookup with blank-as-unset semantics.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, var: &str) -> Option<String> {
        (self.0)(var)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn require(&self, var: &'static str) -> Result<String, ConfigError> {
        self.get(var).ok_or(ConfigError::Missing(var))
    }

    fn parse<T>(&self, var: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.get(var)
            .map(|raw| {
                raw.parse::<T>().map_err(|e| ConfigError::Invalid {
                    var,
                    reason: format!("'{raw}': {e}"),
                })
            })
            .transpose()
    }
}

fn parse_id_list(var: &'static str, raw: &str) -> Result<Vec<DbId>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<DbId>().map_err(|e| ConfigError::Invalid {
                var,
                reason: format!("'{s}': {e}"),
            })
        })
        .collect()
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            reason: format!("'{raw}' is not a boolean"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn required() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("PG_DATABASE", "openproject"),
            ("PG_USER", "reporter"),
            ("TICKET_TYPE_IDS", "13"),
            ("TICKET_PROJECT_ID", "3"),
            ("TICKET_EXCLUDED_STATUS_ID", "12"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<NotifierConfig, ConfigError> {
        NotifierConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_apply_when_optional_vars_unset() {
        let config = load(&required()).unwrap();

        assert_eq!(config.db.host, "localhost");
        assert_eq!(config.db.port, 5432);
        assert_eq!(config.db.password, "");
        assert!(matches!(config.db.ssl_mode, PgSslMode::Prefer));
        assert_eq!(config.db.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(config.webhook_url, None);
        assert_eq!(config.schedule.expression(), DEFAULT_CRON);
        assert_eq!(config.schedule.timezone().name(), DEFAULT_TIMEZONE);
        assert!(config.run_on_start);
        assert_eq!(config.dispatch_delay, Duration::from_millis(200));
        assert_eq!(config.webhook_timeout, Duration::from_secs(15));
        assert_eq!(config.filter.support_type_field_id, None);
    }

    #[test]
    fn overrides_are_parsed() {
        let mut vars = required();
        vars.extend([
            ("PG_HOST", "db.internal"),
            ("PG_PORT", "6543"),
            ("PG_PASSWORD", "secret"),
            ("PG_SSL_MODE", "require"),
            ("TEAMS_WEBHOOK_URL", "https://example.webhook.office.com/x"),
            ("TICKET_TYPE_IDS", "13, 14"),
            ("SUPPORT_TYPE_FIELD_ID", "7"),
            ("NOTIFY_CRON", "30 9 * * MON-FRI"),
            ("NOTIFY_TIMEZONE", "Europe/Berlin"),
            ("RUN_ON_START", "false"),
            ("DISPATCH_DELAY_MS", "0"),
            ("WEBHOOK_TIMEOUT_MS", "5000"),
        ]);
        let config = load(&vars).unwrap();

        assert_eq!(config.db.host, "db.internal");
        assert_eq!(config.db.port, 6543);
        assert!(matches!(config.db.ssl_mode, PgSslMode::Require));
        assert_eq!(
            config.webhook_url.as_deref(),
            Some("https://example.webhook.office.com/x")
        );
        assert_eq!(config.filter.type_ids, vec![13, 14]);
        assert_eq!(config.filter.support_type_field_id, Some(7));
        assert!(!config.run_on_start);
        assert_eq!(config.dispatch_delay, Duration::ZERO);
        assert_eq!(config.webhook_timeout, Duration::from_secs(5));
    }

    #[test]
    fn missing_required_var_is_reported_by_name() {
        let mut vars = required();
        vars.remove("PG_DATABASE");
        assert_matches!(load(&vars), Err(ConfigError::Missing("PG_DATABASE")));

        let mut vars = required();
        vars.remove("TICKET_PROJECT_ID");
        assert_matches!(load(&vars), Err(ConfigError::Missing("TICKET_PROJECT_ID")));
    }

    #[test]
    fn blank_webhook_url_counts_as_unset() {
        let mut vars = required();
        vars.insert("TEAMS_WEBHOOK_URL", "   ");
        assert_eq!(load(&vars).unwrap().webhook_url, None);
    }

    #[test]
    fn malformed_numbers_rejected() {
        let mut vars = required();
        vars.insert("PG_PORT", "postgres");
        assert_matches!(load(&vars), Err(ConfigError::Invalid { var: "PG_PORT", .. }));

        let mut vars = required();
        vars.insert("TICKET_TYPE_IDS", "13,abc");
        assert_matches!(
            load(&vars),
            Err(ConfigError::Invalid {
                var: "TICKET_TYPE_IDS",
                ..
            })
        );
    }

    #[test]
    fn empty_type_list_fails_validation() {
        let mut vars = required();
        vars.insert("TICKET_TYPE_IDS", " , ");
        assert_matches!(
            load(&vars),
            Err(ConfigError::Core(CoreError::Validation(_)))
        );
    }

    #[test]
    fn bad_schedule_rejected() {
        let mut vars = required();
        vars.insert("NOTIFY_TIMEZONE", "Nowhere/Special");
        assert_matches!(
            load(&vars),
            Err(ConfigError::Core(CoreError::UnknownTimezone(_)))
        );
    }

    #[test]
    fn unknown_ssl_mode_rejected() {
        let mut vars = required();
        vars.insert("PG_SSL_MODE", "sometimes");
        assert_matches!(load(&vars), Err(ConfigError::Invalid { var: "PG_SSL_MODE", .. }));
    }

    #[test]
    fn zero_webhook_timeout_rejected() {
        let mut vars = required();
        vars.insert("WEBHOOK_TIMEOUT_MS", "0");
        assert_matches!(
            load(&vars),
            Err(ConfigError::Invalid {
                var: "WEBHOOK_TIMEOUT_MS",
                ..
            })
        );
    }

    #[test]
    fn debug_hides_webhook_url() {
        let mut vars = required();
        vars.insert("TEAMS_WEBHOOK_URL", "https://example.webhook.office.com/token");
        let rendered = format!("{:?}", load(&vars).unwrap());
        assert!(!rendered.contains("token"));
        assert!(rendered.contains("<set>"));
    }

    #[test]
    fn boolean_spellings() {
        assert!(parse_bool("RUN_ON_START", "YES").unwrap());
        assert!(!parse_bool("RUN_ON_START", "0").unwrap());
        assert!(parse_bool("RUN_ON_START", "maybe").is_err());
    }
}
