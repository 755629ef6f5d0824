//! Wall-clock trigger schedule.
//!
//! A [`CronSchedule`] pairs a cron expression with the IANA timezone it is
//! evaluated in, and answers "when is the next trigger after this instant".
//! Standard five-field expressions (`MIN HOUR DOM MON DOW`) are accepted and
//! pinned to second zero; six- and seven-field expressions with an explicit
//! seconds (and year) column are passed through unchanged.
//!
//! Day-of-week numbering follows the `cron` crate (`1` = Sunday); prefer the
//! named forms (`MON-FRI`) when restricting weekdays.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;

use crate::error::CoreError;

/// Twice daily, at 10:00 and 17:00.
pub const DEFAULT_CRON: &str = "0 10,17 * * *";

/// Zone the default expression is written for.
pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

/// A cron expression bound to a timezone.
#[derive(Clone)]
pub struct CronSchedule {
    expression: String,
    schedule: Schedule,
    timezone: Tz,
}

impl CronSchedule {
    /// Parse `expression` and resolve `timezone` (e.g. `Europe/Berlin`).
    pub fn parse(expression: &str, timezone: &str) -> Result<Self, CoreError> {
        let normalized = normalize_expression(expression)?;
        let schedule =
            Schedule::from_str(&normalized).map_err(|e| CoreError::InvalidSchedule {
                expression: expression.to_string(),
                reason: e.to_string(),
            })?;
        let timezone = timezone
            .trim()
            .parse::<Tz>()
            .map_err(|_| CoreError::UnknownTimezone(timezone.to_string()))?;

        Ok(Self {
            expression: expression.trim().to_string(),
            schedule,
            timezone,
        })
    }

    /// The expression as configured (before seconds normalization).
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// The first trigger strictly after `now`, in UTC.
    ///
    /// Returns `None` only for expressions with no future occurrence
    /// (e.g. a seven-field expression pinned to a past year).
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let local = now.with_timezone(&self.timezone);
        self.schedule
            .after(&local)
            .next()
            .map(|next| next.with_timezone(&Utc))
    }
}

impl fmt::Debug for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CronSchedule")
            .field("expression", &self.expression)
            .field("timezone", &self.timezone.name())
            .finish()
    }
}

/// Prepend a zero seconds column to five-field expressions.
fn normalize_expression(expression: &str) -> Result<String, CoreError> {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    match fields.len() {
        5 => Ok(format!("0 {}", fields.join(" "))),
        6 | 7 => Ok(fields.join(" ")),
        n => Err(CoreError::InvalidSchedule {
            expression: expression.to_string(),
            reason: format!("expected 5, 6 or 7 fields, got {n}"),
        }),
    }
}
