//! Cron-driven run trigger.
//!
//! Sleeps until the next trigger of a [`CronSchedule`], then starts a run on
//! its own task so a slow run never delays the timer. Overlap between runs
//! is resolved by the pipeline's run guard, not here.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ticketcast_core::schedule::CronSchedule;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::pipeline::{Pipeline, Trigger};

/// How long shutdown waits for an in-flight run to finish.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Run the scheduler loop until `cancel` is triggered, then wait (bounded by
/// [`DRAIN_TIMEOUT`]) for runs it started.
pub async fn run(pipeline: Arc<Pipeline>, schedule: CronSchedule, cancel: CancellationToken) {
    tracing::info!(
        expression = schedule.expression(),
        timezone = schedule.timezone().name(),
        "Scheduler started"
    );

    let tracker = TaskTracker::new();
    let mut last_fired: Option<DateTime<Utc>> = None;

    loop {
        let now = Utc::now();
        let Some(next) = next_trigger(&schedule, now, last_fired) else {
            tracing::warn!("Schedule has no upcoming trigger, stopping scheduler");
            break;
        };
        let wait = (next - now).to_std().unwrap_or_default();

        tracing::info!(
            next_run = %next.with_timezone(&schedule.timezone()),
            wait_secs = wait.as_secs(),
            "Waiting for next scheduled run"
        );

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Scheduler cancelled");
                break;
            }
            _ = tokio::time::sleep(wait) => {
                last_fired = Some(next);
                tracing::info!(at = %Utc::now().to_rfc3339(), "Running scheduled job");
                let pipeline = Arc::clone(&pipeline);
                tracker.spawn(async move {
                    pipeline.run(Trigger::Schedule).await;
                });
            }
        }
    }

    tracker.close();
    if tokio::time::timeout(DRAIN_TIMEOUT, tracker.wait()).await.is_err() {
        tracing::warn!(
            timeout_secs = DRAIN_TIMEOUT.as_secs(),
            "Scheduled run still in progress at shutdown"
        );
    }
}

/// Next trigger strictly after both `now` and the previous trigger.
///
/// The monotonic sleep can wake a hair before the wall clock reaches the
/// trigger; measuring from `last_fired` keeps that trigger from firing twice.
pub fn next_trigger(
    schedule: &CronSchedule,
    now: DateTime<Utc>,
    last_fired: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    let from = last_fired.map_or(now, |last| last.max(now));
    schedule.next_after(from)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn schedule() -> CronSchedule {
        CronSchedule::parse("0 10,17 * * *", "Asia/Kolkata").unwrap()
    }

    #[test]
    fn next_trigger_without_history() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 4, 0, 0).unwrap();
        assert_eq!(
            next_trigger(&schedule(), now, None),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 4, 30, 0).unwrap())
        );
    }

    /// Waking just before the trigger instant must not re-select it.
    #[test]
    fn early_wake_does_not_refire() {
        let fired = Utc.with_ymd_and_hms(2024, 3, 1, 4, 30, 0).unwrap();
        let early = fired - chrono::Duration::milliseconds(3);
        assert_eq!(
            next_trigger(&schedule(), early, Some(fired)),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 11, 30, 0).unwrap())
        );
    }
}
