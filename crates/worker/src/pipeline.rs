//! The fetch → format → dispatch run.
//!
//! [`Pipeline::run`] is the only entry point. It never returns an error:
//! configuration and database failures end the run early, a failed card
//! is logged and skipped, and the caller gets a [`RunOutcome`] summary.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ticketcast_core::filter::TicketFilter;
use ticketcast_core::run_guard::RunGuard;
use ticketcast_db::models::ticket::TicketRecord;
use ticketcast_events::NotificationCard;
use tracing::Instrument;

use crate::sink::CardSink;
use crate::source::TicketSource;

/// Why a run ended before dispatching anything.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("TEAMS_WEBHOOK_URL is not configured")]
    MissingWebhookUrl,

    #[error("Ticket query failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Another run held the guard; nothing was done.
    Skipped,
    /// Configuration or database failure; no card was sent.
    Aborted(RunError),
    /// The query matched no tickets.
    Empty,
    /// Every ticket was attempted exactly once.
    Completed { sent: usize, failed: usize },
}

/// What started a run. Recorded on the run's tracing span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Startup,
    Schedule,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Startup => f.write_str("startup"),
            Self::Schedule => f.write_str("schedule"),
        }
    }
}

/// Per-process run parameters.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub webhook_url: Option<String>,
    pub filter: TicketFilter,
    /// Pause after each delivered card before the next one.
    pub dispatch_delay: Duration,
}

pub struct Pipeline {
    source: Arc<dyn TicketSource>,
    sink: Arc<dyn CardSink>,
    settings: PipelineSettings,
    guard: RunGuard,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn TicketSource>,
        sink: Arc<dyn CardSink>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            source,
            sink,
            settings,
            guard: RunGuard::new(),
        }
    }

    /// Whether a run is currently in flight.
    pub fn is_running(&self) -> bool {
        self.guard.is_running()
    }

    /// Execute one run. Overlapping calls return [`RunOutcome::Skipped`].
    pub async fn run(&self, trigger: Trigger) -> RunOutcome {
        let span = tracing::info_span!("run", %trigger);
        async {
            let outcome = self.run_guarded().await;
            match &outcome {
                RunOutcome::Completed { sent, failed } => {
                    tracing::info!(sent, failed, "Run finished");
                }
                RunOutcome::Empty => tracing::info!("Run finished, no tickets"),
                RunOutcome::Aborted(_) | RunOutcome::Skipped => {}
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn run_guarded(&self) -> RunOutcome {
        let Some(_permit) = self.guard.try_acquire() else {
            tracing::warn!("Previous run still in progress, skipping this trigger");
            return RunOutcome::Skipped;
        };

        let Some(url) = self.settings.webhook_url.as_deref() else {
            let err = RunError::MissingWebhookUrl;
            tracing::error!(error = %err, "Configuration error, aborting run");
            return RunOutcome::Aborted(err);
        };

        let tickets = match self.fetch().await {
            Ok(tickets) => tickets,
            Err(e) => {
                let err = RunError::from(e);
                tracing::error!(error = %err, "Failed to fetch tickets, aborting run");
                return RunOutcome::Aborted(err);
            }
        };

        if tickets.is_empty() {
            tracing::info!("No open tickets found, nothing to send");
            return RunOutcome::Empty;
        }

        tracing::info!(count = tickets.len(), "Dispatching ticket cards");
        self.dispatch(url, &tickets).await
    }

    /// Open a session, query, and close the session on both query outcomes.
    async fn fetch(&self) -> Result<Vec<TicketRecord>, sqlx::Error> {
        let mut session = self.source.open().await?;
        let result = session.fetch(&self.settings.filter).await;
        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "Failed to close database connection cleanly");
        }
        result
    }

    /// Send one card per ticket, in order, continuing past failures.
    async fn dispatch(&self, url: &str, tickets: &[TicketRecord]) -> RunOutcome {
        let variant = self.settings.filter.variant();
        let mut sent = 0;
        let mut failed = 0;

        for (idx, ticket) in tickets.iter().enumerate() {
            let card = NotificationCard::for_ticket(ticket, &variant);
            match self.sink.send(url, &card).await {
                Ok(()) => {
                    sent += 1;
                    tracing::info!(ticket_id = ticket.id, "Sent ticket to webhook");
                    let has_next = idx + 1 < tickets.len();
                    if has_next && !self.settings.dispatch_delay.is_zero() {
                        tokio::time::sleep(self.settings.dispatch_delay).await;
                    }
                }
                Err(e) => {
                    failed += 1;
                    tracing::error!(ticket_id = ticket.id, error = %e, "Failed posting ticket");
                }
            }
        }

        RunOutcome::Completed { sent, failed }
    }
}
