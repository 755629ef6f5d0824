//! `ticketcast-worker` -- pending support ticket notifier.
//!
//! Queries the ticket database for open support tickets and posts one
//! Adaptive Card per ticket to a Teams incoming webhook, on a cron
//! schedule and (optionally) once at startup. See [`config`] for the
//! environment variables it reads.
//!
//! [`config`]: ticketcast_worker::config

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ticketcast_events::WebhookDelivery;
use ticketcast_worker::config::NotifierConfig;
use ticketcast_worker::pipeline::{Pipeline, PipelineSettings, Trigger};
use ticketcast_worker::scheduler;
use ticketcast_worker::source::PgTicketSource;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "ticketcast_worker=info,ticketcast_events=info,ticketcast_db=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = NotifierConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    tracing::info!(
        host = %config.db.host,
        port = config.db.port,
        database = %config.db.database,
        webhook_configured = config.webhook_url.is_some(),
        variant = ?config.filter.variant(),
        schedule = config.schedule.expression(),
        timezone = config.schedule.timezone().name(),
        run_on_start = config.run_on_start,
        "Loaded notifier configuration"
    );

    if config.webhook_url.is_none() {
        tracing::warn!("TEAMS_WEBHOOK_URL is not set; every run will fail until it is configured");
    }

    // --- Pipeline ---
    let delivery = WebhookDelivery::new(config.webhook_timeout).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build HTTP client");
        std::process::exit(1);
    });

    let pipeline = Arc::new(Pipeline::new(
        Arc::new(PgTicketSource::new(config.db.clone())),
        Arc::new(delivery),
        PipelineSettings {
            webhook_url: config.webhook_url.clone(),
            filter: config.filter.clone(),
            dispatch_delay: config.dispatch_delay,
        },
    ));

    // --- Startup run ---
    let startup_handle = config.run_on_start.then(|| {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            pipeline.run(Trigger::Startup).await;
        })
    });

    // --- Scheduler ---
    let cancel = CancellationToken::new();
    let scheduler_handle = tokio::spawn(scheduler::run(
        Arc::clone(&pipeline),
        config.schedule.clone(),
        cancel.clone(),
    ));

    shutdown_signal().await;

    cancel.cancel();
    if let Err(e) = scheduler_handle.await {
        tracing::error!(error = %e, "Scheduler task failed");
    }

    if let Some(handle) = startup_handle {
        if tokio::time::timeout(Duration::from_secs(30), handle).await.is_err() {
            tracing::warn!("Startup run still in progress at shutdown");
        }
    }

    tracing::info!("Shutdown complete");
}

/// Wait for a termination signal.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the notifier
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
