//! Sendmail Worker Service
//!
//! Consumes email requests from a Redis stream and delivers them through the
//! configured provider.
//!
//! ## Architecture
//!
//! ```text
//! Redis Stream (sendmail)
//!   ↓ (Consumer Group: sendmail_workers)
//! StreamWorker<RedisStreamSource, SendmailProcessor>
//!   ↓ (validate, render, assemble)
//! Mailer
//!   ↓
//! DeliverySink (sendgrid | smtp)
//! ```
//!
//! ## Features
//!
//! - One delivery at a time, settled before the next read
//! - Internal failures requeued when `SENDMAIL_REQUEUE` is set
//! - Graceful shutdown on SIGINT/SIGTERM
//! - Prometheus endpoint when `SENDMAIL_METRICS_ADDR` is set

pub mod config;
pub mod connection;

use crate::config::WorkerSettings;
use crate::connection::{RetryConfig, connect_with_retry};
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::{Environment, FromEnv};
use domain_sendmail::{DeliverySinks, Mailer, SendmailProcessor, TemplateSources};
use eyre::{Result, WrapErr};
use stream_worker::{RedisStreamSource, StreamWorker, init_metrics};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

/// Run the sendmail worker
///
/// This is the main entry point for the worker. It:
/// 1. Loads settings and sets up structured logging
/// 2. Opens the template source and delivery sink
/// 3. Connects to Redis and joins the consumer group
/// 4. Processes deliveries until a shutdown signal arrives
///
/// # Errors
///
/// Returns an error if configuration is invalid, a backend cannot be opened,
/// Redis is unreachable, or the worker stops on a queue failure.
pub async fn run() -> Result<()> {
    install_color_eyre();

    let settings = WorkerSettings::from_env().wrap_err("Failed to load sendmail configuration")?;

    let environment = Environment::from_env();
    init_tracing(&environment, &settings.log_level);

    info!(
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        "Starting sendmail worker"
    );
    info!("Environment: {:?}", environment);

    if let Some(addr) = settings.metrics_addr {
        init_metrics(addr).wrap_err("Failed to start metrics exporter")?;
        info!(%addr, "Prometheus exporter listening");
    }

    let template_sources = TemplateSources::builtin();
    let templates = template_sources
        .open(&settings.templates)
        .wrap_err_with(|| format!("Failed to open templates at {}", settings.templates))?;

    let sinks = DeliverySinks::builtin();
    let sink = sinks
        .open(&settings.provider, &settings.sink_settings())
        .wrap_err("Failed to open delivery provider")?;

    info!(
        templates = templates.name(),
        template_protocols = ?template_sources.protocols(),
        provider = sink.name(),
        providers = ?sinks.providers(),
        requeue = settings.requeue,
        "Backends ready"
    );

    let redis = connect_with_retry(&settings.redis.uri, &RetryConfig::default())
        .await
        .wrap_err("Failed to connect to Redis")?;

    let worker_config = settings.worker_config();
    info!(
        stream = %worker_config.stream_name,
        consumer_group = %worker_config.consumer_group,
        consumer_id = %worker_config.consumer_id,
        block_timeout_ms = worker_config.block_timeout_ms,
        "Worker configuration loaded"
    );

    let source = RedisStreamSource::new(redis, worker_config);
    source
        .init_consumer_group()
        .await
        .wrap_err("Failed to create consumer group")?;

    let processor = SendmailProcessor::new(Mailer::new(templates, sink), settings.requeue);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if let Err(e) = shutdown_signal().await {
            error!("Error waiting for shutdown signal: {}", e);
        }
        let _ = shutdown_tx.send(true);
    });

    info!("Starting sendmail processor...");
    StreamWorker::new(source, processor)
        .run(shutdown_rx)
        .await
        .wrap_err("Sendmail worker stopped on a queue failure")?;

    info!("Sendmail worker stopped");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        },
    }

    Ok(())
}
