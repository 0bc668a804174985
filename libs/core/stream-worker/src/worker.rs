//! Handler trait and the sequential StreamWorker loop.
//!
//! This module provides:
//! - `DeliveryHandler` trait for domain processors
//! - `StreamWorker` struct for running the worker loop

use crate::delivery::{Delivery, Disposition};
use crate::error::StreamError;
use crate::metrics::StreamMetrics;
use crate::source::DeliverySource;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Trait for delivery handlers.
///
/// Domain processors implement this trait. A handler never fails: every
/// outcome, including errors, is expressed as a [`Disposition`].
///
/// # Example
///
/// ```rust,ignore
/// use stream_worker::{Delivery, DeliveryHandler, Disposition};
///
/// struct Echo;
///
/// #[async_trait]
/// impl DeliveryHandler for Echo {
///     async fn handle(&self, delivery: &Delivery) -> Disposition {
///         println!("{}", String::from_utf8_lossy(&delivery.body));
///         Disposition::Ack
///     }
///
///     fn name(&self) -> &'static str {
///         "Echo"
///     }
/// }
/// ```
#[async_trait]
pub trait DeliveryHandler: Send + Sync {
    /// Process a single delivery to completion and decide its fate.
    async fn handle(&self, delivery: &Delivery) -> Disposition;

    /// Get the handler name for logging.
    fn name(&self) -> &'static str;
}

/// Sequential worker: one delivery is handled and settled before the next is
/// pulled, so deliveries are processed in the order the source yields them.
///
/// # Type Parameters
///
/// * `S` - The delivery source
/// * `H` - The handler deciding each delivery's disposition
pub struct StreamWorker<S, H>
where
    S: DeliverySource,
    H: DeliveryHandler,
{
    source: S,
    handler: H,
    metrics: StreamMetrics,
}

const MAX_BACKOFF_SECS: u64 = 30;

impl<S, H> StreamWorker<S, H>
where
    S: DeliverySource,
    H: DeliveryHandler,
{
    /// Create a new stream worker.
    pub fn new(source: S, handler: H) -> Self {
        let metrics = StreamMetrics::new(source.name(), handler.name());
        Self {
            source,
            handler,
            metrics,
        }
    }

    /// Run the worker loop.
    ///
    /// Stops when the source closes, when the shutdown flag turns `true`, or
    /// when the shutdown sender is dropped. Shutdown is only observed while
    /// waiting for a delivery, never in the middle of handling one.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), StreamError> {
        info!(
            source = %self.source.name(),
            handler = %self.handler.name(),
            "Starting stream worker"
        );

        // Track consecutive errors for exponential backoff
        let mut consecutive_errors: u32 = 0;

        loop {
            if *shutdown.borrow() {
                info!("Received shutdown signal, stopping worker");
                break;
            }

            let next = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Received shutdown signal, stopping worker");
                        break;
                    }
                    continue;
                }
                next = self.source.next_delivery() => next,
            };

            match next {
                Ok(Some(delivery)) => {
                    if consecutive_errors > 0 {
                        info!("Connection recovered after {} errors", consecutive_errors);
                        consecutive_errors = 0;
                    }
                    self.dispatch(delivery).await;
                }
                Ok(None) => {
                    info!(source = %self.source.name(), "Delivery source closed");
                    break;
                }
                Err(e) if e.is_connection_error() => {
                    consecutive_errors += 1;
                    let backoff_secs =
                        std::cmp::min(2u64.pow(consecutive_errors.min(5)), MAX_BACKOFF_SECS);
                    warn!(
                        error = %e,
                        consecutive_errors = %consecutive_errors,
                        backoff_secs = %backoff_secs,
                        "Source connection error, backing off"
                    );
                    tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                }
                Err(e) => {
                    error!(error = %e, "Delivery source failed");
                    return Err(e);
                }
            }
        }

        info!("Stream worker stopped");
        Ok(())
    }

    /// Handle one delivery and settle it with the source.
    async fn dispatch(&mut self, delivery: Delivery) {
        self.metrics.delivery_received();
        let start = Instant::now();

        let disposition = self.handler.handle(&delivery).await;

        // A failed settlement leaves the entry pending; it is picked up again
        // on the next startup.
        if let Err(e) = self.source.settle(&delivery, disposition).await {
            error!(
                delivery_id = %delivery.id,
                disposition = disposition.label(),
                error = %e,
                "Failed to settle delivery"
            );
            self.metrics.settle_failed();
            return;
        }

        self.metrics.delivery_settled(disposition, start.elapsed());
    }
}
