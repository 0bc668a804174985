//! In-process delivery source backed by tokio channels.
//!
//! Useful for embedding the worker without a broker and for tests: the
//! [`ChannelHandle`] publishes bodies and observes every settlement.
//! Requeued deliveries are reported, not redelivered.

use crate::delivery::{Delivery, Disposition};
use crate::error::StreamError;
use crate::source::DeliverySource;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

/// Settlement observed on a channel source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub delivery_id: String,
    pub disposition: Disposition,
}

/// Receiving side, driven by the worker
pub struct ChannelSource {
    name: String,
    deliveries: mpsc::UnboundedReceiver<Delivery>,
    settlements: mpsc::UnboundedSender<Settlement>,
}

/// Publishing side, held by the producer or the test
pub struct ChannelHandle {
    deliveries: Option<mpsc::UnboundedSender<Delivery>>,
    settlements: mpsc::UnboundedReceiver<Settlement>,
    next_seq: u64,
}

/// Create a connected source/handle pair.
pub fn channel(name: impl Into<String>) -> (ChannelSource, ChannelHandle) {
    let (delivery_tx, delivery_rx) = mpsc::unbounded_channel();
    let (settlement_tx, settlement_rx) = mpsc::unbounded_channel();

    (
        ChannelSource {
            name: name.into(),
            deliveries: delivery_rx,
            settlements: settlement_tx,
        },
        ChannelHandle {
            deliveries: Some(delivery_tx),
            settlements: settlement_rx,
            next_seq: 0,
        },
    )
}

impl ChannelHandle {
    /// Publish a raw body, returning the delivery ID assigned to it.
    pub fn publish(&mut self, body: impl Into<Vec<u8>>) -> Result<String, StreamError> {
        let Some(sender) = self.deliveries.as_ref() else {
            return Err(StreamError::Closed);
        };
        let id = format!("channel-{}", self.next_seq + 1);

        sender
            .send(Delivery::new(id.clone(), body))
            .map_err(|_| StreamError::Closed)?;
        self.next_seq += 1;
        Ok(id)
    }

    /// Stop publishing. The source drains what was already sent, then closes.
    pub fn close(&mut self) {
        self.deliveries = None;
    }

    /// Wait for the next settlement reported by the source.
    pub async fn next_settlement(&mut self) -> Option<Settlement> {
        self.settlements.recv().await
    }
}

#[async_trait]
impl DeliverySource for ChannelSource {
    async fn next_delivery(&mut self) -> Result<Option<Delivery>, StreamError> {
        Ok(self.deliveries.recv().await)
    }

    async fn settle(
        &mut self,
        delivery: &Delivery,
        disposition: Disposition,
    ) -> Result<(), StreamError> {
        debug!(delivery_id = %delivery.id, disposition = disposition.label(), "Settled delivery");

        // A dropped handle just means nobody is watching any more.
        let _ = self.settlements.send(Settlement {
            delivery_id: delivery.id.clone(),
            disposition,
        });
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
