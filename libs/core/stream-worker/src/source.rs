//! Delivery source abstraction
//!
//! A source hands out one delivery at a time and later receives the
//! settlement decision for it. Implementations:
//! - [`RedisStreamSource`](crate::RedisStreamSource): Redis Streams consumer group
//! - [`ChannelSource`](crate::ChannelSource): in-process tokio channel

use crate::delivery::{Delivery, Disposition};
use crate::error::StreamError;
use async_trait::async_trait;

#[async_trait]
pub trait DeliverySource: Send {
    /// Wait for the next delivery.
    ///
    /// Returns `Ok(None)` once the source is closed and no more deliveries
    /// will arrive.
    async fn next_delivery(&mut self) -> Result<Option<Delivery>, StreamError>;

    /// Apply the handler's decision to a delivery previously returned by
    /// [`next_delivery`](Self::next_delivery).
    async fn settle(
        &mut self,
        delivery: &Delivery,
        disposition: Disposition,
    ) -> Result<(), StreamError>;

    /// Source name for logging and metrics.
    fn name(&self) -> &str;
}
