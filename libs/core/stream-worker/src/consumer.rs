//! Redis Streams delivery source
//!
//! Reads one entry at a time through a consumer group. On startup the
//! consumer first drains its own pending entries (delivered before a crash but
//! never acknowledged), then switches to blocking reads of new entries.

use crate::config::WorkerConfig;
use crate::delivery::{Delivery, Disposition};
use crate::error::StreamError;
use crate::registry::MessageKey;
use crate::source::DeliverySource;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::streams::StreamReadReply;
use redis::RedisResult;
use tracing::{debug, info, warn};

/// Redis Streams consumer-group source
pub struct RedisStreamSource {
    redis: ConnectionManager,
    config: WorkerConfig,
    recovering: bool,
}

impl RedisStreamSource {
    /// Create a new RedisStreamSource
    pub fn new(redis: ConnectionManager, config: WorkerConfig) -> Self {
        Self {
            redis,
            config,
            recovering: true,
        }
    }

    /// Get the stream name
    pub fn stream_name(&self) -> &str {
        &self.config.stream_name
    }

    /// Get the consumer ID
    pub fn consumer_id(&self) -> &str {
        &self.config.consumer_id
    }

    /// Initialize the consumer group if it doesn't exist
    pub async fn init_consumer_group(&self) -> Result<(), StreamError> {
        let mut conn = self.redis.clone();

        // Try to create the group, ignore error if it already exists
        let result: RedisResult<()> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("0") // Start from beginning
            .arg("MKSTREAM") // Create stream if it doesn't exist
            .query_async(&mut conn)
            .await;

        match result {
            Ok(_) => {
                info!(
                    stream = %self.config.stream_name,
                    group = %self.config.consumer_group,
                    "Created consumer group"
                );
            }
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!(
                    stream = %self.config.stream_name,
                    group = %self.config.consumer_group,
                    "Consumer group already exists"
                );
            }
            Err(e) => return Err(StreamError::Redis(e)),
        }

        Ok(())
    }

    /// Read a single entry.
    ///
    /// `"0"` reads this consumer's pending entries, `">"` waits for new ones.
    async fn read_one(&self, id: &str) -> Result<Option<Delivery>, StreamError> {
        let mut conn = self.redis.clone();

        let mut cmd = redis::cmd("XREADGROUP");
        cmd.arg("GROUP")
            .arg(&self.config.consumer_group)
            .arg(&self.config.consumer_id)
            .arg("COUNT")
            .arg(1);

        if id == ">" {
            cmd.arg("BLOCK").arg(self.config.block_timeout_ms);
        }

        cmd.arg("STREAMS").arg(&self.config.stream_name).arg(id);

        let reply: Option<StreamReadReply> = cmd.query_async(&mut conn).await?;

        let entry = reply
            .into_iter()
            .flat_map(|reply| reply.keys)
            .flat_map(|key| key.ids)
            .next();

        Ok(entry.map(|entry| {
            // Entries trimmed away while pending come back without fields;
            // an empty body fails decoding downstream and is dropped there.
            let body: Vec<u8> = entry
                .get(MessageKey::Payload.as_ref())
                .unwrap_or_default();
            Delivery::new(entry.id, body)
        }))
    }

    /// Acknowledge a message
    async fn ack(&self, stream_id: &str) -> Result<(), StreamError> {
        let mut conn = self.redis.clone();

        let _: i64 = redis::cmd("XACK")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(stream_id)
            .query_async(&mut conn)
            .await?;

        debug!(stream_id = %stream_id, "Acknowledged message");
        Ok(())
    }

    /// Append the same body again so another read picks it up
    async fn requeue(&self, delivery: &Delivery) -> Result<(), StreamError> {
        let mut conn = self.redis.clone();

        let new_id: String = redis::cmd("XADD")
            .arg(&self.config.stream_name)
            .arg("MAXLEN")
            .arg("~")
            .arg(self.config.max_length)
            .arg("*")
            .arg(MessageKey::Payload.as_ref())
            .arg(delivery.body.as_slice())
            .arg(MessageKey::RequeuedFrom.as_ref())
            .arg(&delivery.id)
            .query_async(&mut conn)
            .await?;

        debug!(stream_id = %delivery.id, new_id = %new_id, "Requeued message");
        Ok(())
    }
}

#[async_trait]
impl DeliverySource for RedisStreamSource {
    async fn next_delivery(&mut self) -> Result<Option<Delivery>, StreamError> {
        loop {
            let cursor = if self.recovering { "0" } else { ">" };

            match self.read_one(cursor).await {
                Ok(Some(delivery)) if self.recovering => {
                    warn!(stream_id = %delivery.id, "Recovered pending message");
                    return Ok(Some(delivery.redelivered()));
                }
                Ok(Some(delivery)) => return Ok(Some(delivery)),
                Ok(None) if self.recovering => {
                    debug!("No pending messages left, switching to new messages");
                    self.recovering = false;
                }
                // Block window elapsed without traffic
                Ok(None) => continue,
                Err(e) if e.is_nogroup_error() => {
                    warn!("Consumer group missing, recreating...");
                    self.init_consumer_group().await?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn settle(
        &mut self,
        delivery: &Delivery,
        disposition: Disposition,
    ) -> Result<(), StreamError> {
        if disposition.requeues() {
            self.requeue(delivery).await?;
        }
        self.ack(&delivery.id).await
    }

    fn name(&self) -> &str {
        &self.config.stream_name
    }
}
