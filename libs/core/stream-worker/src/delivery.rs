//! Delivery wrapper and settlement decisions
//!
//! A [`Delivery`] is one unit of work pulled from a source, carrying the raw
//! body exactly as it was published plus broker metadata.

use chrono::{DateTime, Utc};

/// One message pulled from a delivery source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Broker-assigned ID (Redis stream entry ID, or a sequence for channels)
    pub id: String,

    /// Raw message body
    pub body: Vec<u8>,

    /// When the message entered the source (parsed from stream ID when possible)
    pub timestamp: DateTime<Utc>,

    /// Whether this consumer saw the message before (recovered after a crash)
    pub redelivered: bool,
}

impl Delivery {
    /// Create a new Delivery
    pub fn new(id: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        let id = id.into();
        let timestamp = Self::parse_timestamp(&id);
        Self {
            id,
            body: body.into(),
            timestamp,
            redelivered: false,
        }
    }

    /// Mark the delivery as recovered from the pending list
    pub fn redelivered(mut self) -> Self {
        self.redelivered = true;
        self
    }

    /// Parse timestamp from Redis stream ID
    ///
    /// Stream IDs are in format "timestamp_ms-sequence"
    fn parse_timestamp(stream_id: &str) -> DateTime<Utc> {
        stream_id
            .split('-')
            .next()
            .and_then(|ts| ts.parse::<i64>().ok())
            .and_then(DateTime::from_timestamp_millis)
            .unwrap_or_else(Utc::now)
    }

    /// Get age in milliseconds
    pub fn age_ms(&self) -> i64 {
        (Utc::now() - self.timestamp).num_milliseconds()
    }
}

/// What to do with a delivery once its handler is done
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Remove the message permanently.
    Ack,
    /// Give up on this attempt; `requeue` asks the source to deliver it again.
    Reject { requeue: bool },
}

impl Disposition {
    pub fn is_ack(&self) -> bool {
        matches!(self, Disposition::Ack)
    }

    pub fn requeues(&self) -> bool {
        matches!(self, Disposition::Reject { requeue: true })
    }

    /// Label used for metrics and logs
    pub fn label(&self) -> &'static str {
        match self {
            Disposition::Ack => "acked",
            Disposition::Reject { requeue: true } => "requeued",
            Disposition::Reject { requeue: false } => "dropped",
        }
    }
}
