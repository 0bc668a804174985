//! Stream registry types and definitions.
//!
//! This module provides:
//! - `StreamDef` trait for domain-specific stream definitions
//! - `MessageKey` enum for the field names used inside stream entries

use strum::{AsRefStr, Display, EnumString};

/// Standard message keys used in stream entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Display, AsRefStr, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum MessageKey {
    /// Raw delivery body, exactly as published.
    Payload,
    /// Set on entries written back by a requeue.
    RequeuedFrom,
}

/// Stream definition trait.
///
/// Each domain implements this trait to define its default stream layout.
/// Deployment configuration may still override the names at startup.
///
/// # Example
///
/// ```rust,ignore
/// use stream_worker::StreamDef;
///
/// pub struct SendmailStream;
///
/// impl StreamDef for SendmailStream {
///     const STREAM_NAME: &'static str = "sendmail";
///     const CONSUMER_GROUP: &'static str = "sendmail_workers";
/// }
/// ```
pub trait StreamDef: Send + Sync {
    /// The Redis stream name (e.g., "sendmail").
    const STREAM_NAME: &'static str;

    /// The consumer group name for this stream.
    const CONSUMER_GROUP: &'static str;

    /// Maximum stream length before auto-trim (MAXLEN) when requeueing.
    /// Default: 100,000 entries.
    const MAX_LENGTH: i64 = 100_000;

    /// Blocking read window in milliseconds.
    const BLOCK_TIMEOUT_MS: u64 = 1_000;

    /// Get the stream name.
    fn stream_name() -> &'static str {
        Self::STREAM_NAME
    }

    /// Get the consumer group name.
    fn consumer_group() -> &'static str {
        Self::CONSUMER_GROUP
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_key() {
        assert_eq!(MessageKey::Payload.to_string(), "payload");
        assert_eq!(MessageKey::RequeuedFrom.as_ref(), "requeued_from");
    }

    #[test]
    fn test_message_key_parse() {
        let key: MessageKey = "payload".parse().unwrap();
        assert_eq!(key, MessageKey::Payload);
    }

    struct TestStream;
    impl StreamDef for TestStream {
        const STREAM_NAME: &'static str = "test:stream";
        const CONSUMER_GROUP: &'static str = "test_workers";
    }

    #[test]
    fn test_stream_def() {
        assert_eq!(TestStream::stream_name(), "test:stream");
        assert_eq!(TestStream::consumer_group(), "test_workers");
        assert_eq!(TestStream::MAX_LENGTH, 100_000);
        assert_eq!(TestStream::BLOCK_TIMEOUT_MS, 1_000);
    }
}
