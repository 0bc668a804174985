//! Stream error types
//!
//! Only transport failures live here. Whether a *delivery* is retried is
//! decided by the handler through a [`Disposition`](crate::Disposition), never
//! by inspecting these errors.

use thiserror::Error;

/// Stream transport errors
#[derive(Error, Debug)]
pub enum StreamError {
    /// Redis connection or command error
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// The in-process channel has no receiver or sender left
    #[error("Channel closed")]
    Closed,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StreamError {
    /// Check if the consumer group is missing (stream deleted or never created)
    pub fn is_nogroup_error(&self) -> bool {
        match self {
            StreamError::Redis(e) => e.to_string().contains("NOGROUP"),
            _ => false,
        }
    }

    /// Check if this is a connection-level failure worth backing off for
    pub fn is_connection_error(&self) -> bool {
        match self {
            StreamError::Redis(e) => {
                e.is_io_error()
                    || e.is_connection_dropped()
                    || e.is_connection_refusal()
                    || e.is_timeout()
            }
            _ => false,
        }
    }
}
