//! Stream Worker Framework
//!
//! Sequential queue consumption with explicit ack/requeue settlement.
//!
//! ## Features
//!
//! - **Sequential worker**: `StreamWorker<S, H>` handles one delivery at a time
//! - **Pluggable sources**: Redis Streams consumer groups, or in-process channels
//! - **Crash recovery**: pending Redis entries are redelivered on startup
//! - **Prometheus metrics**: Built-in observability
//!
//! ## Example
//!
//! ```ignore
//! use stream_worker::{RedisStreamSource, StreamWorker, WorkerConfig};
//!
//! let config = WorkerConfig::from_stream_def::<MyStream>();
//! let source = RedisStreamSource::new(redis, config);
//! source.init_consumer_group().await?;
//!
//! let worker = StreamWorker::new(source, handler);
//! worker.run(shutdown_rx).await?;
//! ```

mod channel;
mod config;
mod consumer;
mod delivery;
mod error;
pub mod metrics;
mod registry;
mod source;
mod worker;

// Re-export main types
pub use channel::{channel, ChannelHandle, ChannelSource, Settlement};
pub use config::WorkerConfig;
pub use consumer::RedisStreamSource;
pub use delivery::{Delivery, Disposition};
pub use error::StreamError;
pub use metrics::{init_metrics, StreamMetrics};
pub use registry::{MessageKey, StreamDef};
pub use source::DeliverySource;
pub use worker::{DeliveryHandler, StreamWorker};
