//! Configuration for the sendmail worker

use core_config::redis::RedisConfig;
use core_config::{env_bool, env_or_default, env_parse, env_required, ConfigError, FromEnv};
use domain_sendmail::{SendmailStream, SinkSettings};
use std::env;
use std::net::SocketAddr;
use stream_worker::{StreamDef, WorkerConfig};
use uuid::Uuid;

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Log verbosity used when `RUST_LOG` is unset
    pub log_level: String,

    /// Queue connection target
    pub redis: RedisConfig,

    /// Stream consumption
    pub stream: String,
    pub consumer_group: String,
    pub consumer_id: String,
    pub block_ms: u64,

    /// Requeue deliveries that failed for internal reasons
    pub requeue: bool,

    /// Template backend location, `<protocol>://<root>`
    pub templates: String,

    /// Delivery backend name and credentials
    pub provider: String,
    pub provider_url: String,
    pub provider_key: String,

    /// Prometheus listener, recorder-only when unset
    pub metrics_addr: Option<SocketAddr>,
}

impl WorkerSettings {
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig::new(&self.stream, &self.consumer_group)
            .with_consumer_id(&self.consumer_id)
            .with_block_timeout_ms(self.block_ms)
    }

    pub fn sink_settings(&self) -> SinkSettings {
        SinkSettings {
            url: self.provider_url.clone(),
            key: self.provider_key.clone(),
        }
    }
}

fn log_level() -> Result<String, ConfigError> {
    let level = env_or_default("SENDMAIL_LOG_LEVEL", "info").to_ascii_lowercase();
    if LOG_LEVELS.contains(&level.as_str()) {
        Ok(level)
    } else {
        Err(ConfigError::ParseError {
            key: "SENDMAIL_LOG_LEVEL".to_string(),
            details: format!("'{}' is not one of {:?}", level, LOG_LEVELS),
        })
    }
}

fn metrics_addr() -> Result<Option<SocketAddr>, ConfigError> {
    match env::var("SENDMAIL_METRICS_ADDR") {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: std::net::AddrParseError| ConfigError::ParseError {
                key: "SENDMAIL_METRICS_ADDR".to_string(),
                details: e.to_string(),
            }),
        _ => Ok(None),
    }
}

fn default_consumer_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("worker-{}", &id[..8])
}

impl FromEnv for WorkerSettings {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            log_level: log_level()?,
            redis: RedisConfig::from_env()?,
            stream: env_or_default("SENDMAIL_STREAM", SendmailStream::STREAM_NAME),
            consumer_group: env_or_default("SENDMAIL_CONSUMER_GROUP", SendmailStream::CONSUMER_GROUP),
            consumer_id: env::var("SENDMAIL_CONSUMER_ID").unwrap_or_else(|_| default_consumer_id()),
            block_ms: env_parse("SENDMAIL_BLOCK_MS", SendmailStream::BLOCK_TIMEOUT_MS)?,
            requeue: env_bool("SENDMAIL_REQUEUE", true)?,
            templates: env_required("SENDMAIL_TEMPLATES")?,
            provider: env_required("SENDMAIL_PROVIDER")?,
            provider_url: env_required("SENDMAIL_PROVIDER_URL")?,
            provider_key: env_required("SENDMAIL_PROVIDER_KEY")?,
            metrics_addr: metrics_addr()?,
        })
    }
}
