use std::time::Duration;

use crate::channel::ChannelRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// The `tracing_subscriber::EnvFilter` directive for this level.
    ///
    /// `tracing` has no level above `error`, so `Critical` filters the same
    /// as `Error`; critical events are tagged with a `critical` field instead.
    #[must_use]
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARNING"),
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub api_id: i32,
    pub api_hash: String,
    pub api_base_url: String,
    pub api_request_timeout_secs: u64,
    pub api_max_concurrent_requests: usize,
    pub session_name: String,
    pub channels: Vec<ChannelRef>,
    pub messages_limit: u32,
    pub collection_interval_minutes: u64,
    pub max_rate_limit_wait_secs: u64,
    pub log_level: LogLevel,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl AppConfig {
    #[must_use]
    pub fn collection_interval(&self) -> Duration {
        Duration::from_secs(self.collection_interval_minutes.saturating_mul(60))
    }

    #[must_use]
    pub fn max_rate_limit_wait(&self) -> Duration {
        Duration::from_secs(self.max_rate_limit_wait_secs)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_id", &self.api_id)
            .field("api_hash", &"[redacted]")
            .field("api_base_url", &self.api_base_url)
            .field("api_request_timeout_secs", &self.api_request_timeout_secs)
            .field(
                "api_max_concurrent_requests",
                &self.api_max_concurrent_requests,
            )
            .field("session_name", &self.session_name)
            .field("channels", &self.channels)
            .field("messages_limit", &self.messages_limit)
            .field(
                "collection_interval_minutes",
                &self.collection_interval_minutes,
            )
            .field("max_rate_limit_wait_secs", &self.max_rate_limit_wait_secs)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
