pub mod app_config;
pub mod channel;
pub mod config;
pub mod types;

use thiserror::Error;

pub use app_config::{AppConfig, LogLevel};
pub use channel::{parse_channel_list, ChannelRef, ChannelRefKind};
pub use config::{load_app_config, load_app_config_from_env};
pub use types::{ChannelOutcome, CycleSummary, FetchedItem, ResolvedChannel, SaveOutcome};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("invalid channel reference \"{reference}\": {reason}")]
    InvalidChannel { reference: String, reason: String },
}
