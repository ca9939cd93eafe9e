use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::app_config::{AppConfig, LogLevel};
use crate::channel::parse_channel_list;
use crate::ConfigError;

const MIN_MESSAGES_LIMIT: u32 = 1;
const MAX_MESSAGES_LIMIT: u32 = 100;

// Unreserved URL characters stay readable; everything else in credentials is escaped.
const URL_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files; useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup, no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let api_id = require("TGC_API_ID")?
        .trim()
        .parse::<i32>()
        .map_err(|e| invalid("TGC_API_ID", e.to_string()))?;
    let api_hash = require("TGC_API_HASH")?;
    let api_base_url = or_default("TGC_API_BASE_URL", "http://127.0.0.1:8081/");
    let api_request_timeout_secs = parse_u64("TGC_API_REQUEST_TIMEOUT_SECS", "30")?;
    let api_max_concurrent_requests = parse_usize("TGC_API_MAX_CONCURRENT_REQUESTS", "4")?;
    if api_max_concurrent_requests == 0 {
        return Err(invalid(
            "TGC_API_MAX_CONCURRENT_REQUESTS",
            "must be at least 1".to_string(),
        ));
    }
    let session_name = or_default("TGC_SESSION_NAME", "collector");

    let channels = parse_channel_list("TGC_CHANNELS", &require("TGC_CHANNELS")?)?;

    let messages_limit = parse_u32("TGC_MESSAGES_LIMIT", "50")?;
    if !(MIN_MESSAGES_LIMIT..=MAX_MESSAGES_LIMIT).contains(&messages_limit) {
        return Err(invalid(
            "TGC_MESSAGES_LIMIT",
            format!(
                "{messages_limit} is outside {MIN_MESSAGES_LIMIT}..={MAX_MESSAGES_LIMIT}"
            ),
        ));
    }

    let collection_interval_minutes = parse_u64("TGC_COLLECTION_INTERVAL_MINUTES", "60")?;
    if collection_interval_minutes < 1 {
        return Err(invalid(
            "TGC_COLLECTION_INTERVAL_MINUTES",
            "must be at least 1 minute".to_string(),
        ));
    }
    let default_wait = collection_interval_minutes.saturating_mul(60).to_string();
    let max_rate_limit_wait_secs = parse_u64("TGC_MAX_RATE_LIMIT_WAIT_SECS", &default_wait)?;

    let log_level = parse_log_level(&or_default("TGC_LOG_LEVEL", "INFO"))?;

    let database_url = match lookup("DATABASE_URL").ok().filter(|v| !v.trim().is_empty()) {
        Some(url) => {
            if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
                return Err(invalid(
                    "DATABASE_URL",
                    "expected a postgres:// or postgresql:// URL".to_string(),
                ));
            }
            url
        }
        None => {
            let port = or_default("TGC_DB_PORT", "5432")
                .trim()
                .parse::<u16>()
                .map_err(|e| invalid("TGC_DB_PORT", e.to_string()))?;
            build_database_url(
                &or_default("TGC_DB_USER", "postgres"),
                &or_default("TGC_DB_PASSWORD", "postgres"),
                &or_default("TGC_DB_HOST", "localhost"),
                port,
                &or_default("TGC_DB_NAME", "telegram_collector"),
            )
        }
    };

    let db_max_connections = parse_u32("TGC_DB_MAX_CONNECTIONS", "20")?;
    let db_min_connections = parse_u32("TGC_DB_MIN_CONNECTIONS", "5")?;
    let db_acquire_timeout_secs = parse_u64("TGC_DB_ACQUIRE_TIMEOUT_SECS", "10")?;
    if db_max_connections == 0 {
        return Err(invalid(
            "TGC_DB_MAX_CONNECTIONS",
            "must be at least 1".to_string(),
        ));
    }
    if db_min_connections > db_max_connections {
        return Err(invalid(
            "TGC_DB_MIN_CONNECTIONS",
            format!(
                "min connections ({db_min_connections}) exceeds max connections ({db_max_connections})"
            ),
        ));
    }

    Ok(AppConfig {
        api_id,
        api_hash,
        api_base_url,
        api_request_timeout_secs,
        api_max_concurrent_requests,
        session_name,
        channels,
        messages_limit,
        collection_interval_minutes,
        max_rate_limit_wait_secs,
        log_level,
        database_url,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

/// Parse one of the fixed log level names (case-insensitive).
fn parse_log_level(s: &str) -> Result<LogLevel, ConfigError> {
    match s.trim().to_ascii_uppercase().as_str() {
        "DEBUG" => Ok(LogLevel::Debug),
        "INFO" => Ok(LogLevel::Info),
        "WARNING" => Ok(LogLevel::Warning),
        "ERROR" => Ok(LogLevel::Error),
        "CRITICAL" => Ok(LogLevel::Critical),
        other => Err(ConfigError::InvalidEnvVar {
            var: "TGC_LOG_LEVEL".to_string(),
            reason: format!(
                "unknown level '{other}', expected DEBUG, INFO, WARNING, ERROR or CRITICAL"
            ),
        }),
    }
}

/// Assemble a Postgres URL from its parts, percent-encoding the credentials
/// and database name.
fn build_database_url(user: &str, password: &str, host: &str, port: u16, name: &str) -> String {
    format!(
        "postgres://{}:{}@{host}:{port}/{}",
        utf8_percent_encode(user, URL_COMPONENT),
        utf8_percent_encode(password, URL_COMPONENT),
        utf8_percent_encode(name, URL_COMPONENT),
    )
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
