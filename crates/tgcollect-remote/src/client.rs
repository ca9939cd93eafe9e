//! HTTP client for the messaging API gateway.
//!
//! Wraps `reqwest` with gateway-specific credential headers, envelope
//! unwrapping, and failure classification. All in-flight calls share one
//! semaphore so the session is never hit by more than
//! `max_concurrent_requests` requests at a time.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::{DeserializeOwned, IgnoredAny};
use tgcollect_core::{AppConfig, ChannelRef, FetchedItem, ResolvedChannel};
use tokio::sync::Semaphore;

use crate::error::{BuildError, RemoteError};
use crate::types::{ApiEnvelope, RemoteMessage};

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;
const MAX_FETCH_LIMIT: u32 = 100;

const HEADER_API_ID: &str = "x-api-id";
const HEADER_API_HASH: &str = "x-api-hash";
const HEADER_SESSION: &str = "x-session";

/// Credentials and limits for a [`RemoteClient`].
#[derive(Clone)]
pub struct ClientOptions {
    pub api_id: i32,
    pub api_hash: String,
    pub session_name: String,
    pub request_timeout_secs: u64,
    pub max_concurrent_requests: usize,
}

impl ClientOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            api_id: config.api_id,
            api_hash: config.api_hash.clone(),
            session_name: config.session_name.clone(),
            request_timeout_secs: config.api_request_timeout_secs,
            max_concurrent_requests: config.api_max_concurrent_requests,
        }
    }
}

/// Which gateway call a failure came from. Status codes mean different
/// things for resolution than for an already-resolved channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Resolve,
    FetchMessages,
    CreateSession,
}

impl Operation {
    fn as_str(self) -> &'static str {
        match self {
            Operation::Resolve => "resolve",
            Operation::FetchMessages => "fetch_messages",
            Operation::CreateSession => "create_session",
        }
    }
}

/// Client for the messaging API gateway.
///
/// Cheap to clone; clones share the connection pool and the request limiter.
/// Use [`RemoteClient::from_app_config`] in production or
/// [`RemoteClient::with_base_url`] to point at a mock server in tests.
#[derive(Clone)]
pub struct RemoteClient {
    client: Client,
    base_url: Url,
    options: Arc<ClientOptions>,
    permits: Arc<Semaphore>,
}

impl RemoteClient {
    /// Creates a client from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if the HTTP client cannot be constructed or the
    /// configured base URL is invalid.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, BuildError> {
        Self::with_base_url(ClientOptions::from_app_config(config), &config.api_base_url)
    }

    /// Creates a client with an explicit base URL.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`BuildError::InvalidBaseUrl`] if `base_url` does
    /// not parse.
    pub fn with_base_url(options: ClientOptions, base_url: &str) -> Result<Self, BuildError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("tgcollect/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // Exactly one trailing slash so relative joins append to the base path.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| BuildError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        let permits = Arc::new(Semaphore::new(options.max_concurrent_requests.max(1)));

        Ok(Self {
            client,
            base_url: parsed,
            options: Arc::new(options),
            permits,
        })
    }

    #[must_use]
    pub fn session_name(&self) -> &str {
        &self.options.session_name
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// Resolves a channel reference to its numeric identity.
    ///
    /// # Errors
    ///
    /// - [`RemoteError::InvalidReference`] if the gateway does not know the reference.
    /// - [`RemoteError::AccessDenied`] if the channel is private or the session was banned.
    /// - [`RemoteError::RateLimited`] if the gateway asks us to back off.
    /// - [`RemoteError::Transient`] on network failure, 5xx, or a malformed body.
    pub async fn resolve(&self, reference: &ChannelRef) -> Result<ResolvedChannel, RemoteError> {
        let url = self.build_url("channels/resolve", &[("ref", reference.as_str())])?;
        let request = self.client.get(url);
        self.send(request, Operation::Resolve, reference.as_str())
            .await
    }

    /// Fetches up to `limit` most-recent messages from `channel`, newest first.
    ///
    /// `limit` is clamped to `1..=100`, and the result never holds more than
    /// `limit` items even if the gateway returns extra. Messages with an
    /// unrepresentable timestamp are skipped with a warning.
    ///
    /// # Errors
    ///
    /// - [`RemoteError::AccessDenied`] if the channel can no longer be read.
    /// - [`RemoteError::RateLimited`] if the gateway asks us to back off.
    /// - [`RemoteError::Transient`] on network failure, 5xx, or a malformed body.
    pub async fn fetch_recent(
        &self,
        channel: &ResolvedChannel,
        limit: u32,
    ) -> Result<Vec<FetchedItem>, RemoteError> {
        let limit = limit.clamp(1, MAX_FETCH_LIMIT);
        let path = format!("channels/{}/messages", channel.id);
        let url = self.build_url(&path, &[("limit", &limit.to_string())])?;
        let request = self.client.get(url);

        let messages: Vec<RemoteMessage> = self
            .send(request, Operation::FetchMessages, &channel.id.to_string())
            .await?;

        let items = messages
            .into_iter()
            .take(limit as usize)
            .filter_map(|message| {
                let message_id = message.id;
                let item = message.into_item(channel.id);
                if item.is_none() {
                    tracing::warn!(
                        channel_id = channel.id,
                        message_id,
                        "fetch_recent: skipping message with out-of-range date"
                    );
                }
                item
            })
            .collect();

        Ok(items)
    }

    /// Builds a request URL under the base URL with percent-encoded query
    /// parameters.
    pub(crate) fn build_url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, RemoteError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| RemoteError::Transient(format!("invalid request path '{path}': {e}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Attaches credentials, sends under a concurrency permit, and unwraps the
    /// response envelope.
    ///
    /// `subject` names what the call was about (a reference, a channel id, a
    /// session) and is carried into error values.
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: Operation,
        subject: &str,
    ) -> Result<T, RemoteError> {
        let request = request
            .header(HEADER_API_ID, self.options.api_id.to_string())
            .header(HEADER_API_HASH, &self.options.api_hash)
            .header(HEADER_SESSION, &self.options.session_name);

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| RemoteError::Transient("request limiter closed".to_string()))?;

        tracing::debug!(operation = operation.as_str(), subject, "gateway request");

        let response = request.send().await.map_err(|e| {
            RemoteError::Transient(format!("{} {subject}: {e}", operation.as_str()))
        })?;

        let status = response.status();
        let header_retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());

        let body = response.text().await.map_err(|e| {
            RemoteError::Transient(format!(
                "{} {subject}: reading body: {e}",
                operation.as_str()
            ))
        })?;

        if status.is_success() {
            let envelope: ApiEnvelope<T> = serde_json::from_str(&body).map_err(|e| {
                RemoteError::Transient(format!(
                    "{} {subject}: malformed response: {e}",
                    operation.as_str()
                ))
            })?;
            if envelope.ok {
                return envelope.result.ok_or_else(|| {
                    RemoteError::Transient(format!(
                        "{} {subject}: response has no result",
                        operation.as_str()
                    ))
                });
            }
            let code = envelope.error_code.unwrap_or(status.as_u16());
            let retry_after = envelope.retry_after().or(header_retry_after);
            return Err(classify_failure(
                operation,
                subject,
                code,
                envelope.description.unwrap_or_default(),
                retry_after,
            ));
        }

        // Error bodies are best-effort; a proxy may answer with HTML.
        let envelope = serde_json::from_str::<ApiEnvelope<IgnoredAny>>(&body).ok();
        let retry_after = envelope
            .as_ref()
            .and_then(ApiEnvelope::<IgnoredAny>::retry_after)
            .or(header_retry_after);
        let description = envelope
            .and_then(|e| e.description)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());

        Err(classify_failure(
            operation,
            subject,
            status.as_u16(),
            description,
            retry_after,
        ))
    }
}

/// Maps a gateway status/error code to exactly one [`RemoteError`].
pub(crate) fn classify_failure(
    operation: Operation,
    subject: &str,
    code: u16,
    description: String,
    retry_after: Option<u64>,
) -> RemoteError {
    match StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR) {
        StatusCode::TOO_MANY_REQUESTS => RemoteError::RateLimited {
            retry_after_secs: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::AccessDenied {
            reference: subject.to_owned(),
            reason: description,
        },
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND if operation == Operation::Resolve => {
            RemoteError::InvalidReference {
                reference: subject.to_owned(),
                reason: description,
            }
        }
        // A resolved channel that stops being found was deleted or hidden from us.
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND
            if operation == Operation::FetchMessages =>
        {
            RemoteError::AccessDenied {
                reference: subject.to_owned(),
                reason: description,
            }
        }
        _ => RemoteError::Transient(format!(
            "{} {subject} failed with {code}: {description}",
            operation.as_str()
        )),
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
