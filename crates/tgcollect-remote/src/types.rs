//! Gateway response types.
//!
//! Every response is wrapped in a `{"ok": bool, ...}` envelope. On success
//! `result` carries the payload; on failure `error_code`, `description` and
//! optionally `parameters.retry_after` describe what went wrong.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use tgcollect_core::FetchedItem;

/// Top-level envelope for all gateway responses.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    pub ok: bool,
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default)]
    pub error_code: Option<u16>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Option<ErrorParameters>,
}

impl<T> ApiEnvelope<T> {
    /// Seconds the gateway asked us to wait, if it said.
    #[must_use]
    pub fn retry_after(&self) -> Option<u64> {
        self.parameters.as_ref().and_then(|p| p.retry_after)
    }
}

#[derive(Debug, Deserialize)]
pub struct ErrorParameters {
    #[serde(default)]
    pub retry_after: Option<u64>,
}

// ---------------------------------------------------------------------------
// channels/{id}/messages
// ---------------------------------------------------------------------------

/// One message as the gateway returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteMessage {
    pub id: i64,
    /// Publish time as Unix seconds.
    pub date: i64,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub views: Option<i32>,
}

impl RemoteMessage {
    /// Converts into a storable item for `channel_id`.
    ///
    /// Media-only messages arrive with empty text; that is stored as `NULL`.
    /// Returns `None` when `date` is outside the representable range.
    #[must_use]
    pub fn into_item(self, channel_id: i64) -> Option<FetchedItem> {
        let published_at = DateTime::from_timestamp(self.date, 0)?;
        Some(FetchedItem {
            channel_id,
            message_id: self.id,
            published_at,
            text: self.text.filter(|t| !t.is_empty()),
            views: self.views,
        })
    }
}

// ---------------------------------------------------------------------------
// sessions
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SessionRequest<'a> {
    pub session_name: &'a str,
}

/// State of the named session after registration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionInfo {
    pub session_name: String,
    pub authorized: bool,
    #[serde(default)]
    pub user_id: Option<i64>,
}
