//! Channel references as supplied by configuration.
//!
//! A reference is kept verbatim; it is only checked for shape here. Whether
//! the channel exists and is readable is decided by the remote API on every
//! cycle.

use std::fmt;

use crate::ConfigError;

const LINK_PREFIX: &str = "https://t.me/";
const NUMERIC_PREFIX: &str = "-100";

/// The accepted spellings of a channel reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRefKind {
    /// `@username`
    Handle,
    /// `https://t.me/username`
    Link,
    /// `https://t.me/joinchat/<hash>` or `https://t.me/+<hash>`
    InviteLink,
    /// `-100<digits>`
    NumericId,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelRef(String);

impl ChannelRef {
    /// Validates the shape of `raw` (trimmed) and wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidChannel`] if the reference is empty or
    /// does not match any [`ChannelRefKind`].
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        let reference = Self(trimmed.to_string());
        reference.kind()?;
        Ok(reference)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Classifies the reference.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidChannel`] if the reference matches no
    /// supported form.
    pub fn kind(&self) -> Result<ChannelRefKind, ConfigError> {
        let s = self.0.as_str();
        let invalid = |reason: &str| ConfigError::InvalidChannel {
            reference: s.to_string(),
            reason: reason.to_string(),
        };

        if s.is_empty() {
            return Err(invalid("empty reference"));
        }

        if let Some(name) = s.strip_prefix('@') {
            return if is_username(name) {
                Ok(ChannelRefKind::Handle)
            } else {
                Err(invalid("handle must be @ followed by letters, digits or underscores"))
            };
        }

        if let Some(digits) = s.strip_prefix(NUMERIC_PREFIX) {
            return if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                Ok(ChannelRefKind::NumericId)
            } else {
                Err(invalid("numeric id must be -100 followed by digits"))
            };
        }

        if let Some(path) = s.strip_prefix(LINK_PREFIX) {
            let path = path.trim_end_matches('/');
            if let Some(hash) = path
                .strip_prefix("joinchat/")
                .or_else(|| path.strip_prefix('+'))
            {
                return if hash.is_empty() {
                    Err(invalid("invite link has no hash"))
                } else {
                    Ok(ChannelRefKind::InviteLink)
                };
            }
            return if is_username(path) {
                Ok(ChannelRefKind::Link)
            } else {
                Err(invalid("link must name a channel"))
            };
        }

        if s.contains("joinchat") {
            return Ok(ChannelRefKind::InviteLink);
        }

        Err(invalid(
            "supported forms: @username, https://t.me/channel, -100<id>, https://t.me/joinchat/...",
        ))
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Splits a comma-separated list and validates each non-empty entry.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for `var` if the list is empty, or
/// [`ConfigError::InvalidChannel`] for the first malformed entry.
pub fn parse_channel_list(var: &str, raw: &str) -> Result<Vec<ChannelRef>, ConfigError> {
    let channels = raw
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(ChannelRef::parse)
        .collect::<Result<Vec<_>, _>>()?;

    if channels.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: "at least one channel is required".to_string(),
        });
    }

    Ok(channels)
}

fn is_username(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}
