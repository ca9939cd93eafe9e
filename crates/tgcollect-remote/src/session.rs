//! Session bootstrap for the gateway.

use crate::client::{Operation, RemoteClient};
use crate::error::RemoteError;
use crate::types::{SessionInfo, SessionRequest};

impl RemoteClient {
    /// Registers the configured session with the gateway, or refreshes it if
    /// it already exists.
    ///
    /// Run once interactively before the first collection; the gateway keeps
    /// the authorized session under `session_name` afterwards.
    ///
    /// # Errors
    ///
    /// - [`RemoteError::AccessDenied`] if the gateway rejects the API credentials.
    /// - [`RemoteError::RateLimited`] if the gateway asks us to back off.
    /// - [`RemoteError::Transient`] on network failure, 5xx, or a malformed body.
    pub async fn create_session(&self) -> Result<SessionInfo, RemoteError> {
        let url = self.build_url("sessions", &[])?;
        let body = SessionRequest {
            session_name: self.session_name(),
        };
        let request = self.client().post(url).json(&body);
        let info: SessionInfo = self
            .send(request, Operation::CreateSession, self.session_name())
            .await?;

        tracing::info!(
            session = %info.session_name,
            authorized = info.authorized,
            "session registered"
        );
        Ok(info)
    }
}
