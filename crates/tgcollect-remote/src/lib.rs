//! HTTP adapter for the messaging API gateway.
//!
//! Resolves channel references, fetches recent messages, and registers the
//! API session. Every failure surfaces as a [`RemoteError`], and every
//! `RemoteError` maps to exactly one [`FailureClass`].

pub mod client;
pub mod error;
pub mod session;
pub mod types;

pub use client::{ClientOptions, RemoteClient};
pub use error::{BuildError, FailureClass, RemoteError};
pub use types::{RemoteMessage, SessionInfo};
