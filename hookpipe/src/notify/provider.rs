//! The transport provider capability.
//!
//! Providers are registered per URL scheme on the [`NotificationHub`]; the
//! dispatcher never needs to change when a new transport is added.
//!
//! [`NotificationHub`]: crate::notify::NotificationHub

use async_trait::async_trait;
use url::Url;

use crate::errors::NotifyError;

/// A pluggable notification transport.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Checks an endpoint at subscribe time.
    ///
    /// A subscriber only ever enters the registry if its endpoint passed
    /// this check.
    fn validate(&self, endpoint: &Url) -> Result<(), NotifyError>;

    /// Delivers one payload to an endpoint.
    ///
    /// Best effort: the dispatcher never retries a failed send, though a
    /// provider may retry internally.
    async fn send(&self, payload: &serde_json::Value, endpoint: &Url) -> Result<(), NotifyError>;
}
