//! Test support: in-memory provider doubles for exercising dispatch without
//! network I/O.

use async_trait::async_trait;
use parking_lot::Mutex;
use url::Url;

use crate::errors::NotifyError;
use crate::notify::Provider;

/// A provider that records every send instead of delivering it.
///
/// Register it under any scheme to observe which subscribers a dispatch
/// reached and with what payload.
#[derive(Debug, Default)]
pub struct RecordingProvider {
    sent: Mutex<Vec<(String, serde_json::Value)>>,
    fail_with: Option<String>,
}

impl RecordingProvider {
    /// Creates a provider whose sends all succeed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider whose sends all fail with the given reason,
    /// after recording.
    #[must_use]
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with: Some(reason.into()),
        }
    }

    /// Returns every recorded (endpoint, payload) pair, in arrival order.
    #[must_use]
    pub fn sent(&self) -> Vec<(String, serde_json::Value)> {
        self.sent.lock().clone()
    }

    /// Returns the number of recorded sends.
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl Provider for RecordingProvider {
    fn validate(&self, _endpoint: &Url) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn send(&self, payload: &serde_json::Value, endpoint: &Url) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .push((endpoint.to_string(), payload.clone()));
        match &self.fail_with {
            Some(reason) => Err(NotifyError::transport(reason.clone())),
            None => Ok(()),
        }
    }
}
