//! HTTP and HTTPS notification transport.

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::provider::Provider;
use super::retry::RetryPolicy;
use crate::errors::NotifyError;

/// Delivers payloads as JSON POST requests.
///
/// Handles both the `http` and `https` schemes. Any syntactically valid
/// endpoint passes validation; reachability is only discovered at send time.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl Default for HttpProvider {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
            retry: RetryPolicy::none(),
        }
    }
}

impl HttpProvider {
    /// Creates a provider with a fresh client and no retries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider reusing an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            retry: RetryPolicy::none(),
        }
    }

    /// Sets the retry policy applied around each delivery.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl Provider for HttpProvider {
    fn validate(&self, _endpoint: &Url) -> Result<(), NotifyError> {
        // A parsed URL is all this transport needs.
        Ok(())
    }

    async fn send(&self, payload: &serde_json::Value, endpoint: &Url) -> Result<(), NotifyError> {
        self.retry
            .run(|| async {
                debug!(url = %endpoint, "posting notification");
                let response = self
                    .client
                    .post(endpoint.clone())
                    .json(payload)
                    .send()
                    .await?;
                response.error_for_status()?;
                Ok(())
            })
            .await
    }
}
