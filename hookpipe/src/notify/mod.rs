//! Notification dispatch: subscriber registry, scope filtering and
//! concurrent fan-out over pluggable transport providers.

mod http;
mod kafka;
mod provider;
mod retry;
mod scope;

pub use http::HttpProvider;
pub use kafka::{KafkaProvider, KafkaPublisher, KafkaTarget, DEFAULT_MECHANISMS, DEFAULT_PROTOCOL};
pub use provider::Provider;
pub use retry::{BackoffStrategy, JitterStrategy, RetryPolicy};
pub use scope::ScopePattern;

use crate::errors::NotifyError;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error};
use url::Url;

/// A registered notification target.
///
/// Only ever constructed by [`NotificationHub::subscribe`], which guarantees
/// the endpoint passed its provider's validation.
#[derive(Clone)]
pub struct Subscriber {
    endpoint: Url,
    scope: ScopePattern,
    provider: Arc<dyn Provider>,
}

impl Subscriber {
    /// The subscriber's endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The subscriber's scope pattern as declared.
    #[must_use]
    pub fn scope(&self) -> &str {
        self.scope.as_str()
    }
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("endpoint", &self.endpoint.as_str())
            .field("scope", &self.scope.as_str())
            .finish_non_exhaustive()
    }
}

/// The notification dispatcher.
///
/// One hub is constructed per process and shared by reference between the
/// startup configuration and the pipeline runner. Subscribers and providers
/// are mutable process state; writes are serialized against the snapshot
/// reads every dispatch takes.
#[derive(Default)]
pub struct NotificationHub {
    providers: RwLock<HashMap<String, Arc<dyn Provider>>>,
    subscribers: RwLock<Vec<Subscriber>>,
}

impl std::fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationHub")
            .field("schemes", &self.providers.read().keys().cloned().collect::<Vec<_>>())
            .field("subscribers", &self.subscribers.read().len())
            .finish()
    }
}

impl NotificationHub {
    /// Creates a hub with no providers registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a hub with the built-in providers registered: `http` and
    /// `https` always, `kafka` when the `rdkafka` feature is enabled.
    #[must_use]
    pub fn with_default_providers() -> Self {
        let hub = Self::new();
        let http: Arc<dyn Provider> = Arc::new(HttpProvider::new());
        hub.register_provider("http", Arc::clone(&http));
        hub.register_provider("https", http);
        #[cfg(feature = "rdkafka")]
        hub.register_provider("kafka", Arc::new(KafkaProvider::rdkafka()));
        hub
    }

    /// Registers a provider for a URL scheme.
    ///
    /// This is the extension point for new transports; the dispatch logic
    /// never changes when a scheme is added.
    pub fn register_provider(&self, scheme: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.write().insert(scheme.into(), provider);
    }

    /// Registers a subscriber.
    ///
    /// The endpoint is parsed, its scheme resolved against the provider
    /// table, the scope pattern compiled and the endpoint validated by the
    /// provider. On any failure the registry is left untouched.
    pub fn subscribe(&self, url_raw: &str, scope: &str) -> Result<(), NotifyError> {
        let endpoint = Url::parse(url_raw).map_err(|source| NotifyError::Parse {
            url: url_raw.to_string(),
            source,
        })?;
        let provider = self
            .providers
            .read()
            .get(endpoint.scheme())
            .cloned()
            .ok_or_else(|| NotifyError::UnsupportedScheme {
                scheme: endpoint.scheme().to_string(),
            })?;
        let scope = ScopePattern::new(scope)?;
        provider.validate(&endpoint)?;

        debug!(endpoint = %endpoint, scope = %scope.as_str(), "subscriber registered");
        self.subscribers.write().push(Subscriber {
            endpoint,
            scope,
            provider,
        });
        Ok(())
    }

    /// Removes every subscriber. Used for process reinitialization.
    pub fn reset(&self) {
        self.subscribers.write().clear();
    }

    /// Returns the number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Dispatches an event without blocking the caller.
    ///
    /// The fan-out runs as a detached task; the returned handle makes
    /// completion observable for callers that care, and can be dropped by
    /// those that do not. Dispatch failures are logged here and never
    /// propagate past the handle.
    pub fn send<T: Serialize>(
        self: &Arc<Self>,
        payload: &T,
        scope: &str,
    ) -> JoinHandle<Result<(), NotifyError>> {
        let hub = Arc::clone(self);
        let scope = scope.to_string();
        let value = serde_json::to_value(payload).map_err(NotifyError::from);
        tokio::spawn(async move {
            let result = match value {
                Ok(value) => hub.do_send(&value, &scope).await,
                Err(err) => Err(err),
            };
            if let Err(err) = &result {
                error!(scope = %scope, error = %err, "notification dispatch failed");
            }
            result
        })
    }

    /// Synchronous fan-out of one event to every matching subscriber.
    ///
    /// Works over a snapshot of the subscriber list: one concurrent provider
    /// send per matched subscriber, one result collected per dispatched send
    /// through a channel sized to the matched count. Unmatched subscribers
    /// are not part of the wait count. The first error encountered is
    /// returned; a send still in flight when the wait loop exits delivers
    /// into the closed channel's abandon signal instead of blocking forever,
    /// though its network call is not interrupted.
    pub async fn do_send(&self, payload: &serde_json::Value, scope: &str) -> Result<(), NotifyError> {
        let matched: Vec<Subscriber> = self
            .subscribers
            .read()
            .iter()
            .filter(|sub| sub.scope.matches(scope))
            .cloned()
            .collect();
        if matched.is_empty() {
            debug!(scope = %scope, "no matching subscriber");
            return Ok(());
        }

        let payload = Arc::new(payload.clone());
        let count = matched.len();
        let (result_tx, mut result_rx) = mpsc::channel::<Result<(), NotifyError>>(count);
        // Dropped when this function returns; abandoned senders see it close.
        let (quit_tx, quit_rx) = watch::channel(());

        for sub in matched {
            let tx = result_tx.clone();
            let mut quit = quit_rx.clone();
            let payload = Arc::clone(&payload);
            tokio::spawn(async move {
                let result = sub.provider.send(payload.as_ref(), &sub.endpoint).await;
                tokio::select! {
                    sent = tx.send(result) => {
                        if sent.is_ok() {
                            debug!(endpoint = %sub.endpoint, "sent");
                        }
                    }
                    _ = quit.changed() => {
                        debug!(endpoint = %sub.endpoint, "dispatch abandoned");
                    }
                }
            });
        }
        drop(result_tx);

        let mut outcome = Ok(());
        for _ in 0..count {
            match result_rx.recv().await {
                Some(Ok(())) => {}
                Some(Err(err)) => {
                    error!(scope = %scope, error = %err, "send failed");
                    outcome = Err(err);
                    break;
                }
                None => break,
            }
        }
        drop(quit_tx);
        outcome
    }
}
