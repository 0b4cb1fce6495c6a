//! Background notification polling.
//!
//! One timer-driven task per session fetches new chat messages and inbound
//! mail on a fixed cadence and publishes them on the event bus. Chat uses
//! the server's opaque cursor so each message is seen once; mail is
//! consumed (deleted server-side) before its event is published, so a
//! crash between the two loses the item rather than replaying it.

use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::watch;

use crate::config::SessionConfig;
use crate::events::{EventBus, SessionEvent};
use crate::models::{ChatPollResponse, MailEnvelope};
use crate::session::RequestGateway;

/// Poller lifecycle errors.
#[derive(Debug, Error)]
pub enum PollerError {
    /// `start` was called while the poll task was already running.
    #[error("notification poller is already running")]
    AlreadyRunning,
}

/// Lifecycle state of the poll task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// No poll task is running.
    Stopped,
    /// The poll task is running.
    Running,
}

struct PollerInner {
    gateway: RequestGateway,
    config: Arc<SessionConfig>,
    events: EventBus,
    state: Mutex<PollerState>,
    /// Chat cursor; `"0"` asks the server for everything recent.
    watermark: Mutex<String>,
    shutdown: watch::Receiver<bool>,
}

/// Polls the service for chat and mail, publishing events as they arrive.
///
/// Cheap to clone; clones share the poll task, cursor, and state.
#[derive(Clone)]
pub struct NotificationPoller {
    inner: Arc<PollerInner>,
}

impl NotificationPoller {
    pub fn new(
        gateway: RequestGateway,
        config: Arc<SessionConfig>,
        events: EventBus,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            inner: Arc::new(PollerInner {
                gateway,
                config,
                events,
                state: Mutex::new(PollerState::Stopped),
                watermark: Mutex::new("0".to_string()),
                shutdown,
            }),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PollerState {
        *self.inner.state.lock().unwrap()
    }

    /// Current chat cursor.
    pub fn watermark(&self) -> String {
        self.inner.watermark.lock().unwrap().clone()
    }

    /// Start the poll task.
    ///
    /// Polls immediately, then every `chat_poll_interval` until shutdown is
    /// signalled. At most one task runs per session.
    pub fn start(&self) -> Result<(), PollerError> {
        {
            let mut state = self.inner.state.lock().unwrap();
            if *state == PollerState::Running {
                return Err(PollerError::AlreadyRunning);
            }
            *state = PollerState::Running;
        }

        let poller = self.clone();
        tokio::spawn(async move {
            tracing::debug!(
                interval = ?poller.inner.config.chat_poll_interval,
                "notification poller started"
            );
            let mut shutdown = poller.inner.shutdown.clone();

            loop {
                poller.poll_once().await;
                tokio::select! {
                    _ = tokio::time::sleep(poller.inner.config.chat_poll_interval) => {}
                    _ = shutdown.changed() => break,
                }
            }

            *poller.inner.state.lock().unwrap() = PollerState::Stopped;
            tracing::debug!("notification poller stopped");
        });

        Ok(())
    }

    /// Run one poll cycle: chat and mail fetched concurrently.
    ///
    /// Events from the two streams may interleave; order is only guaranteed
    /// within each stream.
    pub async fn poll_once(&self) {
        tokio::join!(self.poll_chat(), self.poll_mail());
    }

    async fn poll_chat(&self) {
        let since = self.watermark();
        let params = vec![("lasttime".to_string(), since)];
        let response: Option<ChatPollResponse> = self
            .inner
            .gateway
            .fetch_json(&self.inner.config.chat_poll_path, &params)
            .await;

        let Some(response) = response else {
            return;
        };

        // Advance the cursor even on an empty batch; the server moves it
        // regardless and resubmitting a stale one replays messages.
        if !response.last.is_empty() {
            *self.inner.watermark.lock().unwrap() = response.last.clone();
        }

        if !response.msgs.is_empty() {
            tracing::debug!(count = response.msgs.len(), "new chat messages");
        }
        for raw in response.msgs {
            self.inner
                .events
                .publish(&SessionEvent::Chat(raw.into_inbound()));
        }
    }

    async fn poll_mail(&self) {
        let params = vec![("box".to_string(), "Inbox".to_string())];
        let envelopes: Option<Vec<MailEnvelope>> = self
            .inner
            .gateway
            .fetch_json(&self.inner.config.mail_list_path, &params)
            .await;

        let Some(envelopes) = envelopes else {
            return;
        };
        if envelopes.is_empty() {
            return;
        }
        tracing::debug!(count = envelopes.len(), "new mail");

        // Consume server-side first; only a consumed item is published. A
        // failed delete skips the publish and leaves the item in the inbox
        // for the next cycle, so delivery stays at most once either way.
        for envelope in envelopes {
            let delete_params = vec![("ids".to_string(), envelope.id.clone())];
            let receipt = self
                .inner
                .gateway
                .fetch_text(&self.inner.config.mail_delete_path, &delete_params)
                .await;
            if receipt.is_empty() {
                tracing::warn!(id = %envelope.id, "mail delete failed, leaving item in inbox");
                continue;
            }
            self.inner
                .events
                .publish(&SessionEvent::Kmail(envelope.into_inbound()));
        }
    }
}

impl std::fmt::Debug for NotificationPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationPoller")
            .field("state", &self.state())
            .field("watermark", &self.watermark())
            .finish_non_exhaustive()
    }
}
