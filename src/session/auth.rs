//! Login and session-liveness checks.
//!
//! The status endpoint doubles as the liveness probe and the token refresh:
//! every successful call rotates the server-side token, so the fresh value
//! is always written back to the credential store. Full logins go through a
//! session-wide async lock so that concurrent callers collapse into one
//! login attempt instead of racing the server.

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::SessionConfig;
use crate::events::{EventBus, SessionEvent};
use crate::models::StatusResponse;
use crate::rollover::RolloverMonitor;
use crate::session::credentials::CredentialStore;
use crate::traits::HttpClient;

/// Drives login and status checks against the service.
///
/// Cheap to clone; clones share the login lock and credential store.
#[derive(Clone)]
pub struct Authenticator {
    http: Arc<dyn HttpClient>,
    config: Arc<SessionConfig>,
    credentials: Arc<CredentialStore>,
    rollover: RolloverMonitor,
    events: EventBus,
    login_lock: Arc<Mutex<()>>,
}

impl Authenticator {
    pub fn new(
        http: Arc<dyn HttpClient>,
        config: Arc<SessionConfig>,
        credentials: Arc<CredentialStore>,
        rollover: RolloverMonitor,
        events: EventBus,
    ) -> Self {
        Self {
            http,
            config,
            credentials,
            rollover,
            events,
            login_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Probe the status endpoint.
    ///
    /// A parseable response with a non-empty token means the session is
    /// live; the rotated token is stored before returning. Anything else
    /// (transport failure, HTML login page, empty token) reads as not
    /// authenticated.
    pub async fn is_authenticated(&self) -> bool {
        let url = self.config.url_for(&self.config.status_path);
        let params = vec![
            ("what".to_string(), "status".to_string()),
            (
                "for".to_string(),
                format!("bellhop/{}", env!("CARGO_PKG_VERSION")),
            ),
        ];

        let response = match self.http.post_form(&url, &params).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(error = %e, "status probe failed");
                return false;
            }
        };

        let status: StatusResponse = match response.json() {
            Ok(status) => status,
            Err(e) => {
                tracing::debug!(error = %e, "status response was not valid JSON");
                return false;
            }
        };

        if status.token.is_empty() {
            return false;
        }

        self.credentials.set(status.token);
        tracing::debug!(player_id = status.player_id, "session is live");
        true
    }

    /// Establish a logged-in session, logging in if necessary.
    ///
    /// Returns `true` once the session is live. Safe to call concurrently:
    /// callers queue on the login lock and the winner's status check lets
    /// the rest return without a second login POST. Fails fast without
    /// touching the login endpoint while a maintenance outage is in
    /// progress.
    pub async fn login(&self) -> bool {
        let _guard = self.login_lock.lock().await;

        if self.is_authenticated().await {
            return true;
        }

        if self.rollover.in_outage() {
            tracing::debug!("skipping login attempt during maintenance outage");
            return false;
        }

        tracing::info!(username = %self.config.username, "logging in");
        let url = self.config.url_for(&self.config.login_path);
        let params = vec![
            ("loginname".to_string(), self.config.username.clone()),
            ("password".to_string(), self.config.password.clone()),
            ("secure".to_string(), "1".to_string()),
        ];

        let body = match self.http.post_form(&url, &params).await {
            Ok(response) => response.text().unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "login request failed");
                self.rollover.check().await;
                return false;
            }
        };

        if body.contains(&self.config.outage_banner) {
            tracing::info!("login rejected: service is in maintenance outage");
            self.rollover.note_outage();
            return false;
        }

        if self.is_authenticated().await {
            if self.rollover.take_outage_latch() {
                self.events.publish(&SessionEvent::OutageEnded);
            }
            tracing::info!("login succeeded");
            return true;
        }

        tracing::warn!("login did not produce a live session");
        self.rollover.check().await;
        false
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("username", &self.config.username)
            .finish_non_exhaustive()
    }
}
