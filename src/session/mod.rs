//! The session engine: login, token management, guarded requests.
//!
//! [`Session`] is the composition root and public face of the crate. It
//! wires the credential store, authenticator, rollover monitor, request
//! gateway, and notification poller together over one HTTP client and one
//! event bus, and owns the shutdown signal that stops every background
//! task the engine spawns.

mod auth;
mod credentials;
mod gateway;
mod guard;

pub use auth::Authenticator;
pub use credentials::{Credential, CredentialStore};
pub use gateway::RequestGateway;
pub use guard::ActionSerializer;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::watch;

use crate::config::SessionConfig;
use crate::events::EventBus;
use crate::poller::{NotificationPoller, PollerError, PollerState};
use crate::rollover::RolloverMonitor;
use crate::traits::HttpClient;

/// Coarse view of where the session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No stored token.
    LoggedOut,
    /// A token is stored and presumed live.
    LoggedIn,
    /// The service is in a maintenance outage.
    Outage,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::LoggedOut => "logged-out",
            SessionState::LoggedIn => "logged-in",
            SessionState::Outage => "outage",
        };
        write!(f, "{}", name)
    }
}

/// A logical session with the game service.
///
/// All communication for one account flows through one `Session`. Requests
/// made through it log in lazily, inject the session token, and retry once
/// on a stale session. Cheap to clone; clones share everything.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use bellhop::adapters::ReqwestHttpClient;
/// use bellhop::config::SessionConfig;
/// use bellhop::events::Topic;
/// use bellhop::session::Session;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SessionConfig::new("https://game.example.com", "worthless", "hunter2");
/// let session = Session::new(config, Arc::new(ReqwestHttpClient::new()));
///
/// session.events().on(Topic::Private, |event| {
///     println!("{:?}", event);
/// });
/// session.start_poller()?;
///
/// let page = session.fetch_text("town.php", &[]).await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Session {
    config: Arc<SessionConfig>,
    credentials: Arc<CredentialStore>,
    events: EventBus,
    rollover: RolloverMonitor,
    auth: Authenticator,
    gateway: RequestGateway,
    poller: NotificationPoller,
    serializer: ActionSerializer,
    shutdown: Arc<watch::Sender<bool>>,
}

impl Session {
    /// Build a session over the given HTTP client.
    ///
    /// Nothing touches the network until the first request or an explicit
    /// [`login`](Self::login).
    pub fn new(config: SessionConfig, http: Arc<dyn HttpClient>) -> Self {
        let config = Arc::new(config);
        let credentials = Arc::new(CredentialStore::new());
        let events = EventBus::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let rollover = RolloverMonitor::new(http.clone(), config.clone(), shutdown_rx.clone());
        let auth = Authenticator::new(
            http.clone(),
            config.clone(),
            credentials.clone(),
            rollover.clone(),
            events.clone(),
        );
        let gateway = RequestGateway::new(http, config.clone(), credentials.clone(), auth.clone());
        let poller = NotificationPoller::new(
            gateway.clone(),
            config.clone(),
            events.clone(),
            shutdown_rx,
        );

        Self {
            config,
            credentials,
            events,
            rollover,
            auth,
            gateway,
            poller,
            serializer: ActionSerializer::new(),
            shutdown: Arc::new(shutdown_tx),
        }
    }

    /// The event bus for this session.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Coarse session state.
    pub fn state(&self) -> SessionState {
        if self.rollover.in_outage() {
            SessionState::Outage
        } else if self.credentials.is_empty() {
            SessionState::LoggedOut
        } else {
            SessionState::LoggedIn
        }
    }

    /// Establish a logged-in session; see [`Authenticator::login`].
    pub async fn login(&self) -> bool {
        self.auth.login().await
    }

    /// Probe whether the session is live, refreshing the stored token.
    pub async fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated().await
    }

    /// Authenticated POST returning body text; see
    /// [`RequestGateway::fetch_text`].
    pub async fn fetch_text(&self, path: &str, params: &[(String, String)]) -> String {
        self.gateway.fetch_text(path, params).await
    }

    /// Authenticated POST parsed as JSON; see
    /// [`RequestGateway::fetch_json`].
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Option<T> {
        self.gateway.fetch_json(path, params).await
    }

    /// Run a multi-step operation with the session-wide guard held.
    ///
    /// Use for sequences that mutate ambient server context, like switching
    /// the active clan before acting on it.
    pub async fn run_guarded<F, Fut, T>(&self, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = T>,
    {
        self.serializer.run_exclusive(f).await
    }

    /// Submit a line to chat.
    pub async fn send_chat(&self, line: &str) -> String {
        let params = vec![("graf".to_string(), line.to_string())];
        self.gateway
            .fetch_text(&self.config.chat_send_path, &params)
            .await
    }

    /// Delete mail items by id.
    pub async fn delete_mail(&self, ids: &[String]) -> String {
        let params = vec![("ids".to_string(), ids.join(","))];
        self.gateway
            .fetch_text(&self.config.mail_delete_path, &params)
            .await
    }

    /// Check the landing page for the maintenance banner now.
    ///
    /// Returns `true` while the service is in outage.
    pub async fn check_rollover(&self) -> bool {
        self.rollover.check().await
    }

    /// Start the background notification poller.
    pub fn start_poller(&self) -> Result<(), PollerError> {
        self.poller.start()
    }

    /// Lifecycle state of the notification poller.
    pub fn poller_state(&self) -> PollerState {
        self.poller.state()
    }

    /// Signal every background task owned by this session to stop.
    pub fn shutdown(&self) {
        tracing::info!("session shutting down");
        let _ = self.shutdown.send(true);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.config.base_url)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
