//! Session configuration types.
//!
//! This module defines the configuration for a game-service session: the
//! service location, account credentials, endpoint paths, polling cadence,
//! and the content markers used to recognize login redirects and the
//! maintenance ("rollover") banner.

use std::time::Duration;

/// Form field name carrying the session token on authenticated requests.
pub const DEFAULT_TOKEN_FIELD: &str = "pwd";

/// Default delay between notification poll cycles.
pub const DEFAULT_CHAT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Default delay between rollover checks while the service is down.
pub const DEFAULT_ROLLOVER_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for a [`Session`](crate::session::Session).
///
/// Use the builder pattern to customize behavior.
///
/// # Example
///
/// ```ignore
/// use bellhop::config::SessionConfig;
///
/// let config = SessionConfig::new("https://game.example.com", "worthless", "hunter2")
///     .with_token_field("pwd");
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL of the game service, without a trailing slash.
    pub base_url: String,
    /// Account name submitted on login.
    pub username: String,
    /// Account password submitted on login.
    pub password: String,
    /// Form field name the session token is injected into (default: `pwd`).
    pub token_field: String,
    /// Delay between notification poll cycles (default: 3s).
    pub chat_poll_interval: Duration,
    /// Delay between rollover checks while in outage (default: 60s).
    pub rollover_check_interval: Duration,
    /// Banner text that marks the maintenance-outage page.
    pub outage_banner: String,
    /// Marker that identifies a silent redirect to the login page.
    pub login_marker: String,
    /// Login endpoint.
    pub login_path: String,
    /// Lightweight status endpoint; issues a fresh token on every call.
    pub status_path: String,
    /// Unauthenticated landing page used for rollover checks.
    pub landing_path: String,
    /// Chat poll endpoint (cursor-based).
    pub chat_poll_path: String,
    /// Chat submission endpoint.
    pub chat_send_path: String,
    /// Mail listing endpoint.
    pub mail_list_path: String,
    /// Mail deletion (consume) endpoint.
    pub mail_delete_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://game.example.com".to_string(),
            username: String::new(),
            password: String::new(),
            token_field: DEFAULT_TOKEN_FIELD.to_string(),
            chat_poll_interval: DEFAULT_CHAT_POLL_INTERVAL,
            rollover_check_interval: DEFAULT_ROLLOVER_CHECK_INTERVAL,
            outage_banner: "down for nightly maintenance".to_string(),
            login_marker: "name=loginform".to_string(),
            login_path: "login.php".to_string(),
            status_path: "api.php".to_string(),
            landing_path: "main.php".to_string(),
            chat_poll_path: "newchatmessages.php".to_string(),
            chat_send_path: "submitnewchat.php".to_string(),
            mail_list_path: "messages.php".to_string(),
            mail_delete_path: "deletemessages.php".to_string(),
        }
    }
}

impl SessionConfig {
    /// Create a config for the given service and account.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Set the token form-field name.
    pub fn with_token_field(mut self, field: impl Into<String>) -> Self {
        self.token_field = field.into();
        self
    }

    /// Set the delay between notification poll cycles.
    pub fn with_chat_poll_interval(mut self, interval: Duration) -> Self {
        self.chat_poll_interval = interval;
        self
    }

    /// Set the delay between rollover checks.
    pub fn with_rollover_check_interval(mut self, interval: Duration) -> Self {
        self.rollover_check_interval = interval;
        self
    }

    /// Set the maintenance banner marker.
    pub fn with_outage_banner(mut self, banner: impl Into<String>) -> Self {
        self.outage_banner = banner.into();
        self
    }

    /// Set the login-redirect marker.
    pub fn with_login_marker(mut self, marker: impl Into<String>) -> Self {
        self.login_marker = marker.into();
        self
    }

    /// Create config from environment variables.
    ///
    /// Reads `BELLHOP_BASE_URL`, `BELLHOP_USER`, and `BELLHOP_PASS`; any
    /// missing variable falls back to the default (empty) value.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("BELLHOP_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(user) = std::env::var("BELLHOP_USER") {
            config.username = user;
        }
        if let Ok(pass) = std::env::var("BELLHOP_PASS") {
            config.password = pass;
        }
        config
    }

    /// Build the absolute URL for an endpoint path.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
