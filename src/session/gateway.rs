//! Authenticated request dispatch.
//!
//! Every authenticated call funnels through here. The gateway injects the
//! session token into the form, logs in lazily when no token is stored, and
//! retries once after invalidating a token the server rejected. Retries are
//! bounded: a request makes at most two attempts before giving up and
//! returning the degraded fallback value.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::config::SessionConfig;
use crate::session::auth::Authenticator;
use crate::session::credentials::CredentialStore;
use crate::traits::{FormParams, HttpClient};

/// Maximum attempts per request, counting the first.
const MAX_ATTEMPTS: u32 = 2;

/// Dispatches authenticated requests with lazy login and bounded retry.
///
/// Cheap to clone; clones share the credential store and authenticator.
#[derive(Clone)]
pub struct RequestGateway {
    http: Arc<dyn HttpClient>,
    config: Arc<SessionConfig>,
    credentials: Arc<CredentialStore>,
    auth: Authenticator,
}

impl RequestGateway {
    pub fn new(
        http: Arc<dyn HttpClient>,
        config: Arc<SessionConfig>,
        credentials: Arc<CredentialStore>,
        auth: Authenticator,
    ) -> Self {
        Self {
            http,
            config,
            credentials,
            auth,
        }
    }

    /// Build the final form, injecting the stored token.
    ///
    /// A caller-supplied token field wins over injection; a caller-supplied
    /// token field with an empty value removes the field entirely, for the
    /// rare endpoints that reject it.
    fn form_with_token(&self, params: &[(String, String)]) -> FormParams {
        let field = &self.config.token_field;

        if let Some((_, value)) = params.iter().find(|(name, _)| name == field) {
            if value.is_empty() {
                return params
                    .iter()
                    .filter(|(name, _)| name != field)
                    .cloned()
                    .collect();
            }
            return params.to_vec();
        }

        let mut form = params.to_vec();
        if let Some(token) = self.credentials.get() {
            form.push((field.clone(), token));
        }
        form
    }

    /// POST to an endpoint and return the body text.
    ///
    /// Returns an empty string when the session cannot be established or
    /// the server keeps redirecting to the login page after a retry.
    pub async fn fetch_text(&self, path: &str, params: &[(String, String)]) -> String {
        let url = self.config.url_for(path);

        for attempt in 1..=MAX_ATTEMPTS {
            if self.credentials.is_empty() && !self.auth.login().await {
                tracing::debug!(%url, "request dropped: no session");
                return String::new();
            }

            let form = self.form_with_token(params);
            let body = match self.http.post_form(&url, &form).await {
                Ok(response) => response.text().unwrap_or_default(),
                Err(e) => {
                    tracing::warn!(%url, attempt, error = %e, "request failed");
                    self.credentials.invalidate();
                    continue;
                }
            };

            if body.contains(&self.config.login_marker) {
                tracing::debug!(%url, attempt, "session expired mid-request");
                self.credentials.invalidate();
                continue;
            }

            return body;
        }

        tracing::warn!(%url, "request gave up after {MAX_ATTEMPTS} attempts");
        String::new()
    }

    /// POST to an endpoint and parse the body as JSON.
    ///
    /// A body that fails to parse is treated like a login redirect (the
    /// service hands HTML to expired sessions regardless of endpoint) and
    /// triggers the same invalidate-and-retry. Returns `None` when the
    /// session cannot be established or attempts are exhausted.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Option<T> {
        let url = self.config.url_for(path);

        for attempt in 1..=MAX_ATTEMPTS {
            if self.credentials.is_empty() && !self.auth.login().await {
                tracing::debug!(%url, "request dropped: no session");
                return None;
            }

            let form = self.form_with_token(params);
            let response = match self.http.post_form(&url, &form).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(%url, attempt, error = %e, "request failed");
                    self.credentials.invalidate();
                    continue;
                }
            };

            match response.json::<T>() {
                Ok(parsed) => return Some(parsed),
                Err(e) => {
                    tracing::debug!(%url, attempt, error = %e, "response was not valid JSON");
                    self.credentials.invalidate();
                }
            }
        }

        tracing::warn!(%url, "request gave up after {MAX_ATTEMPTS} attempts");
        None
    }
}

impl std::fmt::Debug for RequestGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestGateway").finish_non_exhaustive()
    }
}
