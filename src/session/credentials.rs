//! In-memory storage for the rotating session token.
//!
//! The token is issued by the status endpoint and rotates on every status
//! call, so nothing here is worth persisting. The store is mutated only by
//! the authenticator (on successful status checks) and by the request
//! gateway's invalidation path; everyone else treats it as read-only.

use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// A session token plus the time it was issued.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    /// The per-session authentication value required on every
    /// authenticated request.
    pub token: String,
    /// When the token was stored.
    pub fetched_at: DateTime<Utc>,
}

/// Holder for the current [`Credential`].
///
/// Interior mutability via a plain mutex; the lock is never held across an
/// await point.
#[derive(Debug, Default)]
pub struct CredentialStore {
    inner: Mutex<Option<Credential>>,
}

impl CredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current token, if any.
    pub fn get(&self) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .as_ref()
            .map(|c| c.token.clone())
    }

    /// The current credential, if any.
    pub fn credential(&self) -> Option<Credential> {
        self.inner.lock().unwrap().clone()
    }

    /// Whether no token is stored.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_none()
    }

    /// Store a freshly issued token.
    pub fn set(&self, token: impl Into<String>) {
        let token = token.into();
        tracing::debug!("session token updated");
        *self.inner.lock().unwrap() = Some(Credential {
            token,
            fetched_at: Utc::now(),
        });
    }

    /// Drop the stored token.
    ///
    /// Called when a response shows the session was silently redirected to
    /// the login page.
    pub fn invalidate(&self) {
        tracing::debug!("session token invalidated");
        *self.inner.lock().unwrap() = None;
    }
}
