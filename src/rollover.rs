//! Maintenance-outage ("rollover") detection.
//!
//! The service goes down on a schedule and announces it with a banner on
//! the unauthenticated landing page. While the banner is up, login attempts
//! are pointless and the authenticator fails fast instead of hammering a
//! known-down endpoint.
//!
//! While in outage the monitor re-checks on a fixed interval from its own
//! background task; the task stops rescheduling itself the moment the
//! outage clears. Clearing raises a one-shot latch that the authenticator
//! consumes on the next successful login to publish a single
//! `outage-ended` event.

use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use crate::config::SessionConfig;
use crate::traits::HttpClient;

#[derive(Debug, Default)]
struct RolloverState {
    in_outage: bool,
    /// Set on the outage -> clear transition; at most one outstanding.
    ended_latch: bool,
    /// Whether a re-check task owns the outage. Spawn decisions and the
    /// task's exit handoff both happen under this lock, so an outage noted
    /// while the task winds down is never left without an owner.
    loop_running: bool,
}

struct MonitorInner {
    http: Arc<dyn HttpClient>,
    config: Arc<SessionConfig>,
    state: Mutex<RolloverState>,
    shutdown: watch::Receiver<bool>,
}

/// Tracks whether the service is in a scheduled outage.
///
/// Cheap to clone; clones share state. The only timer-driven task this
/// monitor owns runs solely while an outage is in progress.
#[derive(Clone)]
pub struct RolloverMonitor {
    inner: Arc<MonitorInner>,
}

impl RolloverMonitor {
    /// Create a monitor.
    ///
    /// `shutdown` is the session-wide stop signal; flipping it to `true`
    /// ends the re-check task even mid-outage.
    pub fn new(
        http: Arc<dyn HttpClient>,
        config: Arc<SessionConfig>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                http,
                config,
                state: Mutex::new(RolloverState::default()),
                shutdown,
            }),
        }
    }

    /// Whether the service is currently believed to be in outage.
    pub fn in_outage(&self) -> bool {
        self.inner.state.lock().unwrap().in_outage
    }

    /// Consume the outage-ended latch.
    ///
    /// Returns `true` at most once per completed outage.
    pub fn take_outage_latch(&self) -> bool {
        let mut state = self.inner.state.lock().unwrap();
        std::mem::take(&mut state.ended_latch)
    }

    /// Record an outage observed elsewhere (e.g. the login response carried
    /// the banner) and make sure the re-check task is running.
    pub fn note_outage(&self) {
        let spawn = {
            let mut state = self.inner.state.lock().unwrap();
            if state.in_outage {
                return;
            }
            state.in_outage = true;
            !std::mem::replace(&mut state.loop_running, true)
        };
        tracing::info!("service entered maintenance outage");
        if spawn {
            self.spawn_recheck_task();
        }
    }

    /// Fetch the landing page and test it against the outage banner.
    ///
    /// Returns the in-outage flag after the check. A transport failure
    /// leaves the current belief unchanged.
    pub async fn check(&self) -> bool {
        let url = self.inner.config.url_for(&self.inner.config.landing_path);
        let body = match self.inner.http.get(&url).await {
            Ok(response) => response.text().unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "rollover check fetch failed");
                return self.in_outage();
            }
        };

        let observed = body.contains(&self.inner.config.outage_banner);
        let (entered, spawn, in_outage) = {
            let mut state = self.inner.state.lock().unwrap();
            if observed && !state.in_outage {
                state.in_outage = true;
                let spawn = !std::mem::replace(&mut state.loop_running, true);
                (true, spawn, true)
            } else if !observed && state.in_outage {
                state.in_outage = false;
                state.ended_latch = true;
                tracing::info!("maintenance outage cleared");
                (false, false, false)
            } else {
                (false, false, state.in_outage)
            }
        };

        if entered {
            tracing::info!("service entered maintenance outage");
        }
        if spawn {
            self.spawn_recheck_task();
        }
        in_outage
    }

    /// Spawn the re-check task. The caller must have set `loop_running`
    /// under the state lock.
    ///
    /// The task re-checks on `rollover_check_interval` until the outage is
    /// clear or shutdown is signalled. Exiting and releasing `loop_running`
    /// happen under the state lock, so an outage noted while the task winds
    /// down keeps the task alive instead of being orphaned.
    fn spawn_recheck_task(&self) {
        let monitor = self.clone();
        tokio::spawn(async move {
            let interval = monitor.inner.config.rollover_check_interval;
            let mut shutdown = monitor.inner.shutdown.clone();
            tracing::debug!(?interval, "rollover re-check task started");

            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = shutdown.changed() => {
                        monitor.inner.state.lock().unwrap().loop_running = false;
                        break;
                    }
                }
                if !monitor.check().await {
                    let mut state = monitor.inner.state.lock().unwrap();
                    if !state.in_outage {
                        state.loop_running = false;
                        break;
                    }
                }
            }

            tracing::debug!("rollover re-check task stopped");
        });
    }
}

impl std::fmt::Debug for RolloverMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RolloverMonitor")
            .field("in_outage", &self.in_outage())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::traits::Response;
    use bytes::Bytes;

    fn monitor_with(mock: &MockHttpClient) -> RolloverMonitor {
        let config = Arc::new(SessionConfig::new(
            "https://game.example.com",
            "user",
            "pass",
        ));
        let (_tx, rx) = watch::channel(false);
        // Keep the sender alive for the monitor's lifetime in these tests
        // by leaking it; individual tests that care hold their own.
        std::mem::forget(_tx);
        RolloverMonitor::new(Arc::new(mock.clone()), config, rx)
    }

    fn landing_ok() -> MockResponse {
        MockResponse::Success(Response::new(200, Bytes::from("Welcome, adventurer!")))
    }

    fn landing_outage() -> MockResponse {
        MockResponse::Success(Response::new(
            200,
            Bytes::from("The service is down for nightly maintenance."),
        ))
    }

    #[tokio::test]
    async fn test_check_with_healthy_page() {
        let mock = MockHttpClient::new();
        mock.set_response("https://game.example.com/main.php", landing_ok());

        let monitor = monitor_with(&mock);
        assert!(!monitor.check().await);
        assert!(!monitor.in_outage());
        assert!(!monitor.take_outage_latch());
    }

    #[tokio::test]
    async fn test_check_detects_outage() {
        let mock = MockHttpClient::new();
        mock.set_response("https://game.example.com/main.php", landing_outage());

        let monitor = monitor_with(&mock);
        assert!(monitor.check().await);
        assert!(monitor.in_outage());
        // Entering outage does not raise the latch
        assert!(!monitor.take_outage_latch());
    }

    #[tokio::test]
    async fn test_clearing_outage_raises_latch_once() {
        let mock = MockHttpClient::new();
        mock.enqueue_response("https://game.example.com/main.php", landing_outage());
        mock.set_response("https://game.example.com/main.php", landing_ok());

        let monitor = monitor_with(&mock);
        assert!(monitor.check().await);
        assert!(!monitor.check().await);

        assert!(monitor.take_outage_latch());
        assert!(!monitor.take_outage_latch());
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_current_belief() {
        let mock = MockHttpClient::new();
        mock.enqueue_response("https://game.example.com/main.php", landing_outage());
        mock.set_response(
            "https://game.example.com/main.php",
            MockResponse::Error(crate::traits::HttpError::ConnectionFailed(
                "refused".to_string(),
            )),
        );

        let monitor = monitor_with(&mock);
        assert!(monitor.check().await);
        // Fetch failure: still considered in outage, latch not raised
        assert!(monitor.check().await);
        assert!(!monitor.take_outage_latch());
    }

    #[tokio::test]
    async fn test_note_outage_sets_flag() {
        let mock = MockHttpClient::new();
        let monitor = monitor_with(&mock);
        assert!(!monitor.in_outage());
        monitor.note_outage();
        assert!(monitor.in_outage());
        // Idempotent
        monitor.note_outage();
        assert!(monitor.in_outage());
    }

    #[tokio::test(start_paused = true)]
    async fn test_recheck_task_stops_when_outage_clears() {
        let mock = MockHttpClient::new();
        // Outage on the first two checks, healthy afterwards.
        mock.enqueue_response("https://game.example.com/main.php", landing_outage());
        mock.enqueue_response("https://game.example.com/main.php", landing_outage());
        mock.set_response("https://game.example.com/main.php", landing_ok());

        let config = Arc::new(SessionConfig::new(
            "https://game.example.com",
            "user",
            "pass",
        ));
        let (tx, rx) = watch::channel(false);
        let monitor = RolloverMonitor::new(Arc::new(mock.clone()), config, rx);

        assert!(monitor.check().await);

        // Let the self-rescheduling task run through outage -> clear.
        tokio::time::sleep(std::time::Duration::from_secs(300)).await;

        assert!(!monitor.in_outage());
        assert!(monitor.take_outage_latch());

        // Once cleared the task is gone: additional time passes without new
        // landing-page fetches.
        let fetches = mock.requests_to("https://game.example.com/main.php").len();
        tokio::time::sleep(std::time::Duration::from_secs(300)).await;
        assert_eq!(
            mock.requests_to("https://game.example.com/main.php").len(),
            fetches
        );

        drop(tx);
    }

    #[tokio::test(start_paused = true)]
    async fn test_outage_noted_while_task_winding_down_is_not_orphaned() {
        let mock = MockHttpClient::new();
        mock.enqueue_response("https://game.example.com/main.php", landing_outage());
        mock.set_response("https://game.example.com/main.php", landing_ok());

        let monitor = monitor_with(&mock);
        assert!(monitor.check().await);

        // A login-path check observes the clear while the re-check task is
        // still mid-sleep.
        assert!(!monitor.check().await);
        assert!(monitor.take_outage_latch());

        // A fresh outage lands before the task has finished winding down.
        // It must stay owned by a re-check task, not sit until the next
        // login failure.
        monitor.note_outage();
        assert!(monitor.in_outage());

        tokio::time::sleep(std::time::Duration::from_secs(300)).await;
        assert!(!monitor.in_outage());
        assert!(monitor.take_outage_latch());

        // After the task has fully stopped, a later outage spawns a new one.
        mock.set_response("https://game.example.com/main.php", landing_outage());
        monitor.note_outage();
        tokio::time::sleep(std::time::Duration::from_secs(120)).await;
        assert!(monitor.in_outage());
        mock.set_response("https://game.example.com/main.php", landing_ok());
        tokio::time::sleep(std::time::Duration::from_secs(120)).await;
        assert!(!monitor.in_outage());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_recheck_task_mid_outage() {
        let mock = MockHttpClient::new();
        mock.set_response("https://game.example.com/main.php", landing_outage());

        let config = Arc::new(SessionConfig::new(
            "https://game.example.com",
            "user",
            "pass",
        ));
        let (tx, rx) = watch::channel(false);
        let monitor = RolloverMonitor::new(Arc::new(mock.clone()), config, rx);

        assert!(monitor.check().await);
        tokio::time::sleep(std::time::Duration::from_secs(120)).await;
        let fetches_before = mock.requests_to("https://game.example.com/main.php").len();
        assert!(fetches_before > 1);

        tx.send(true).unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(300)).await;
        assert_eq!(
            mock.requests_to("https://game.example.com/main.php").len(),
            fetches_before
        );
        assert!(monitor.in_outage());
    }
}
