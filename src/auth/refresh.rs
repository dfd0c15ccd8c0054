//! Single-flight session refresh
//!
//! However many requests fail with 401 at the same time, only one call to the
//! refresh endpoint is made. Every caller that asks for a token while that call
//! is outstanding joins a queue and is settled together with the others once
//! the call completes.
//!
//! The refresh itself runs on a spawned task, so a caller that stops waiting
//! does not cancel the episode for the rest of the queue.

use super::events::{EndReason, SessionEvent, SessionEvents};
use super::types::AuthResponse;
use crate::error::{Error, Result};
use crate::session::{Session, SessionStore};
use parking_lot::Mutex;
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// Why a refresh episode failed, shared with every queued caller
#[derive(Debug, Clone)]
struct RefreshFailure {
    status: Option<u16>,
    message: String,
}

impl From<RefreshFailure> for Error {
    fn from(failure: RefreshFailure) -> Self {
        Error::token_refresh(failure.status, failure.message)
    }
}

type RefreshOutcome = std::result::Result<String, RefreshFailure>;

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
    settled: u64,
}

struct Inner {
    http: Client,
    refresh_url: String,
    store: Arc<dyn SessionStore>,
    events: SessionEvents,
    state: Mutex<RefreshState>,
    refresh_calls: AtomicU64,
}

/// Coordinates token refreshes so at most one is in flight
///
/// Cloning shares the same state.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl RefreshCoordinator {
    /// Create a coordinator.
    ///
    /// `http` must carry the session cookie (cookie store enabled) since the
    /// refresh endpoint identifies the session from it.
    pub fn new(
        http: Client,
        refresh_url: impl Into<String>,
        store: Arc<dyn SessionStore>,
        events: SessionEvents,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                http,
                refresh_url: refresh_url.into(),
                store,
                events,
                state: Mutex::new(RefreshState::default()),
                refresh_calls: AtomicU64::new(0),
            }),
        }
    }

    /// Get a fresh access token to replace `stale`, the token a rejected
    /// request was sent with.
    ///
    /// While no refresh is running, storage is checked first. A stored token
    /// that differs from `stale` was already renewed (or belongs to a new
    /// login) and is returned as is. If the request carried a token but
    /// storage is now empty the session is gone and [`Error::SessionEnded`]
    /// is returned. Otherwise a refresh is started, or joined if one is
    /// already running. `None` always refreshes.
    pub async fn acquire_token(&self, stale: Option<&str>) -> Result<String> {
        loop {
            let seen = self.inner.state.lock().settled;
            let current = match stale {
                Some(_) => self.inner.store.access_token().await?,
                None => None,
            };

            let rx = {
                let mut state = self.inner.state.lock();

                if !state.in_flight {
                    // An episode finished while storage was being read
                    if state.settled != seen {
                        continue;
                    }
                    if let Some(stale) = stale {
                        match current {
                            Some(token) if token != stale => {
                                debug!("Stored token already replaced, skipping refresh");
                                return Ok(token);
                            }
                            None => {
                                debug!("Session ended before refresh was needed");
                                return Err(Error::SessionEnded);
                            }
                            Some(_) => {}
                        }
                    }
                }

                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);

                if state.in_flight {
                    debug!(queued = state.waiters.len(), "Refresh in flight, waiting");
                } else {
                    state.in_flight = true;
                    self.spawn_refresh();
                }
                rx
            };

            return match rx.await {
                Ok(outcome) => outcome.map_err(Error::from),
                Err(_) => Err(Error::token_refresh(
                    None,
                    "refresh task ended without a result",
                )),
            };
        }
    }

    fn spawn_refresh(&self) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let mut guard = SettleGuard {
                inner: Arc::clone(&inner),
                armed: true,
            };

            let episode = tokio::spawn({
                let inner = Arc::clone(&inner);
                async move { inner.run_episode().await }
            });
            let outcome = match episode.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let failure = RefreshFailure {
                        status: None,
                        message: format!("refresh task failed: {e}"),
                    };
                    inner.end_session(&failure).await;
                    Err(failure)
                }
            };

            guard.armed = false;
            inner.settle(outcome);
        });
    }

    /// Whether a refresh call is currently outstanding
    pub fn is_refreshing(&self) -> bool {
        self.inner.state.lock().in_flight
    }

    /// Number of callers waiting on the current episode
    pub fn pending(&self) -> usize {
        self.inner.state.lock().waiters.len()
    }

    /// Total refresh network calls made by this coordinator
    pub fn refresh_calls(&self) -> u64 {
        self.inner.refresh_calls.load(Ordering::Relaxed)
    }

    /// Refresh endpoint URL
    pub fn refresh_url(&self) -> &str {
        &self.inner.refresh_url
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refresh_url", &self.inner.refresh_url)
            .field("is_refreshing", &self.is_refreshing())
            .finish_non_exhaustive()
    }
}

impl Inner {
    /// Call the refresh endpoint and update storage and subscribers.
    ///
    /// Storage is updated (or cleared) and the event emitted before any
    /// waiter is woken.
    async fn run_episode(&self) -> RefreshOutcome {
        match self.call_refresh().await {
            Ok(response) => match self.persist(response).await {
                Ok(token) => {
                    info!("Session refreshed");
                    self.events.emit(SessionEvent::Refreshed);
                    Ok(token)
                }
                Err(failure) => {
                    self.end_session(&failure).await;
                    Err(failure)
                }
            },
            Err(failure) => {
                self.end_session(&failure).await;
                Err(failure)
            }
        }
    }

    async fn call_refresh(&self) -> std::result::Result<AuthResponse, RefreshFailure> {
        self.refresh_calls.fetch_add(1, Ordering::Relaxed);
        debug!(url = %self.refresh_url, "Calling refresh endpoint");

        let response = self
            .http
            .post(&self.refresh_url)
            .send()
            .await
            .map_err(|e| RefreshFailure {
                status: e.status().map(|s| s.as_u16()),
                message: format!("Refresh request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RefreshFailure {
                status: Some(status.as_u16()),
                message: format!("Refresh request failed with status {}: {body}", status.as_u16()),
            });
        }

        let body: AuthResponse = response.json().await.map_err(|e| RefreshFailure {
            status: Some(status.as_u16()),
            message: format!("Invalid refresh response: {e}"),
        })?;

        if body.access_token.trim().is_empty() {
            return Err(RefreshFailure {
                status: Some(status.as_u16()),
                message: "Refresh response did not contain an access token".to_string(),
            });
        }

        Ok(body)
    }

    async fn persist(&self, response: AuthResponse) -> std::result::Result<String, RefreshFailure> {
        let to_failure = |e: Error| RefreshFailure {
            status: None,
            message: format!("Failed to store refreshed session: {e}"),
        };

        let session = match self.store.load().await.map_err(to_failure)? {
            Some(current) => current.refreshed(response.access_token, response.user),
            None => Session::new(response.access_token, response.user),
        };
        self.store.save(&session).await.map_err(to_failure)?;

        Ok(session.access_token)
    }

    async fn end_session(&self, failure: &RefreshFailure) {
        warn!(status = ?failure.status, "Session refresh failed: {}", failure.message);

        // The signal only fires once storage is actually empty
        match self.store.clear().await {
            Ok(()) => self.events.emit(SessionEvent::Ended {
                reason: EndReason::RefreshFailed,
            }),
            Err(e) => error!("Failed to clear session after refresh failure: {e}"),
        }
    }

    /// Reset the episode and wake every queued caller with the outcome
    fn settle(&self, outcome: RefreshOutcome) {
        let waiters = {
            let mut state = self.state.lock();
            state.in_flight = false;
            state.settled += 1;
            std::mem::take(&mut state.waiters)
        };

        debug!(waiters = waiters.len(), ok = outcome.is_ok(), "Refresh settled");
        for waiter in waiters {
            // A receiver that went away no longer needs the result
            let _ = waiter.send(outcome.clone());
        }
    }
}

/// Settles the queue if the refresh task is dropped before finishing.
///
/// A panicking episode is caught through its join handle and ends the
/// session normally. This guard only covers the outer task being dropped,
/// e.g. at runtime shutdown, where storage can no longer be touched.
struct SettleGuard {
    inner: Arc<Inner>,
    armed: bool,
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        if self.armed {
            warn!("Refresh task aborted before completing");
            self.inner.settle(Err(RefreshFailure {
                status: None,
                message: "refresh task aborted".to_string(),
            }));
        }
    }
}
