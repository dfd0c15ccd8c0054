//! Session lifecycle events
//!
//! Broadcasts session changes to any part of the application that
//! subscribes, e.g. a top-level controller that sends the user back to a
//! login screen when the session ends.

use tokio::sync::broadcast;
use tracing::debug;

const DEFAULT_CAPACITY: usize = 16;

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The refresh endpoint rejected the session or could not be reached
    RefreshFailed,
    /// The user logged out
    LoggedOut,
}

/// A change in the session lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session was created by login or registration
    Started,
    /// The access token was renewed
    Refreshed,
    /// The session was destroyed and storage cleared
    Ended { reason: EndReason },
}

/// Broadcast channel for session events
///
/// Cloning shares the same channel.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a channel that buffers up to `capacity` unread events per subscriber
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Emit an event to all current subscribers
    pub fn emit(&self, event: SessionEvent) {
        // No subscribers is not an error
        let delivered = self.sender.send(event.clone()).unwrap_or(0);
        debug!(?event, subscribers = delivered, "Session event emitted");
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}
