use tokio::sync::broadcast;

/// Events are buffered per subscriber; a listener that falls further behind
/// than this skips ahead.
const CHANNEL_CAPACITY: usize = 16;

/// An application-wide session lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A user finished logging in.
    LoggedIn,
    /// The user's session ended.
    LoggedOut,
}

/// Cloneable source of session lifecycle events.
///
/// Caches built with a session-reactive [`RefreshPolicy`](crate::RefreshPolicy)
/// subscribe to these events at construction time. Emitting never blocks:
/// events are delivered asynchronously to whatever listeners exist at that
/// moment.
#[derive(Debug, Clone)]
pub struct SessionSignals {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionSignals {
    /// Creates a new signal source with no subscribers.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Announces a completed login.
    pub fn logged_in(&self) {
        self.send(SessionEvent::LoggedIn);
    }

    /// Announces a completed logout.
    pub fn logged_out(&self) {
        self.send(SessionEvent::LoggedOut);
    }

    fn send(&self, event: SessionEvent) {
        // An event with no listeners is fine, it is simply dropped.
        if self.sender.send(event).is_err() {
            tracing::trace!(?event, "session event emitted without listeners");
        }
    }

    /// Subscribes to all future session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl Default for SessionSignals {
    fn default() -> Self {
        Self::new()
    }
}
