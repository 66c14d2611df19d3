use std::sync::Mutex;

use tokio::sync::broadcast;

/// Emissions are buffered per subscriber; a subscriber that falls further
/// behind than this skips ahead to the oldest retained emission.
const CHANNEL_CAPACITY: usize = 16;

/// A broadcast channel that retains the last emitted value.
///
/// New subscribers immediately receive the retained value (if any) and then
/// every subsequent emission, in emission order. This is the value stream
/// behind [`CachedValue::observe`](crate::CachedValue::observe), kept as its
/// own small abstraction instead of leaning on a reactive-stream runtime.
#[derive(Debug)]
pub struct Multicast<T> {
    latest: Mutex<Option<T>>,
    sender: broadcast::Sender<T>,
}

impl<T: Clone> Multicast<T> {
    /// Creates a multicast with no retained value and no subscribers.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            latest: Mutex::new(None),
            sender,
        }
    }

    /// Emits `value` to all current subscribers and retains it for future
    /// ones.
    pub fn send(&self, value: T) {
        // The latest slot and the channel are updated under one lock so that
        // a concurrent subscriber can never miss or double-receive a value.
        let mut latest = self.latest.lock().unwrap();
        *latest = Some(value.clone());
        // No subscribers is fine; the value is still retained for replay.
        let _ = self.sender.send(value);
    }

    /// Creates a subscription that replays the retained value first.
    pub fn subscribe(&self) -> Subscription<T> {
        let latest = self.latest.lock().unwrap();
        Subscription {
            replay: latest.clone(),
            receiver: self.sender.subscribe(),
        }
    }
}

impl<T: Clone> Default for Multicast<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A subscription handed out by [`Multicast::subscribe`].
pub struct Subscription<T> {
    replay: Option<T>,
    receiver: broadcast::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
    /// Receives the next value.
    ///
    /// The first call on a fresh subscription yields the value retained at
    /// subscription time, if there was one. Returns `None` once the source is
    /// gone and all emissions have been seen.
    pub async fn next(&mut self) -> Option<T> {
        if let Some(value) = self.replay.take() {
            return Some(value);
        }
        loop {
            match self.receiver.recv().await {
                Ok(value) => return Some(value),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::trace!(skipped, "subscriber lagged, skipping ahead");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
