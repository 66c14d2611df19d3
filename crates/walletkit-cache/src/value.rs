use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, Weak};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::broadcast;

use crate::multicast::{Multicast, Subscription};
use crate::policy::{LogoutBehavior, RefreshPolicy};
use crate::session::{SessionEvent, SessionSignals};
use crate::time::Instant;
use crate::{CacheEntry, CacheError};

type FetchFn<T> = Box<dyn Fn() -> BoxFuture<'static, CacheEntry<T>> + Send + Sync>;

/// The memoized handle to an in-flight fetch. Every caller that triggers a
/// refresh while this exists joins it instead of starting a second fetch.
type InflightFetch<T> = Shared<BoxFuture<'static, CacheEntry<T>>>;

/// The lifecycle state of a [`CachedValue`], derived from its internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// No value is cached and no fetch is running.
    Idle,
    /// A fetch is in flight.
    Fetching,
    /// A value is cached and usable under the cache's policy.
    Valid,
    /// A value is cached but the next read will refresh it.
    Stale,
}

/// A single remote value with policy-driven refresh and request coalescing.
///
/// The cache owns the last successfully fetched value and a handle to the
/// fetch function supplied by the owning service; it knows nothing about
/// *how* the value is produced. At most one fetch is in flight at any time:
/// concurrent callers that trigger a refresh all await the same operation and
/// receive the same result, or the same error if it fails.
///
/// A failed fetch never touches the cached value. The error is surfaced only
/// to the callers of that attempt, the previous value (if any) stays
/// readable, and the cache becomes eligible for a retry on the next read.
/// The cache itself never retries.
pub struct CachedValue<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for CachedValue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<T> {
    name: &'static str,
    policy: RefreshPolicy,
    fetch: FetchFn<T>,
    state: Mutex<State<T>>,
    multicast: Multicast<T>,
}

struct State<T> {
    value: Option<T>,
    fetched_at: Option<Instant>,
    stale: bool,
    /// Bumped whenever the value is flushed. A fetch that started before the
    /// flush must not resurrect the flushed value when it completes.
    epoch: u64,
    inflight: Option<InflightFetch<T>>,
}

impl<T> Default for State<T> {
    fn default() -> Self {
        Self {
            value: None,
            fetched_at: None,
            stale: false,
            epoch: 0,
            inflight: None,
        }
    }
}

impl<T: Clone> State<T> {
    /// Returns the cached value if it is usable under `policy` right now.
    fn usable_value(&self, policy: &RefreshPolicy) -> Option<T> {
        let value = self.value.as_ref()?;
        if self.stale {
            return None;
        }
        if let Some(interval) = policy.interval() {
            let fetched_at = self.fetched_at?;
            if Instant::now().duration_since(fetched_at) > interval {
                return None;
            }
        }
        Some(value.clone())
    }
}

impl<T> fmt::Debug for CachedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("CachedValue");
        s.field("name", &self.inner.name)
            .field("policy", &self.inner.policy);
        if let Ok(state) = self.inner.state.try_lock() {
            s.field("has_value", &state.value.is_some())
                .field("fetching", &state.inflight.is_some());
        }
        s.finish()
    }
}

impl<T> CachedValue<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a cache that does not listen to session lifecycle events.
    ///
    /// `fetch` is invoked whenever the cache decides to refresh; it is never
    /// invoked while a previous fetch is still in flight.
    pub fn new<F, Fut>(name: &'static str, policy: RefreshPolicy, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CacheEntry<T>> + Send + 'static,
    {
        let inner = Arc::new(Inner {
            name,
            policy,
            fetch: Box::new(move || fetch().boxed()),
            state: Mutex::new(State::default()),
            multicast: Multicast::new(),
        });
        Self { inner }
    }

    /// Creates a cache wired to a session lifecycle source.
    ///
    /// For policies that react to login/logout a listener task is spawned,
    /// so this must be called within a tokio runtime. The listener holds
    /// only a weak reference and exits once the cache is dropped.
    pub fn with_session<F, Fut>(
        name: &'static str,
        policy: RefreshPolicy,
        signals: &SessionSignals,
        fetch: F,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CacheEntry<T>> + Send + 'static,
    {
        let this = Self::new(name, policy, fetch);
        if policy.reacts_to_session() {
            this.spawn_session_listener(signals);
        }
        this
    }

    fn spawn_session_listener(&self, signals: &SessionSignals) {
        let mut events = signals.subscribe();
        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let Some(inner) = Weak::upgrade(&weak) else {
                    break;
                };
                match event {
                    SessionEvent::LoggedIn if inner.policy.fetches_on_login() => {
                        tracing::debug!(cache = inner.name, "login signal, refreshing");
                        if let Err(error) = Inner::refresh(&inner).await {
                            tracing::warn!(cache = inner.name, %error, "login-triggered refresh failed");
                        }
                    }
                    SessionEvent::LoggedOut => match inner.policy.logout_behavior() {
                        LogoutBehavior::Flush => {
                            tracing::debug!(cache = inner.name, "logout signal, flushing");
                            inner.flush();
                        }
                        LogoutBehavior::MarkStale => {
                            tracing::debug!(cache = inner.name, "logout signal, marking stale");
                            inner.state.lock().unwrap().stale = true;
                        }
                        LogoutBehavior::Ignore => {}
                    },
                    _ => {}
                }
            }
        });
    }

    /// Returns the cached value, refreshing it first if the policy demands.
    ///
    /// Resolves immediately with the current value while it is usable. When
    /// it is absent, stale, or expired, this triggers a fetch, or joins the
    /// one already in flight, and resolves once that fetch completes.
    pub async fn read(&self) -> CacheEntry<T> {
        let fetch = {
            let mut state = self.inner.state.lock().unwrap();
            if let Some(inflight) = &state.inflight {
                tracing::trace!(cache = self.inner.name, "joining in-flight fetch");
                inflight.clone()
            } else if let Some(value) = state.usable_value(&self.inner.policy) {
                tracing::trace!(cache = self.inner.name, "serving cached value");
                return Ok(value);
            } else {
                Inner::start_fetch(&self.inner, &mut state)
            }
        };
        fetch.await
    }

    /// Unconditionally refreshes, ignoring the policy's time-to-live.
    ///
    /// Joins an already in-flight fetch rather than queueing a second one.
    pub async fn force_refresh(&self) -> CacheEntry<T> {
        Inner::refresh(&self.inner).await
    }

    /// A stream of successful refreshes.
    ///
    /// The subscription immediately replays the last known value (if any) and
    /// then yields every subsequent successful fetch, in completion order.
    /// Failed fetches are never emitted here.
    pub fn observe(&self) -> Subscription<T> {
        self.inner.multicast.subscribe()
    }

    /// Clears the cached value; the next read starts from an empty cache.
    ///
    /// A fetch that is in flight at this point still resolves for its
    /// callers, but its result is discarded instead of being cached.
    pub fn invalidate(&self) {
        self.inner.flush();
    }

    /// The current lifecycle state of the cache.
    pub fn status(&self) -> Status {
        let state = self.inner.state.lock().unwrap();
        if state.inflight.is_some() {
            return Status::Fetching;
        }
        if state.value.is_none() {
            return Status::Idle;
        }
        match state.usable_value(&self.inner.policy) {
            Some(_) => Status::Valid,
            None => Status::Stale,
        }
    }
}

impl<T> Inner<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Triggers a fetch, or joins the in-flight one.
    async fn refresh(inner: &Arc<Self>) -> CacheEntry<T> {
        let fetch = {
            let mut state = inner.state.lock().unwrap();
            match &state.inflight {
                Some(inflight) => inflight.clone(),
                None => Self::start_fetch(inner, &mut state),
            }
        };
        fetch.await
    }

    /// Spawns the fetch task and memoizes its handle.
    ///
    /// The task drives the fetch to completion on its own, so the fetch
    /// finishes even if every caller stops awaiting it.
    fn start_fetch(inner: &Arc<Self>, state: &mut State<T>) -> InflightFetch<T> {
        tracing::debug!(cache = inner.name, "starting fetch");
        let epoch = state.epoch;
        let fetch = (inner.fetch)();
        let task_inner = Arc::clone(inner);
        let task = tokio::spawn(async move {
            let entry = fetch.await;
            task_inner.complete_fetch(entry, epoch)
        });
        let fetch = task
            .map(|result| result.unwrap_or(Err(CacheError::TornDown)))
            .boxed()
            .shared();
        state.inflight = Some(fetch.clone());
        fetch
    }

    /// Applies a finished fetch to the cache state.
    ///
    /// Only a successful fetch may overwrite the cached value, and only if no
    /// flush happened while it was in flight. Emissions happen under the
    /// state lock, so observers see values strictly in completion order.
    fn complete_fetch(&self, entry: CacheEntry<T>, epoch: u64) -> CacheEntry<T> {
        let mut state = self.state.lock().unwrap();
        state.inflight = None;
        match &entry {
            Ok(value) if state.epoch == epoch => {
                state.value = Some(value.clone());
                state.fetched_at = Some(Instant::now());
                state.stale = false;
                self.multicast.send(value.clone());
            }
            Ok(_) => {
                tracing::debug!(cache = self.name, "discarding fetch result after flush");
            }
            Err(error) => {
                tracing::warn!(cache = self.name, %error, "fetch failed");
            }
        }
        entry
    }

    fn flush(&self) {
        let mut state = self.state.lock().unwrap();
        state.value = None;
        state.fetched_at = None;
        state.stale = false;
        state.epoch += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::time::{self, Duration};

    use super::*;

    /// A fetch function yielding 0, 1, 2, ... and counting its invocations.
    fn counting_fetch(
        calls: Arc<AtomicUsize>,
    ) -> impl Fn() -> BoxFuture<'static, CacheEntry<usize>> + Send + Sync + 'static {
        move || {
            let n = calls.fetch_add(1, Ordering::Relaxed);
            async move {
                tokio::task::yield_now().await;
                Ok(n)
            }
            .boxed()
        }
    }

    /// Lets spawned listener and fetch tasks drain their queues.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_concurrent_reads_share_one_fetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = CachedValue::new("coalesce", RefreshPolicy::Manual, counting_fetch(calls.clone()));

        let res = futures::join!(cache.read(), cache.read(), cache.read());
        assert_eq!((res.0.unwrap(), res.1.unwrap(), res.2.unwrap()), (0, 0, 0));
        assert_eq!(calls.load(Ordering::Relaxed), 1);

        // The value is now cached; further reads do not fetch under `Manual`.
        assert_eq!(cache.read().await.unwrap(), 0);
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_eq!(cache.status(), Status::Valid);
    }

    #[tokio::test]
    async fn test_joined_callers_share_one_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = CachedValue::<usize>::new("errors", RefreshPolicy::Manual, {
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::Relaxed);
                async move {
                    tokio::task::yield_now().await;
                    Err(CacheError::Transport("connection reset".into()))
                }
                .boxed()
            }
        });

        let res = futures::join!(cache.read(), cache.read());
        assert_eq!(res.0, res.1);
        assert_eq!(
            res.0.unwrap_err(),
            CacheError::Transport("connection reset".into())
        );
        assert_eq!(calls.load(Ordering::Relaxed), 1);

        // The failure left the cache in a retryable state.
        assert_eq!(cache.status(), Status::Idle);
        assert!(cache.read().await.is_err());
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_value() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = CachedValue::new("keep", RefreshPolicy::Manual, {
            let calls = calls.clone();
            move || {
                let n = calls.fetch_add(1, Ordering::Relaxed);
                async move {
                    match n {
                        1 => Err(CacheError::Transport("gone away".into())),
                        n => Ok(n),
                    }
                }
                .boxed()
            }
        });

        let mut updates = cache.observe();
        assert_eq!(cache.read().await.unwrap(), 0);
        assert_eq!(updates.next().await, Some(0));

        assert!(cache.force_refresh().await.is_err());
        // The old value is still served and the failure was not emitted.
        assert_eq!(cache.read().await.unwrap(), 0);
        assert_eq!(cache.status(), Status::Valid);

        // The next emission is the next successful refresh.
        assert_eq!(cache.force_refresh().await.unwrap(), 2);
        assert_eq!(updates.next().await, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_refreshes_after_interval() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = CachedValue::new(
            "ttl",
            RefreshPolicy::Periodic {
                interval: Duration::from_secs(10),
            },
            counting_fetch(calls.clone()),
        );

        assert_eq!(cache.read().await.unwrap(), 0);

        time::advance(Duration::from_secs(5)).await;
        assert_eq!(cache.read().await.unwrap(), 0);
        assert_eq!(calls.load(Ordering::Relaxed), 1);

        time::advance(Duration::from_secs(6)).await;
        assert_eq!(cache.status(), Status::Stale);
        assert_eq!(cache.read().await.unwrap(), 1);
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_observe_replays_latest_to_late_subscribers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = CachedValue::new("observe", RefreshPolicy::Manual, counting_fetch(calls.clone()));

        let mut early = cache.observe();
        cache.read().await.unwrap();

        let mut late = cache.observe();
        assert_eq!(early.next().await, Some(0));
        assert_eq!(late.next().await, Some(0));

        cache.force_refresh().await.unwrap();
        assert_eq!(early.next().await, Some(1));
        assert_eq!(late.next().await, Some(1));
    }

    #[tokio::test]
    async fn test_login_triggers_eager_fetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let signals = SessionSignals::new();
        let cache = CachedValue::with_session(
            "login",
            RefreshPolicy::PeriodicAndLogin {
                interval: Duration::from_secs(3600),
            },
            &signals,
            counting_fetch(calls.clone()),
        );

        assert_eq!(cache.read().await.unwrap(), 0);

        // The TTL has not elapsed, but login refreshes regardless.
        signals.logged_in();
        settle().await;
        assert_eq!(calls.load(Ordering::Relaxed), 2);
        assert_eq!(cache.read().await.unwrap(), 1);
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_logout_flushes_login_logout_policy() {
        let calls = Arc::new(AtomicUsize::new(0));
        let signals = SessionSignals::new();
        let cache = CachedValue::with_session(
            "flush",
            RefreshPolicy::OnLoginLogout,
            &signals,
            counting_fetch(calls.clone()),
        );

        assert_eq!(cache.read().await.unwrap(), 0);

        signals.logged_out();
        settle().await;
        assert_eq!(cache.status(), Status::Idle);
        assert_eq!(cache.read().await.unwrap(), 1);
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_logout_marks_periodic_and_login_stale() {
        let calls = Arc::new(AtomicUsize::new(0));
        let signals = SessionSignals::new();
        let cache = CachedValue::with_session(
            "stale",
            RefreshPolicy::PeriodicAndLogin {
                interval: Duration::from_secs(3600),
            },
            &signals,
            counting_fetch(calls.clone()),
        );

        assert_eq!(cache.read().await.unwrap(), 0);

        signals.logged_out();
        settle().await;
        assert_eq!(cache.status(), Status::Stale);

        // Observers keep the last value while it is stale.
        let mut updates = cache.observe();
        assert_eq!(updates.next().await, Some(0));

        assert_eq!(cache.read().await.unwrap(), 1);
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_flush_discards_in_flight_result() {
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(tokio::sync::Notify::new());
        let cache = CachedValue::new("discard", RefreshPolicy::Manual, {
            let calls = calls.clone();
            let gate = gate.clone();
            move || {
                let n = calls.fetch_add(1, Ordering::Relaxed);
                let gate = gate.clone();
                async move {
                    if n == 0 {
                        gate.notified().await;
                    }
                    Ok(n)
                }
                .boxed()
            }
        });

        let read = tokio::spawn({
            let cache = cache.clone();
            async move { cache.read().await }
        });
        settle().await;
        assert_eq!(cache.status(), Status::Fetching);

        cache.invalidate();
        gate.notify_one();
        // The caller of the flushed attempt still gets its result.
        assert_eq!(read.await.unwrap().unwrap(), 0);
        // But the cache did not resurrect it.
        assert_eq!(cache.status(), Status::Idle);
        assert_eq!(cache.read().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_listener_exits_after_teardown() {
        let calls = Arc::new(AtomicUsize::new(0));
        let signals = SessionSignals::new();
        let cache = CachedValue::with_session(
            "teardown",
            RefreshPolicy::OnLoginLogout,
            &signals,
            counting_fetch(calls.clone()),
        );

        assert_eq!(cache.read().await.unwrap(), 0);
        drop(cache);

        signals.logged_in();
        settle().await;
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }
}
