use std::time::Duration;

/// Controls when a [`CachedValue`](crate::CachedValue) refreshes its value.
///
/// A policy is chosen once, at service construction time, and is immutable
/// thereafter. Time-bound policies are evaluated on every read; no background
/// timers are involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Re-fetch on read once the cached value is older than `interval`.
    Periodic {
        /// Maximum age before a read triggers a refresh.
        interval: Duration,
    },
    /// Like [`Periodic`](Self::Periodic), plus an eager fetch when a login
    /// signal arrives. Logout marks the value stale: observers keep the last
    /// value, the next read refreshes.
    PeriodicAndLogin {
        /// Maximum age before a read triggers a refresh.
        interval: Duration,
    },
    /// Fetch on login, clear the value on logout. Not time-bound; a cached
    /// value stays usable until the session ends.
    OnLoginLogout,
    /// Never refreshes on its own. A read fetches only when the cache is
    /// empty; anything beyond that requires an explicit
    /// [`force_refresh`](crate::CachedValue::force_refresh).
    Manual,
}

/// What a policy does with the cached value when a logout signal arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutBehavior {
    /// Logout does not affect the cached value.
    Ignore,
    /// The value stays readable by observers but the next read refreshes.
    MarkStale,
    /// The value is cleared; the next read sees an empty cache.
    Flush,
}

impl RefreshPolicy {
    /// The time-to-live of a cached value, if the policy is time-bound.
    pub fn interval(&self) -> Option<Duration> {
        match self {
            Self::Periodic { interval } | Self::PeriodicAndLogin { interval } => Some(*interval),
            Self::OnLoginLogout | Self::Manual => None,
        }
    }

    /// Whether a login signal triggers an eager fetch.
    pub fn fetches_on_login(&self) -> bool {
        matches!(self, Self::PeriodicAndLogin { .. } | Self::OnLoginLogout)
    }

    /// How a logout signal affects the cached value.
    pub fn logout_behavior(&self) -> LogoutBehavior {
        match self {
            Self::PeriodicAndLogin { .. } => LogoutBehavior::MarkStale,
            Self::OnLoginLogout => LogoutBehavior::Flush,
            Self::Periodic { .. } | Self::Manual => LogoutBehavior::Ignore,
        }
    }

    /// Whether the policy reacts to session lifecycle events at all.
    pub fn reacts_to_session(&self) -> bool {
        self.fetches_on_login() || self.logout_behavior() != LogoutBehavior::Ignore
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_session_reactions() {
        let periodic = RefreshPolicy::Periodic {
            interval: Duration::from_secs(10),
        };
        assert!(!periodic.reacts_to_session());
        assert_eq!(periodic.interval(), Some(Duration::from_secs(10)));

        let login = RefreshPolicy::PeriodicAndLogin {
            interval: Duration::from_secs(10),
        };
        assert!(login.fetches_on_login());
        assert_eq!(login.logout_behavior(), LogoutBehavior::MarkStale);

        assert!(RefreshPolicy::OnLoginLogout.fetches_on_login());
        assert_eq!(
            RefreshPolicy::OnLoginLogout.logout_behavior(),
            LogoutBehavior::Flush
        );
        assert_eq!(RefreshPolicy::OnLoginLogout.interval(), None);

        assert!(!RefreshPolicy::Manual.reacts_to_session());
    }
}
