use std::sync::Arc;
use std::time::Duration;

use walletkit_api::{AccountBalance, BalanceClient, WalletBridge};
use walletkit_cache::{CacheEntry, CachedValue, RefreshPolicy, SessionSignals, Subscription};

/// Repository for the wallet's aggregate account balance.
///
/// The balance refreshes periodically and eagerly on login. Logout keeps the
/// last figure visible to observers but forces the next read to refresh.
pub struct BalanceService {
    cached_balance: CachedValue<AccountBalance>,
}

impl BalanceService {
    /// Wires the service to its collaborators.
    pub fn new(
        refresh: Duration,
        bridge: Arc<dyn WalletBridge>,
        client: Arc<dyn BalanceClient>,
        signals: &SessionSignals,
    ) -> Self {
        let cached_balance = CachedValue::with_session(
            "balance",
            RefreshPolicy::PeriodicAndLogin { interval: refresh },
            signals,
            move || {
                let bridge = bridge.clone();
                let client = client.clone();
                async move {
                    let xpubs = bridge.wallet_xpubs().await?;
                    client.balance(&xpubs).await
                }
            },
        );
        Self { cached_balance }
    }

    /// The current balance, refreshed when older than the configured
    /// interval.
    pub async fn balance(&self) -> CacheEntry<AccountBalance> {
        self.cached_balance.read().await
    }

    /// Fetches a fresh balance regardless of the cached one's age.
    pub async fn fetch_balance(&self) -> CacheEntry<AccountBalance> {
        self.cached_balance.force_refresh().await
    }

    /// Balance updates; replays the last known balance to new subscribers.
    pub fn observe(&self) -> Subscription<AccountBalance> {
        self.cached_balance.observe()
    }
}
