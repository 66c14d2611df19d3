use std::sync::Arc;
use std::time::Duration;

use walletkit_api::{UnspentOutputClient, UnspentOutputs, WalletBridge};
use walletkit_cache::{CacheEntry, CachedValue, RefreshPolicy, SessionSignals, Subscription};

/// Repository for the wallet's unspent transaction outputs.
///
/// Spendable coins change with every transaction, so the set refreshes on a
/// short interval and eagerly on login. The fetch resolves the wallet's
/// accounts through the bridge first and then queries the API for all of
/// them at once.
pub struct UnspentOutputRepository {
    cached_outputs: CachedValue<UnspentOutputs>,
}

impl UnspentOutputRepository {
    /// Wires the repository to its collaborators.
    pub fn new(
        refresh: Duration,
        bridge: Arc<dyn WalletBridge>,
        client: Arc<dyn UnspentOutputClient>,
        signals: &SessionSignals,
    ) -> Self {
        let cached_outputs = CachedValue::with_session(
            "unspent_outputs",
            RefreshPolicy::PeriodicAndLogin { interval: refresh },
            signals,
            move || {
                let bridge = bridge.clone();
                let client = client.clone();
                async move {
                    let xpubs = bridge.wallet_xpubs().await?;
                    client.unspent_outputs(&xpubs).await
                }
            },
        );
        Self { cached_outputs }
    }

    /// The current unspent outputs, refreshed when older than the configured
    /// interval.
    pub async fn unspent_outputs(&self) -> CacheEntry<UnspentOutputs> {
        self.cached_outputs.read().await
    }

    /// Fetches the unspent outputs regardless of the cached set's age.
    pub async fn fetch_unspent_outputs(&self) -> CacheEntry<UnspentOutputs> {
        self.cached_outputs.force_refresh().await
    }

    /// Output set updates; replays the last known set to new subscribers.
    pub fn observe(&self) -> Subscription<UnspentOutputs> {
        self.cached_outputs.observe()
    }
}
