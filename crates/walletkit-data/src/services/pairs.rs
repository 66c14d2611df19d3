use std::sync::Arc;

use walletkit_api::{PairsClient, SettingsSource, SupportedPairs};
use walletkit_cache::{CacheEntry, CachedValue, RefreshPolicy, SessionSignals, Subscription};

/// Service providing the trading pairs supported for the user's fiat
/// currency.
///
/// The supported pairs depend on who is logged in, so the cache follows the
/// session: login fetches the pairs for the new user's currency, logout
/// clears them entirely rather than leaving the previous user's pairs on
/// screen.
pub struct SupportedPairsService {
    cached_pairs: CachedValue<SupportedPairs>,
}

impl SupportedPairsService {
    /// Wires the service to its collaborators.
    pub fn new(
        settings: Arc<dyn SettingsSource>,
        client: Arc<dyn PairsClient>,
        signals: &SessionSignals,
    ) -> Self {
        let cached_pairs = CachedValue::with_session(
            "supported_pairs",
            RefreshPolicy::OnLoginLogout,
            signals,
            move || {
                let settings = settings.clone();
                let client = client.clone();
                async move {
                    let fiat = settings.fiat_currency().await?;
                    client.supported_pairs(fiat).await
                }
            },
        );
        Self { cached_pairs }
    }

    /// The supported pairs for the current session.
    pub async fn pairs(&self) -> CacheEntry<SupportedPairs> {
        self.cached_pairs.read().await
    }

    /// Fetches the supported pairs afresh.
    pub async fn fetch_pairs(&self) -> CacheEntry<SupportedPairs> {
        self.cached_pairs.force_refresh().await
    }

    /// Pair updates; replays the last known pairs to new subscribers.
    pub fn observe(&self) -> Subscription<SupportedPairs> {
        self.cached_pairs.observe()
    }
}
