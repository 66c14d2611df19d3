//! The owning services of the wallet's cached remote values.

use std::sync::Arc;

use walletkit_api::{
    BalanceClient, PairsClient, SettingsSource, UnspentOutputClient, WalletBridge,
};
use walletkit_cache::SessionSignals;

use crate::config::Config;

mod balance;
mod pairs;
mod unspent;

pub use balance::BalanceService;
pub use pairs::SupportedPairsService;
pub use unspent::UnspentOutputRepository;

/// All wallet data services, wired from one configuration.
pub struct WalletServices {
    /// The account balance repository.
    pub balance: BalanceService,
    /// The unspent output repository.
    pub unspent_outputs: UnspentOutputRepository,
    /// The supported trading pairs service.
    pub supported_pairs: SupportedPairsService,
}

impl WalletServices {
    /// Wires all services from one config, client, and signal source.
    ///
    /// This spawns the session listeners, so it must be called within a
    /// tokio runtime.
    pub fn new<C>(
        config: &Config,
        client: Arc<C>,
        bridge: Arc<dyn WalletBridge>,
        settings: Arc<dyn SettingsSource>,
        signals: &SessionSignals,
    ) -> Self
    where
        C: BalanceClient + UnspentOutputClient + PairsClient + 'static,
    {
        tracing::debug!("wiring wallet data services");
        Self {
            balance: BalanceService::new(
                config.caches.balance_refresh,
                bridge.clone(),
                client.clone(),
                signals,
            ),
            unspent_outputs: UnspentOutputRepository::new(
                config.caches.unspent_outputs_refresh,
                bridge,
                client.clone(),
                signals,
            ),
            supported_pairs: SupportedPairsService::new(settings, client, signals),
        }
    }
}
