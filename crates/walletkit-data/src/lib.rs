//! The wallet's data services.
//!
//! Every remote value a screen displays is owned by exactly one service in
//! this crate. A service constructs one
//! [`CachedValue`](walletkit_cache::CachedValue), supplies it a fetch
//! function closing over the API client, and republishes the cache's
//! accessors under domain names. All collaborators (client, wallet bridge,
//! settings, session signals) are explicit constructor arguments.

#![warn(missing_docs)]

pub mod config;
pub mod logging;
pub mod services;

pub use config::{CacheIntervals, Config};
pub use services::{
    BalanceService, SupportedPairsService, UnspentOutputRepository, WalletServices,
};
