//! Helpers for testing the wallet data services.
//!
//! When writing tests, keep the following points in mind:
//!
//!  - In every test, call [`setup`]. This will set up the logger so that all
//!    console output is captured by the test runner.
//!
//!  - Session listeners and fetches run on spawned tasks. After emitting a
//!    session signal, call [`settle`] to let those tasks drain their queues
//!    before asserting on the outcome.
//!
//!  - [`MockWallet`] implements every client seam the services consume, so a
//!    single `Arc<MockWallet>` can be passed for the client, the wallet
//!    bridge, and the settings source.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::fmt;

use walletkit_api::{
    AccountBalance, BalanceClient, FiatCurrency, PairsClient, SettingsSource, SupportedPairs,
    TradingPair, UnspentOutput, UnspentOutputClient, UnspentOutputs, WalletBridge,
};
use walletkit_cache::CacheEntry;

/// Sets up the test environment.
///
/// Initializes logs: the logger only captures logs from the walletkit crates
/// and mutes everything else.
pub fn setup() {
    fmt()
        .with_env_filter(EnvFilter::new(
            "walletkit_cache=trace,walletkit_data=trace,walletkit_api=trace",
        ))
        .with_target(false)
        .pretty()
        .with_test_writer()
        .try_init()
        .ok();
}

/// Lets spawned listener and fetch tasks drain their queues.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// A canned remote value: serves a programmable entry and counts calls.
pub struct Canned<T> {
    entry: Mutex<CacheEntry<T>>,
    calls: AtomicUsize,
}

impl<T: Clone> Canned<T> {
    /// Creates a canned value serving `entry`.
    pub fn new(entry: CacheEntry<T>) -> Self {
        Self {
            entry: Mutex::new(entry),
            calls: AtomicUsize::new(0),
        }
    }

    /// Replaces the entry served to subsequent calls.
    pub fn set(&self, entry: CacheEntry<T>) {
        *self.entry.lock().unwrap() = entry;
    }

    /// How often the value has been fetched.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn produce(&self) -> CacheEntry<T> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.entry.lock().unwrap().clone()
    }
}

/// A plausible account balance.
pub fn sample_balance() -> AccountBalance {
    AccountBalance {
        final_balance: 218_000,
        n_tx: 42,
        total_received: 1_350_000,
    }
}

/// Two spendable outputs across different transactions.
pub fn sample_unspent_outputs() -> UnspentOutputs {
    UnspentOutputs {
        outputs: vec![
            UnspentOutput {
                tx_hash: "3b7a2c18".into(),
                tx_output_n: 1,
                value: 200_000,
                script: "76a914".into(),
                confirmations: 6,
            },
            UnspentOutput {
                tx_hash: "9f0e44d1".into(),
                tx_output_n: 0,
                value: 18_000,
                script: "76a914".into(),
                confirmations: 0,
            },
        ],
    }
}

/// A small set of EUR trading pairs.
pub fn sample_pairs() -> SupportedPairs {
    SupportedPairs {
        pairs: vec![
            TradingPair {
                pair: "BTC-EUR".into(),
                buy_min: 1_000,
                buy_max: 100_000_000,
            },
            TradingPair {
                pair: "ETH-EUR".into(),
                buy_min: 500,
                buy_max: 50_000_000,
            },
        ],
    }
}

/// An in-memory wallet backend implementing every client seam.
///
/// Every field can be reprogrammed mid-test with [`Canned::set`], and every
/// field counts how often the services fetched it.
pub struct MockWallet {
    /// The balance endpoint.
    pub balance: Canned<AccountBalance>,
    /// The unspent outputs endpoint.
    pub unspent: Canned<UnspentOutputs>,
    /// The supported pairs endpoint.
    pub pairs: Canned<SupportedPairs>,
    /// The wallet bridge's account list.
    pub xpubs: Canned<Vec<String>>,
    /// The settings' fiat currency.
    pub fiat: Canned<FiatCurrency>,
}

impl MockWallet {
    /// A wallet backend serving the sample fixtures.
    pub fn new() -> Self {
        Self {
            balance: Canned::new(Ok(sample_balance())),
            unspent: Canned::new(Ok(sample_unspent_outputs())),
            pairs: Canned::new(Ok(sample_pairs())),
            xpubs: Canned::new(Ok(vec!["xpub6CUGRUo".into(), "xpub6DF4mPa".into()])),
            fiat: Canned::new(Ok(FiatCurrency::Eur)),
        }
    }
}

impl Default for MockWallet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BalanceClient for MockWallet {
    async fn balance(&self, _xpubs: &[String]) -> CacheEntry<AccountBalance> {
        self.balance.produce()
    }
}

#[async_trait]
impl UnspentOutputClient for MockWallet {
    async fn unspent_outputs(&self, _addresses: &[String]) -> CacheEntry<UnspentOutputs> {
        self.unspent.produce()
    }
}

#[async_trait]
impl PairsClient for MockWallet {
    async fn supported_pairs(&self, _fiat: FiatCurrency) -> CacheEntry<SupportedPairs> {
        self.pairs.produce()
    }
}

#[async_trait]
impl WalletBridge for MockWallet {
    async fn wallet_xpubs(&self) -> CacheEntry<Vec<String>> {
        self.xpubs.produce()
    }
}

#[async_trait]
impl SettingsSource for MockWallet {
    async fn fiat_currency(&self) -> CacheEntry<FiatCurrency> {
        self.fiat.produce()
    }
}
