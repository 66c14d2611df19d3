use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use walletkit_cache::{CacheEntry, CacheError};

use crate::config::ApiConfig;
use crate::types::{AccountBalance, FiatCurrency, SupportedPairs, UnspentOutputs};

/// The user agent the wallet identifies itself with.
pub const USER_AGENT: &str = concat!("walletkit/", env!("CARGO_PKG_VERSION"));

/// Fetches the wallet's aggregate account balance.
#[async_trait]
pub trait BalanceClient: Send + Sync {
    /// Queries the balance across the given extended public keys.
    async fn balance(&self, xpubs: &[String]) -> CacheEntry<AccountBalance>;
}

/// Fetches the wallet's unspent transaction outputs.
#[async_trait]
pub trait UnspentOutputClient: Send + Sync {
    /// Queries the unspent outputs of the given addresses.
    async fn unspent_outputs(&self, addresses: &[String]) -> CacheEntry<UnspentOutputs>;
}

/// Fetches the trading pairs supported for a fiat currency.
#[async_trait]
pub trait PairsClient: Send + Sync {
    /// Queries the pairs tradable against `fiat`.
    async fn supported_pairs(&self, fiat: FiatCurrency) -> CacheEntry<SupportedPairs>;
}

/// Bridge into the wallet core, supplying the accounts to query.
#[async_trait]
pub trait WalletBridge: Send + Sync {
    /// The extended public keys of all wallet accounts.
    async fn wallet_xpubs(&self) -> CacheEntry<Vec<String>>;
}

/// Source of the user's settings relevant to trading.
#[async_trait]
pub trait SettingsSource: Send + Sync {
    /// The user's preferred fiat currency.
    async fn fiat_currency(&self) -> CacheEntry<FiatCurrency>;
}

/// HTTP client for the wallet API.
///
/// Implements every fetch trait the owning services consume. All endpoints
/// return JSON; transport, authorization and decoding problems are mapped
/// onto [`CacheError`] so they can be handed to joined cache readers as-is.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Creates a client from an existing reqwest client and base URL.
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Creates a client from configuration.
    pub fn from_config(config: &ApiConfig) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to construct the wallet API client")?;
        Ok(Self::new(client, config.base_url.clone()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> CacheEntry<T> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| CacheError::Transport(e.to_string()))?;

        tracing::debug!(%path, "fetching from wallet api");

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let details = response.text().await.unwrap_or_default();
                Err(CacheError::PermissionDenied(details))
            }
            status if !status.is_success() => {
                Err(CacheError::Transport(format!("unexpected status {status}")))
            }
            _ => {
                let bytes = response.bytes().await.map_err(map_reqwest_error)?;
                serde_json::from_slice(&bytes).map_err(|e| CacheError::Malformed(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl BalanceClient for ApiClient {
    async fn balance(&self, xpubs: &[String]) -> CacheEntry<AccountBalance> {
        let active = xpubs.join("|");
        self.get_json("balance", &[("active", active.as_str())]).await
    }
}

#[async_trait]
impl UnspentOutputClient for ApiClient {
    async fn unspent_outputs(&self, addresses: &[String]) -> CacheEntry<UnspentOutputs> {
        let active = addresses.join("|");
        self.get_json("unspent", &[("active", active.as_str())]).await
    }
}

#[async_trait]
impl PairsClient for ApiClient {
    async fn supported_pairs(&self, fiat: FiatCurrency) -> CacheEntry<SupportedPairs> {
        self.get_json("simple-buy/pairs", &[("fiat", fiat.code())])
            .await
    }
}

fn map_reqwest_error(error: reqwest::Error) -> CacheError {
    if error.is_decode() {
        CacheError::Malformed(error.to_string())
    } else {
        CacheError::Transport(error.to_string())
    }
}
