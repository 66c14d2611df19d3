use std::time::Duration;

use serde::Deserialize;
use url::Url;

/// Controls the HTTP client used to reach the wallet API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL all endpoint paths are resolved against.
    pub base_url: Url,
    /// Maximum time to establish a connection.
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Maximum time for a whole request, from connect to body.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.blockchain.info/".parse().unwrap(),
            connect_timeout: Duration::from_secs(15),
            request_timeout: Duration::from_secs(30),
        }
    }
}
