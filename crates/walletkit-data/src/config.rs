//! Configuration for the wallet data layer.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use walletkit_api::ApiConfig;

/// Refresh intervals for the cached wallet values.
///
/// The supported-pairs cache is not time-bound (it follows the session
/// lifecycle instead), so it has no entry here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheIntervals {
    /// Maximum age of the cached account balance.
    #[serde(with = "humantime_serde")]
    pub balance_refresh: Duration,
    /// Maximum age of the cached unspent output set.
    #[serde(with = "humantime_serde")]
    pub unspent_outputs_refresh: Duration,
}

impl Default for CacheIntervals {
    fn default() -> Self {
        Self {
            balance_refresh: Duration::from_secs(30),
            unspent_outputs_refresh: Duration::from_secs(10),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The wallet API endpoint settings.
    pub api: ApiConfig,
    /// Cache refresh tuning.
    pub caches: CacheIntervals,
}

impl Config {
    /// Loads configuration from a YAML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open config file {}", path.display()))?;
        serde_yaml::from_reader(file).context("failed to parse config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intervals_parse_as_humantime() {
        let config: Config = serde_yaml::from_str(
            r#"
            caches:
              balance_refresh: 45s
            "#,
        )
        .unwrap();

        assert_eq!(config.caches.balance_refresh, Duration::from_secs(45));
        // Unset fields keep their defaults.
        assert_eq!(
            config.caches.unspent_outputs_refresh,
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.caches.balance_refresh, Duration::from_secs(30));
        assert_eq!(config.api.base_url.scheme(), "https");
    }
}
