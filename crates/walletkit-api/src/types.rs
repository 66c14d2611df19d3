use std::fmt;

use serde::{Deserialize, Serialize};

/// The aggregate balance of the wallet, in satoshis.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountBalance {
    /// The spendable balance.
    pub final_balance: u64,
    /// Number of transactions the wallet has participated in.
    pub n_tx: u64,
    /// Total amount ever received.
    pub total_received: u64,
}

/// A single unspent transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UnspentOutput {
    /// Hash of the transaction containing this output.
    pub tx_hash: String,
    /// Index of the output within its transaction.
    pub tx_output_n: u32,
    /// Value of the output in satoshis.
    pub value: u64,
    /// The locking script, hex-encoded.
    pub script: String,
    /// Number of confirmations of the containing transaction.
    pub confirmations: u32,
}

/// The set of unspent outputs across all wallet addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UnspentOutputs {
    /// The outputs, in the order the API returned them.
    #[serde(rename = "unspent_outputs")]
    pub outputs: Vec<UnspentOutput>,
}

impl UnspentOutputs {
    /// The summed value of all outputs, in satoshis.
    pub fn total_value(&self) -> u64 {
        self.outputs.iter().map(|output| output.value).sum()
    }
}

/// A fiat currency the trading backend can settle in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FiatCurrency {
    /// United States dollar.
    Usd,
    /// Euro.
    Eur,
    /// Pound sterling.
    Gbp,
}

impl FiatCurrency {
    /// The ISO 4217 code, as used in API query parameters.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
        }
    }
}

impl fmt::Display for FiatCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One tradable crypto/fiat pair with its buy limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TradingPair {
    /// The pair in `"BTC-EUR"` notation.
    pub pair: String,
    /// Minimum buy amount, in minor units of the fiat currency.
    #[serde(rename = "buyMin")]
    pub buy_min: u64,
    /// Maximum buy amount, in minor units of the fiat currency.
    #[serde(rename = "buyMax")]
    pub buy_max: u64,
}

/// The trading pairs supported for the user's fiat currency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SupportedPairs {
    /// All supported pairs.
    pub pairs: Vec<TradingPair>,
}

impl SupportedPairs {
    /// The set served when trading is unavailable.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether no pairs are supported.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
