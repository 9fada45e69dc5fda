//! Target network description.
//!
//! A [`NetworkDescriptor`] carries everything a wallet needs to add an unknown
//! network (chain id, display name, RPC endpoints, native currency, explorer)
//! and everything the client needs to build explorer links.

use crate::address::{Address, TxHash};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Chain identifier parse error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid chain id '{0}'")]
pub struct ChainIdError(pub String);

/// Numeric chain identifier, displayed in `0x`-hex form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(pub u64);

impl ChainId {
    /// Sepolia test network (11155111).
    pub const SEPOLIA: ChainId = ChainId(11_155_111);

    /// Hex form used on the wallet boundary, e.g. `0xaa36a7`.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("{:#x}", self.0)
    }
}

impl FromStr for ChainId {
    type Err = ChainIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(digits) => u64::from_str_radix(digits, 16),
            None => trimmed.parse::<u64>(),
        };
        parsed.map(ChainId).map_err(|_| ChainIdError(s.to_string()))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl Serialize for ChainId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(ChainId(n)),
            Repr::Text(text) => text.parse().map_err(de::Error::custom),
        }
    }
}

/// Native currency metadata for a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    /// Display name, e.g. "Sepolia ETH"
    pub name: String,
    /// Ticker symbol
    pub symbol: String,
    /// Decimal places
    pub decimals: u8,
}

/// Full description of the single network this deployment targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDescriptor {
    /// Chain identifier
    pub chain_id: ChainId,
    /// Human-readable network name
    pub chain_name: String,
    /// JSON-RPC endpoints
    pub rpc_urls: Vec<Url>,
    /// Native currency metadata
    pub native_currency: NativeCurrency,
    /// Block explorer base URLs (first one is used for links)
    #[serde(default)]
    pub block_explorer_urls: Vec<Url>,
}

impl NetworkDescriptor {
    /// The Sepolia test network.
    #[must_use]
    pub fn sepolia() -> Self {
        Self {
            chain_id: ChainId::SEPOLIA,
            chain_name: "Sepolia".to_string(),
            rpc_urls: parse_urls(&["https://rpc.sepolia.org"]),
            native_currency: NativeCurrency {
                name: "Sepolia ETH".to_string(),
                symbol: "ETH".to_string(),
                decimals: 18,
            },
            block_explorer_urls: parse_urls(&["https://sepolia.etherscan.io/"]),
        }
    }

    /// Explorer link for a transaction, if an explorer is configured.
    #[must_use]
    pub fn tx_url(&self, tx: &TxHash) -> Option<Url> {
        self.explorer_join(&format!("tx/{tx}"))
    }

    /// Explorer link for an address, if an explorer is configured.
    #[must_use]
    pub fn address_url(&self, address: &Address) -> Option<Url> {
        self.explorer_join(&format!("address/{address}"))
    }

    fn explorer_join(&self, path: &str) -> Option<Url> {
        let base = self.block_explorer_urls.first()?;
        // Url::join drops the last segment unless the base ends with '/'
        let mut base = base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(path).ok()
    }

    /// Parameters for an add-network request in the wallet's camelCase shape.
    #[must_use]
    pub fn add_chain_params(&self) -> serde_json::Value {
        serde_json::json!({
            "chainId": self.chain_id.to_hex(),
            "chainName": self.chain_name,
            "rpcUrls": self.rpc_urls.iter().map(Url::as_str).collect::<Vec<_>>(),
            "nativeCurrency": {
                "name": self.native_currency.name,
                "symbol": self.native_currency.symbol,
                "decimals": self.native_currency.decimals,
            },
            "blockExplorerUrls": self
                .block_explorer_urls
                .iter()
                .map(Url::as_str)
                .collect::<Vec<_>>(),
        })
    }
}

impl Default for NetworkDescriptor {
    fn default() -> Self {
        Self::sepolia()
    }
}

fn parse_urls(urls: &[&str]) -> Vec<Url> {
    urls.iter().filter_map(|u| Url::parse(u).ok()).collect()
}
