//! Contract address and network checks.
//!
//! Address validation runs before any wallet call so a misconfigured
//! deployment (most often a transaction hash pasted where the contract
//! address belongs) fails fast without prompting the user.

use poll_core::{Address, AddressError, ChainError, ChainId, ChainResult, NetworkDescriptor, Wallet};

/// Validate the configured contract address.
///
/// Accepts exactly `0x` followed by 40 hex digits. Nothing is trimmed.
pub fn validate_contract_address(input: &str) -> Result<Address, AddressError> {
    Address::parse(input)
}

/// Comparison of the wallet's active chain against the expected one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkCheck {
    /// Chain the deployment targets
    pub expected: ChainId,
    /// Chain the wallet reports
    pub actual: ChainId,
    /// Display name of the expected network
    pub name: String,
}

impl NetworkCheck {
    /// Compare `actual` against `network`.
    #[must_use]
    pub fn new(network: &NetworkDescriptor, actual: ChainId) -> Self {
        Self {
            expected: network.chain_id,
            actual,
            name: network.chain_name.clone(),
        }
    }

    /// Whether the wallet is on the expected chain.
    #[must_use]
    pub fn matches(&self) -> bool {
        self.expected == self.actual
    }

    /// Whether to offer the "switch network" action.
    #[must_use]
    pub fn switch_visible(&self) -> bool {
        !self.matches()
    }

    /// Network indicator text.
    #[must_use]
    pub fn status_label(&self) -> String {
        if self.matches() {
            self.name.clone()
        } else {
            "Wrong network".to_string()
        }
    }
}

/// Ask the wallet for its active chain and compare.
pub async fn check_network(
    wallet: &dyn Wallet,
    network: &NetworkDescriptor,
) -> ChainResult<NetworkCheck> {
    let actual = wallet.chain_id().await?;
    let check = NetworkCheck::new(network, actual);
    tracing::debug!(
        expected = %check.expected,
        actual = %check.actual,
        matches = check.matches(),
        "check_network()"
    );
    Ok(check)
}

/// Switch the wallet to `network`, registering it first if the wallet does
/// not know the chain.
pub async fn switch_network(wallet: &dyn Wallet, network: &NetworkDescriptor) -> ChainResult<()> {
    match wallet.switch_chain(network.chain_id).await {
        Ok(()) => Ok(()),
        Err(ChainError::UnrecognizedChain(chain)) => {
            tracing::info!(
                chain = %chain,
                name = %network.chain_name,
                "switch_network() - adding network to wallet"
            );
            wallet.add_chain(network).await
        }
        Err(err) => {
            tracing::warn!(error = %err, "switch_network() - switch failed");
            Err(err)
        }
    }
}
