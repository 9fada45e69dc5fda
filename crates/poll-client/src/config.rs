//! Client configuration using Figment.
//!
//! Configuration is merged from, in increasing priority:
//! 1. built-in defaults (Sepolia, the bundled interface descriptor)
//! 2. `poll-board.toml` (or a path given explicitly)
//! 3. environment variables prefixed with `POLL_BOARD_`
//!
//! Nested keys are separated by a double underscore so that snake_case field
//! names survive, e.g. `POLL_BOARD_ACTIVITY__POLL_WINDOW=5000` or
//! `POLL_BOARD_LOGGING__LEVEL=debug`.
//!
//! # Example
//! ```no_run
//! use poll_client::config::ClientConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::load()?;
//! config.validate()?;
//! println!("contract: {}", config.contract_address);
//! # Ok(())
//! # }
//! ```

use crate::error::ConfigError;
use crate::logging::{parse_log_level, LoggingConfig};
use crate::repository::ClosedPollPolicy;
use crate::roles::RoleModel;
use crate::validator::validate_contract_address;
use crate::view::RefreshPolicy;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use poll_core::{Address, NetworkDescriptor};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE: &str = "poll-board.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "POLL_BOARD_";

/// Contract the original deployment points at.
pub const DEFAULT_CONTRACT: &str = "0xb7f2754297f9da369029adb875510dba55dea0b4";

/// Top-level client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Poll contract address, validated at connect time
    pub contract_address: String,
    /// The single network the contract is deployed on
    pub network: NetworkDescriptor,
    /// Interface descriptor file; the bundled descriptor when unset
    pub interface_descriptor: Option<PathBuf>,
    /// Whether closed polls are listed
    pub closed_polls: ClosedPollPolicy,
    /// Which privileged roles the deployment has
    pub role_model: RoleModel,
    /// How concurrent refreshes are reconciled
    pub refresh_policy: RefreshPolicy,
    /// Event-log lookback windows
    pub activity: ActivityConfig,
    /// Logging
    pub logging: LoggingConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            contract_address: DEFAULT_CONTRACT.to_string(),
            network: NetworkDescriptor::sepolia(),
            interface_descriptor: None,
            closed_polls: ClosedPollPolicy::default(),
            role_model: RoleModel::default(),
            refresh_policy: RefreshPolicy::default(),
            activity: ActivityConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Lookback windows for event-log queries, in blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    /// Per-poll creation and vote history
    pub poll_window: u64,
    /// Instructor add/remove replay
    pub roster_window: u64,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            // Roughly a month of Sepolia blocks
            poll_window: 200_000,
            roster_window: 1_000_000,
        }
    }
}

impl ClientConfig {
    /// Load from `poll-board.toml` in the working directory and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(CONFIG_FILE)
    }

    /// Load from a specific file and the environment. A missing file is not
    /// an error; defaults and environment still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Ok(Self::figment(path.as_ref()).extract()?)
    }

    /// The merged provider stack, for callers that layer more on top.
    #[must_use]
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Check values that deserialization cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_contract_address(&self.contract_address).map_err(|e| {
            ConfigError::Invalid(format!(
                "contract_address '{}': {e}",
                self.contract_address
            ))
        })?;

        parse_log_level(&self.logging.level).map_err(ConfigError::Invalid)?;

        if self.activity.poll_window == 0 || self.activity.roster_window == 0 {
            return Err(ConfigError::Invalid(
                "activity windows must be at least one block".to_string(),
            ));
        }
        if self.activity.roster_window < self.activity.poll_window {
            return Err(ConfigError::Invalid(format!(
                "activity.roster_window ({}) must not be smaller than activity.poll_window ({})",
                self.activity.roster_window, self.activity.poll_window
            )));
        }

        if self.network.rpc_urls.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "network '{}' needs at least one RPC URL",
                self.network.chain_name
            )));
        }

        Ok(())
    }

    /// The contract address, parsed.
    pub fn contract(&self) -> Result<Address, ConfigError> {
        validate_contract_address(&self.contract_address)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
