//! Errors crossing the wallet and contract boundary.
//!
//! Wallet providers report failures as EIP-1193 style `{ code, message }`
//! pairs. [`ChainError::from_rpc`] maps the codes the client reacts to into
//! dedicated variants:
//!
//! - `4001` user rejected the request: a normal, non-fatal failure
//! - `4902` the wallet does not know the requested chain: triggers add-network
//! - `-32601` method not found: the contract shape lacks an optional read

use crate::network::ChainId;
use thiserror::Error;

/// Result alias for boundary calls.
pub type ChainResult<T> = std::result::Result<T, ChainError>;

/// Failure reported by the wallet, the RPC node, or the contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The user declined a wallet prompt.
    #[error("User rejected the request")]
    UserRejected,

    /// The wallet has no configuration for this chain.
    #[error("Unrecognized chain {0}")]
    UnrecognizedChain(ChainId),

    /// The contract does not expose the called method.
    #[error("Method '{0}' is not available on this contract")]
    MethodNotFound(String),

    /// The call reverted.
    #[error("Execution reverted: {reason}")]
    Reverted {
        /// Revert reason string
        reason: String,
    },

    /// Any other JSON-RPC error.
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// Error message
        message: String,
    },

    /// Transport failed before an answer arrived.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl ChainError {
    /// EIP-1193 "user rejected request".
    pub const USER_REJECTED_CODE: i64 = 4001;
    /// EIP-3326 "unrecognized chain id".
    pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;
    /// JSON-RPC "method not found".
    pub const METHOD_NOT_FOUND_CODE: i64 = -32601;

    /// Classify a raw `{ code, message }` error.
    #[must_use]
    pub fn from_rpc(code: i64, message: impl Into<String>, chain: ChainId) -> Self {
        let message = message.into();
        match code {
            Self::USER_REJECTED_CODE => Self::UserRejected,
            Self::UNRECOGNIZED_CHAIN_CODE => Self::UnrecognizedChain(chain),
            Self::METHOD_NOT_FOUND_CODE => Self::MethodNotFound(message),
            _ => Self::Rpc { code, message },
        }
    }

    /// Numeric code, where one applies.
    #[must_use]
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::UserRejected => Some(Self::USER_REJECTED_CODE),
            Self::UnrecognizedChain(_) => Some(Self::UNRECOGNIZED_CHAIN_CODE),
            Self::MethodNotFound(_) => Some(Self::METHOD_NOT_FOUND_CODE),
            Self::Rpc { code, .. } => Some(*code),
            Self::Reverted { .. } | Self::Transport(_) => None,
        }
    }

    /// The most specific human-readable message available.
    #[must_use]
    pub fn short_message(&self) -> String {
        let text = match self {
            Self::UserRejected => "Request rejected in wallet".to_string(),
            Self::Reverted { reason } if !reason.trim().is_empty() => reason.clone(),
            Self::Reverted { .. } => "Transaction reverted".to_string(),
            Self::Rpc { message, .. } | Self::Transport(message) => message.clone(),
            other => other.to_string(),
        };
        if text.trim().is_empty() {
            "Transaction failed".to_string()
        } else {
            text
        }
    }

    /// Whether the wallet lacks the requested chain.
    #[must_use]
    pub fn is_unrecognized_chain(&self) -> bool {
        matches!(self, Self::UnrecognizedChain(_))
    }
}
