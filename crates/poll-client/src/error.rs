//! Error types for the poll-board client.
//!
//! One enum per layer, each mapping onto a distinct user-facing treatment:
//!
//! - [`ConfigError`]: fatal to initialization, never retried
//! - [`SessionError`]: connection could not be established
//! - [`ListError`]: the whole listing is replaced by one inline message
//! - [`ActionError`]: shown at the originating control only
//! - [`FormError`]: create-form editing and submission
//! - [`ActivityError`]: shown on the affected card only

use poll_core::{AddressError, ChainError, DraftError, PollId, PollShapeError};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration could not be loaded or is invalid.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Figment failed to merge or extract configuration.
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// A configured value is out of range or malformed.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// The interface descriptor is missing, not an array, or empty.
    #[error("interface descriptor {}: {reason}", path.display())]
    InterfaceDescriptor {
        /// Configured descriptor path
        path: PathBuf,
        /// What went wrong
        reason: String,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

/// Session establishment failed.
#[derive(Error, Debug)]
pub enum SessionError {
    /// No wallet provider is present.
    #[error("No wallet found. Install a browser wallet extension to continue.")]
    WalletUnavailable,

    /// The configured contract address is malformed.
    #[error("Invalid contract address: {0}")]
    InvalidAddress(#[from] AddressError),

    /// The wallet authorized no accounts.
    #[error("No account available. Unlock your wallet and try again.")]
    NoAccount,

    /// Descriptor or other configuration problem.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A wallet call failed.
    #[error("{}", .0.short_message())]
    Chain(#[from] ChainError),

    /// A wallet notification arrived while connecting.
    #[error("Connection superseded by a wallet change")]
    Superseded,
}

/// Result alias for session operations.
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// The poll listing failed as a whole.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListError {
    /// A contract read failed.
    #[error("Error loading polls: {}", .0.short_message())]
    Read(#[from] ChainError),

    /// The contract returned a poll with mismatched options and tallies.
    #[error("Error loading polls: {0}")]
    Malformed(#[from] PollShapeError),
}

/// Result alias for listing.
pub type ListResult<T> = std::result::Result<T, ListError>;

/// Create-form editing or submission was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    /// An eleventh option row was requested.
    #[error("Max 10 options.")]
    TooManyOptions,

    /// Removing a row would leave fewer than two.
    #[error("A poll needs at least two options.")]
    TooFewOptions,

    /// Row index out of range.
    #[error("No option row {0}")]
    NoSuchRow(usize),

    /// Question empty or fewer than two non-empty options.
    #[error("Enter a question and at least two non-empty options.")]
    Incomplete,
}

/// A write action was rejected locally or failed on chain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// No session is active.
    #[error("Connect your wallet first.")]
    NotConnected,

    /// The poll is not in the last listing.
    #[error("Poll #{0} is not loaded")]
    UnknownPoll(PollId),

    /// The poll is closed in the last listing.
    #[error("Poll #{0} is closed")]
    PollClosed(PollId),

    /// The account already voted in the last listing.
    #[error("You already voted")]
    AlreadyVoted(PollId),

    /// Option index out of range.
    #[error("Poll #{poll} has no option {option}")]
    NoSuchOption {
        /// Target poll
        poll: PollId,
        /// Requested option
        option: u64,
    },

    /// The poll draft is invalid.
    #[error(transparent)]
    Draft(#[from] DraftError),

    /// The create form could not be submitted.
    #[error(transparent)]
    Form(#[from] FormError),

    /// An instructor address is malformed.
    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    /// The wallet or contract rejected the call.
    #[error("{}", .0.short_message())]
    Chain(#[from] ChainError),
}

impl ActionError {
    /// Whether the failure happened before anything was sent.
    #[must_use]
    pub fn is_local(&self) -> bool {
        !matches!(self, Self::Chain(_))
    }
}

/// Result alias for write actions.
pub type ActionResult<T> = std::result::Result<T, ActionError>;

/// Activity could not be read for one card.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActivityError {
    /// No session is active.
    #[error("Connect your wallet first.")]
    NotConnected,

    /// The log query failed.
    #[error("Error loading activity: {}", .0.short_message())]
    Read(#[from] ChainError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_error_message() {
        let err = ListError::from(ChainError::Transport("connection refused".to_string()));
        assert_eq!(err.to_string(), "Error loading polls: connection refused");
    }

    #[test]
    fn test_action_error_uses_short_message() {
        let err = ActionError::from(ChainError::UserRejected);
        assert_eq!(err.to_string(), "Request rejected in wallet");
        assert!(!err.is_local());
        assert!(ActionError::AlreadyVoted(PollId(0)).is_local());
    }

    #[test]
    fn test_form_messages() {
        assert_eq!(FormError::TooManyOptions.to_string(), "Max 10 options.");
        assert_eq!(
            FormError::Incomplete.to_string(),
            "Enter a question and at least two non-empty options."
        );
    }
}
