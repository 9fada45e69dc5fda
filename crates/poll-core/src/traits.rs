//! Boundary traits for the wallet and the deployed contract.
//!
//! The client never talks to a node directly. Everything goes through two
//! small async traits:
//!
//! - [`Wallet`]: account authorization, the active chain, chain switching, and
//!   change notifications. It also binds contract handles to a signing account.
//! - [`PollContract`]: the read, write, and event surface of the poll contract
//!   as seen by one bound account.
//!
//! Writes are split in two calls so the transaction hash is available before
//! confirmation: [`PollContract::send`] returns as soon as the wallet accepts
//! the request, and [`PollContract::wait_for_receipt`] resolves when the
//! network settles it.

use crate::address::{Address, TxHash};
use crate::descriptor::InterfaceDescriptor;
use crate::error::ChainResult;
use crate::event::{EventLog, LogFilter};
use crate::network::{ChainId, NetworkDescriptor};
use crate::poll::{PollId, PollTuple};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// A state-changing contract call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum WriteCall {
    /// `vote(pollId, optionIndex)`
    Vote {
        /// Target poll
        poll: PollId,
        /// Option index
        option: u64,
    },
    /// `createPoll(question, options)`
    CreatePoll {
        /// Question text
        question: String,
        /// Option labels
        options: Vec<String>,
    },
    /// `closePoll(pollId)`
    ClosePoll {
        /// Target poll
        poll: PollId,
    },
    /// `addInstructor(account)`
    AddInstructor {
        /// Account to add
        account: Address,
    },
    /// `removeInstructor(account)`
    RemoveInstructor {
        /// Account to remove
        account: Address,
    },
}

impl WriteCall {
    /// Contract method name.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::Vote { .. } => "vote",
            Self::CreatePoll { .. } => "createPoll",
            Self::ClosePoll { .. } => "closePoll",
            Self::AddInstructor { .. } => "addInstructor",
            Self::RemoveInstructor { .. } => "removeInstructor",
        }
    }
}

/// Confirmation of a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Mined transaction
    pub tx_hash: TxHash,
    /// Including block
    pub block_number: u64,
}

/// Read, write, and event surface of the poll contract for one account.
#[async_trait]
pub trait PollContract: Send + Sync {
    /// Deployed contract address.
    fn address(&self) -> Address;

    /// `getPollCount()`
    async fn poll_count(&self) -> ChainResult<u64>;

    /// `getPoll(pollId)`
    async fn get_poll(&self, poll: PollId) -> ChainResult<PollTuple>;

    /// `hasVoted(pollId, voter)`
    async fn has_voted(&self, poll: PollId, voter: Address) -> ChainResult<bool>;

    /// `owner()`; older shapes answer `ChainError::MethodNotFound`.
    async fn owner(&self) -> ChainResult<Address>;

    /// `isInstructor(account)`; older shapes answer `ChainError::MethodNotFound`.
    async fn is_instructor(&self, account: Address) -> ChainResult<bool>;

    /// Latest block number.
    async fn block_number(&self) -> ChainResult<u64>;

    /// Logs matching `filter`, in chain order.
    async fn get_logs(&self, filter: &LogFilter) -> ChainResult<Vec<EventLog>>;

    /// Submit a write; resolves once the wallet hands back a transaction hash.
    async fn send(&self, call: WriteCall) -> ChainResult<TxHash>;

    /// Wait until `tx` is mined. No client-side timeout.
    async fn wait_for_receipt(&self, tx: TxHash) -> ChainResult<Receipt>;
}

/// Notification pushed by the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// The set of exposed accounts changed
    AccountsChanged(Vec<Address>),
    /// The active chain changed
    ChainChanged(ChainId),
}

/// Browser-wallet style provider.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Ask the user to authorize accounts (may prompt).
    async fn request_accounts(&self) -> ChainResult<Vec<Address>>;

    /// Accounts already authorized, without prompting.
    async fn accounts(&self) -> ChainResult<Vec<Address>>;

    /// Active chain.
    async fn chain_id(&self) -> ChainResult<ChainId>;

    /// Switch the active chain; `ChainError::UnrecognizedChain` if unknown.
    async fn switch_chain(&self, chain: ChainId) -> ChainResult<()>;

    /// Register a network with the wallet.
    async fn add_chain(&self, network: &NetworkDescriptor) -> ChainResult<()>;

    /// Subscribe to account and chain change notifications.
    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;

    /// Build a contract handle whose writes are signed by `account`.
    async fn bind_contract(
        &self,
        account: Address,
        contract: Address,
        descriptor: Arc<InterfaceDescriptor>,
    ) -> ChainResult<Arc<dyn PollContract>>;
}
