//! Core types and boundary traits for poll-board.
//!
//! This crate holds everything shared between the client and the backends it
//! talks to: identifiers, the poll model, contract events, the interface
//! descriptor, the boundary error taxonomy, and the [`Wallet`] /
//! [`PollContract`] traits. It performs no I/O of its own.

pub mod address;
pub mod descriptor;
pub mod error;
pub mod event;
pub mod network;
pub mod poll;
pub mod probe;
pub mod traits;

pub use address::{Address, AddressError, TxHash};
pub use descriptor::{DescriptorError, InterfaceDescriptor};
pub use error::{ChainError, ChainResult};
pub use event::{ContractEvent, EventKind, EventLog, LogFilter, Topic};
pub use network::{ChainId, NativeCurrency, NetworkDescriptor};
pub use poll::{
    DraftError, Poll, PollDraft, PollEntry, PollId, PollShapeError, PollTuple, MAX_OPTIONS,
    MIN_OPTIONS,
};
pub use probe::Probe;
pub use traits::{PollContract, Receipt, Wallet, WalletEvent, WriteCall};
