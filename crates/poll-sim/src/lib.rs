//! Simulated poll contract and wallet.
//!
//! A [`SimChain`] hosts one deployed poll contract; a [`SimWallet`] plays the
//! browser wallet in front of it and binds [`SimContract`] handles for the
//! active account. Together they implement the `poll_core` boundary traits,
//! so the client can be driven end to end without a node.
//!
//! # Example
//!
//! ```
//! use poll_core::{Address, ChainId, Wallet};
//! use poll_sim::{ContractShape, SimChain, SimWallet};
//! use std::sync::Arc;
//!
//! let owner = Address::from_bytes([1; 20]);
//! let contract = Address::from_bytes([0xcc; 20]);
//! let chain = Arc::new(SimChain::deploy(ChainId::SEPOLIA, contract, owner, ContractShape::Full));
//! let wallet = SimWallet::new(chain, owner).with_authorization();
//! # let _ = wallet.subscribe();
//! ```

pub mod chain;
pub mod contract;
pub mod shape;
pub mod wallet;

pub use chain::{ChainState, MiningMode, PollRecord, SimChain, SimError, TxOutcome};
pub use contract::SimContract;
pub use shape::ContractShape;
pub use wallet::{SimWallet, MAINNET};
