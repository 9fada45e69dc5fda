//! Simulated browser wallet.
//!
//! [`SimWallet`] holds one exposed account, an authorization flag, the active
//! chain, and the set of chains it knows how to switch to. Scripted controls
//! let tests play the user's part: switching accounts, changing networks from
//! the wallet UI, or rejecting the next prompt.

use crate::chain::SimChain;
use crate::contract::SimContract;
use async_trait::async_trait;
use parking_lot::Mutex;
use poll_core::{
    Address, ChainError, ChainId, ChainResult, InterfaceDescriptor, NetworkDescriptor,
    PollContract, Wallet, WalletEvent,
};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Ethereum mainnet, known to every wallet out of the box.
pub const MAINNET: ChainId = ChainId(1);

/// State shared between a wallet and the contract handles it binds.
#[derive(Debug)]
pub(crate) struct Shared {
    reject_next: AtomicBool,
    active_chain: Mutex<ChainId>,
}

impl Shared {
    /// Consume a pending rejection, failing the prompt if one was armed.
    pub(crate) fn prompt(&self) -> ChainResult<()> {
        if self.reject_next.swap(false, Ordering::SeqCst) {
            Err(ChainError::UserRejected)
        } else {
            Ok(())
        }
    }

    pub(crate) fn active_chain(&self) -> ChainId {
        *self.active_chain.lock()
    }
}

#[derive(Debug)]
struct WalletState {
    accounts: Vec<Address>,
    authorized: bool,
    known_chains: BTreeSet<ChainId>,
    added: Vec<NetworkDescriptor>,
}

/// Wallet provider backed by a [`SimChain`].
#[derive(Debug)]
pub struct SimWallet {
    chain: Arc<SimChain>,
    state: Mutex<WalletState>,
    shared: Arc<Shared>,
    events: broadcast::Sender<WalletEvent>,
}

impl SimWallet {
    /// Wallet exposing `account`, on the chain's network, not yet authorized.
    #[must_use]
    pub fn new(chain: Arc<SimChain>, account: Address) -> Self {
        let active = chain.chain_id();
        let (events, _) = broadcast::channel(16);
        Self {
            state: Mutex::new(WalletState {
                accounts: vec![account],
                authorized: false,
                known_chains: [MAINNET, active].into_iter().collect(),
                added: Vec::new(),
            }),
            shared: Arc::new(Shared {
                reject_next: AtomicBool::new(false),
                active_chain: Mutex::new(active),
            }),
            chain,
            events,
        }
    }

    /// Mark the account as previously authorized (enables auto-connect).
    #[must_use]
    pub fn with_authorization(self) -> Self {
        self.state.lock().authorized = true;
        self
    }

    /// Start on a different chain.
    #[must_use]
    pub fn on_chain(self, chain: ChainId) -> Self {
        *self.shared.active_chain.lock() = chain;
        self.state.lock().known_chains.insert(chain);
        self
    }

    /// Drop a chain from the wallet's known set, so switching to it fails
    /// with "unrecognized chain" until it is added.
    #[must_use]
    pub fn forget_chain(self, chain: ChainId) -> Self {
        self.state.lock().known_chains.remove(&chain);
        self
    }

    /// Fail the next prompt (connect, switch, add, or send) as rejected.
    pub fn reject_next_prompt(&self) {
        self.shared.reject_next.store(true, Ordering::SeqCst);
    }

    /// Change the exposed account, as the user would from the wallet UI.
    pub fn switch_account(&self, account: Address) {
        let accounts = {
            let mut state = self.state.lock();
            state.accounts = vec![account];
            if !state.authorized {
                return;
            }
            state.accounts.clone()
        };
        self.emit(WalletEvent::AccountsChanged(accounts));
    }

    /// Disconnect every account.
    pub fn lock(&self) {
        let mut state = self.state.lock();
        state.accounts.clear();
        state.authorized = false;
        drop(state);
        self.emit(WalletEvent::AccountsChanged(Vec::new()));
    }

    /// Change the active network from the wallet UI.
    pub fn change_chain(&self, chain: ChainId) {
        self.state.lock().known_chains.insert(chain);
        self.set_active(chain);
    }

    /// Active chain.
    #[must_use]
    pub fn active_chain(&self) -> ChainId {
        self.shared.active_chain()
    }

    /// Networks registered through `add_chain`.
    #[must_use]
    pub fn added_networks(&self) -> Vec<NetworkDescriptor> {
        self.state.lock().added.clone()
    }

    fn set_active(&self, chain: ChainId) {
        let previous = std::mem::replace(&mut *self.shared.active_chain.lock(), chain);
        if previous != chain {
            self.emit(WalletEvent::ChainChanged(chain));
        }
    }

    fn emit(&self, event: WalletEvent) {
        tracing::debug!(?event, "SimWallet - emitting event");
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl Wallet for SimWallet {
    async fn request_accounts(&self) -> ChainResult<Vec<Address>> {
        tokio::task::yield_now().await;
        self.shared.prompt()?;
        let mut state = self.state.lock();
        state.authorized = true;
        Ok(state.accounts.clone())
    }

    async fn accounts(&self) -> ChainResult<Vec<Address>> {
        let state = self.state.lock();
        Ok(if state.authorized {
            state.accounts.clone()
        } else {
            Vec::new()
        })
    }

    async fn chain_id(&self) -> ChainResult<ChainId> {
        Ok(self.shared.active_chain())
    }

    async fn switch_chain(&self, chain: ChainId) -> ChainResult<()> {
        tokio::task::yield_now().await;
        self.shared.prompt()?;
        if !self.state.lock().known_chains.contains(&chain) {
            return Err(ChainError::UnrecognizedChain(chain));
        }
        self.set_active(chain);
        Ok(())
    }

    async fn add_chain(&self, network: &NetworkDescriptor) -> ChainResult<()> {
        tokio::task::yield_now().await;
        self.shared.prompt()?;
        {
            let mut state = self.state.lock();
            state.known_chains.insert(network.chain_id);
            state.added.push(network.clone());
        }
        self.set_active(network.chain_id);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }

    async fn bind_contract(
        &self,
        account: Address,
        contract: Address,
        descriptor: Arc<InterfaceDescriptor>,
    ) -> ChainResult<Arc<dyn PollContract>> {
        if !self.state.lock().accounts.contains(&account) {
            return Err(ChainError::Rpc {
                code: 4100,
                message: format!("account {account} is not authorized"),
            });
        }
        Ok(Arc::new(SimContract::new(
            self.chain.clone(),
            self.shared.clone(),
            account,
            contract,
            descriptor,
        )))
    }
}
