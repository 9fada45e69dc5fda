//! Shared fixtures for board integration tests.
//!
//! - `Fixture`: a deployed simulated contract, a wallet in front of it, and a
//!   board wired to both
//! - `HeldWallet`: a wallet that can park its next `accounts()` call, so a
//!   test can look at the board halfway through a reconnect
//! - address constants for the owner and two other accounts

#![allow(dead_code)] // Not every test file uses every helper

use async_trait::async_trait;
use poll_client::{Action, ClientConfig, PollBoard};
use poll_core::{
    Address, ChainId, ChainResult, InterfaceDescriptor, NetworkDescriptor, PollContract,
    PollDraft, PollId, Wallet, WalletEvent,
};
use poll_sim::{ContractShape, SimChain, SimWallet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Notify};

pub const OWNER: Address = Address::from_bytes([0x01; 20]);
pub const ALICE: Address = Address::from_bytes([0xa1; 20]);
pub const BOB: Address = Address::from_bytes([0xb0; 20]);
pub const CONTRACT: Address = Address::from_bytes([0xcc; 20]);

pub struct Fixture {
    pub chain: Arc<SimChain>,
    pub wallet: Arc<SimWallet>,
    pub board: Arc<PollBoard>,
}

/// Config pointing at [`CONTRACT`] on Sepolia.
pub fn config() -> ClientConfig {
    ClientConfig {
        contract_address: CONTRACT.to_string(),
        ..ClientConfig::default()
    }
}

pub fn deploy(shape: ContractShape) -> Arc<SimChain> {
    Arc::new(SimChain::deploy(ChainId::SEPOLIA, CONTRACT, OWNER, shape))
}

impl Fixture {
    /// Full contract, owner wallet already authorized.
    pub fn new() -> Self {
        Self::with(ContractShape::Full, OWNER, config())
    }

    pub fn with(shape: ContractShape, account: Address, config: ClientConfig) -> Self {
        let chain = deploy(shape);
        let wallet = Arc::new(SimWallet::new(chain.clone(), account).with_authorization());
        Self::over(chain, wallet, config)
    }

    pub fn over(chain: Arc<SimChain>, wallet: Arc<SimWallet>, config: ClientConfig) -> Self {
        let board = Arc::new(PollBoard::new(
            config,
            Some(wallet.clone() as Arc<dyn Wallet>),
        ));
        Self {
            chain,
            wallet,
            board,
        }
    }

    /// Full contract with the owner's wallet behind a [`HeldWallet`].
    pub fn held() -> (Self, Arc<HeldWallet>) {
        let chain = deploy(ContractShape::Full);
        let wallet = Arc::new(SimWallet::new(chain.clone(), OWNER).with_authorization());
        let held = Arc::new(HeldWallet::new(wallet.clone()));
        let board = Arc::new(PollBoard::new(
            config(),
            Some(held.clone() as Arc<dyn Wallet>),
        ));
        let fx = Self {
            chain,
            wallet,
            board,
        };
        (fx, held)
    }

    /// Create a poll through the board and return its id.
    pub async fn create_poll(&self, question: &str, options: &[&str]) -> PollId {
        let before = self.board.snapshot().map_or(0, |l| l.total);
        let draft = PollDraft::new(question, options.iter().copied()).unwrap();
        self.board.dispatch(Action::CreatePoll(draft)).await.unwrap();
        PollId(before)
    }

    /// Switch the wallet to `account` and let the board react.
    pub async fn switch_to(&self, account: Address) {
        self.wallet.switch_account(account);
        self.board
            .handle_wallet_event(WalletEvent::AccountsChanged(vec![account]))
            .await;
    }
}

/// Wallet whose next `accounts()` call can be parked until released.
pub struct HeldWallet {
    inner: Arc<SimWallet>,
    hold: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl HeldWallet {
    pub fn new(inner: Arc<SimWallet>) -> Self {
        Self {
            inner,
            hold: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Park the next `accounts()` call.
    pub fn hold_next(&self) {
        self.hold.store(true, Ordering::SeqCst);
    }

    /// Resolves once a call is parked.
    pub async fn parked(&self) {
        self.entered.notified().await;
    }

    /// Let the parked call continue.
    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl Wallet for HeldWallet {
    async fn request_accounts(&self) -> ChainResult<Vec<Address>> {
        self.inner.request_accounts().await
    }

    async fn accounts(&self) -> ChainResult<Vec<Address>> {
        if self.hold.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.accounts().await
    }

    async fn chain_id(&self) -> ChainResult<ChainId> {
        self.inner.chain_id().await
    }

    async fn switch_chain(&self, chain: ChainId) -> ChainResult<()> {
        self.inner.switch_chain(chain).await
    }

    async fn add_chain(&self, network: &NetworkDescriptor) -> ChainResult<()> {
        self.inner.add_chain(network).await
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.inner.subscribe()
    }

    async fn bind_contract(
        &self,
        account: Address,
        contract: Address,
        descriptor: Arc<InterfaceDescriptor>,
    ) -> ChainResult<Arc<dyn PollContract>> {
        self.inner.bind_contract(account, contract, descriptor).await
    }
}
