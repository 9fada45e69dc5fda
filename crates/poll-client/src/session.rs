//! Session establishment and lifecycle.
//!
//! A [`Session`] binds one authorized account to one contract handle. It is
//! immutable once built: role flags, the network check, and the contract
//! handle are fixed for its lifetime, and a wallet notification replaces the
//! whole session instead of patching it.
//!
//! # State Machine
//!
//! ```text
//! Disconnected ──connect()──> Connecting
//!      ▲                          │
//!      │                    success/failure
//!      │                          ▼
//!      │                    Connected / Error
//!      │                          │
//!      └──── invalidate() ────────┘   (account or chain changed)
//! ```
//!
//! Every transition through [`SessionManager::invalidate`] bumps the
//! [`SessionEpoch`]. Work started under an older epoch can still finish, but
//! its results are recognizable as stale and are discarded by the view store.

use crate::config::ClientConfig;
use crate::dispatcher::StatusBoard;
use crate::error::{ConfigError, SessionError, SessionResult};
use crate::roles::{Capabilities, RoleModel, RoleResolver};
use crate::validator::{check_network, validate_contract_address, NetworkCheck};
use parking_lot::{Mutex, RwLock};
use poll_core::{Address, ChainId, InterfaceDescriptor, NetworkDescriptor, PollContract, Wallet};
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Monotonic identifier of a session instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SessionEpoch(pub u64);

impl fmt::Display for SessionEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch {}", self.0)
    }
}

/// Where the interface descriptor comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorSource {
    /// Compiled into the binary
    Bundled,
    /// Loaded from disk
    File(PathBuf),
}

impl DescriptorSource {
    fn load(&self) -> Result<InterfaceDescriptor, ConfigError> {
        match self {
            Self::Bundled => InterfaceDescriptor::poll_board().map_err(|e| {
                ConfigError::InterfaceDescriptor {
                    path: PathBuf::from("<bundled>"),
                    reason: e.to_string(),
                }
            }),
            Self::File(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    ConfigError::InterfaceDescriptor {
                        path: path.clone(),
                        reason: format!("cannot read file: {e}"),
                    }
                })?;
                InterfaceDescriptor::from_json(&text).map_err(|e| {
                    ConfigError::InterfaceDescriptor {
                        path: path.clone(),
                        reason: e.to_string(),
                    }
                })
            }
        }
    }
}

/// Interface descriptor loaded at most once per session.
#[derive(Debug)]
pub struct DescriptorCache {
    source: DescriptorSource,
    loaded: Mutex<Option<Arc<InterfaceDescriptor>>>,
}

impl DescriptorCache {
    /// Empty cache for `source`.
    #[must_use]
    pub fn new(source: DescriptorSource) -> Self {
        Self {
            source,
            loaded: Mutex::new(None),
        }
    }

    /// The descriptor, loading it on first use.
    pub fn get(&self) -> Result<Arc<InterfaceDescriptor>, ConfigError> {
        let mut loaded = self.loaded.lock();
        if let Some(descriptor) = loaded.as_ref() {
            return Ok(descriptor.clone());
        }
        let descriptor = Arc::new(self.source.load()?);
        tracing::debug!(
            source = ?self.source,
            entries = descriptor.entries().len(),
            "DescriptorCache - loaded interface descriptor"
        );
        *loaded = Some(descriptor.clone());
        Ok(descriptor)
    }

    /// Forget the cached descriptor.
    pub fn clear(&self) {
        self.loaded.lock().take();
    }

    /// Whether a descriptor is cached.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.lock().is_some()
    }
}

/// One authorized account bound to the contract.
pub struct Session {
    epoch: SessionEpoch,
    account: Address,
    network: NetworkCheck,
    contract: Arc<dyn PollContract>,
    descriptor: Arc<InterfaceDescriptor>,
    capabilities: Capabilities,
    statuses: StatusBoard,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("epoch", &self.epoch)
            .field("account", &self.account)
            .field("network", &self.network)
            .field("contract", &self.contract.address())
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Session instance identifier.
    #[must_use]
    pub fn epoch(&self) -> SessionEpoch {
        self.epoch
    }

    /// Connected account.
    #[must_use]
    pub fn account(&self) -> Address {
        self.account
    }

    /// Chain the wallet was on when the session was built.
    #[must_use]
    pub fn chain_id(&self) -> ChainId {
        self.network.actual
    }

    /// Network match result.
    #[must_use]
    pub fn network(&self) -> &NetworkCheck {
        &self.network
    }

    /// Bound contract handle, shared read-only by all operations.
    #[must_use]
    pub fn contract(&self) -> &Arc<dyn PollContract> {
        &self.contract
    }

    /// Interface descriptor the handle was bound with.
    #[must_use]
    pub fn descriptor(&self) -> &InterfaceDescriptor {
        &self.descriptor
    }

    /// Role flags for the connected account.
    #[must_use]
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Per-origin action status channels.
    #[must_use]
    pub fn statuses(&self) -> &StatusBoard {
        &self.statuses
    }
}

/// Builds sessions from a wallet and the static configuration.
pub struct SessionConnector {
    wallet: Option<Arc<dyn Wallet>>,
    contract_address: String,
    network: NetworkDescriptor,
    role_model: RoleModel,
    descriptors: DescriptorCache,
}

impl SessionConnector {
    /// Connector for `wallet` (`None` when no wallet is installed).
    #[must_use]
    pub fn new(wallet: Option<Arc<dyn Wallet>>, config: &ClientConfig) -> Self {
        let source = config
            .interface_descriptor
            .clone()
            .map_or(DescriptorSource::Bundled, DescriptorSource::File);
        Self {
            wallet,
            contract_address: config.contract_address.clone(),
            network: config.network.clone(),
            role_model: config.role_model,
            descriptors: DescriptorCache::new(source),
        }
    }

    /// The wallet, or `WalletUnavailable`.
    pub fn wallet(&self) -> SessionResult<&Arc<dyn Wallet>> {
        self.wallet.as_ref().ok_or(SessionError::WalletUnavailable)
    }

    /// Expected network.
    #[must_use]
    pub fn network(&self) -> &NetworkDescriptor {
        &self.network
    }

    /// Descriptor cache.
    #[must_use]
    pub fn descriptors(&self) -> &DescriptorCache {
        &self.descriptors
    }

    /// Connect, prompting for account authorization if needed.
    pub async fn connect(&self, epoch: SessionEpoch) -> SessionResult<Session> {
        let contract = validate_contract_address(&self.contract_address)?;
        let wallet = self.wallet()?;
        let accounts = wallet.request_accounts().await?;
        let account = *accounts.first().ok_or(SessionError::NoAccount)?;
        self.establish(epoch, wallet.as_ref(), contract, account)
            .await
    }

    /// Connect without prompting if an account is already authorized.
    pub async fn auto_connect(&self, epoch: SessionEpoch) -> SessionResult<Option<Session>> {
        let contract = validate_contract_address(&self.contract_address)?;
        let wallet = self.wallet()?;
        let Some(account) = wallet.accounts().await?.first().copied() else {
            tracing::debug!("auto_connect() - no authorized account");
            return Ok(None);
        };
        self.establish(epoch, wallet.as_ref(), contract, account)
            .await
            .map(Some)
    }

    async fn establish(
        &self,
        epoch: SessionEpoch,
        wallet: &dyn Wallet,
        address: Address,
        account: Address,
    ) -> SessionResult<Session> {
        let descriptor = self.descriptors.get()?;
        let contract = wallet
            .bind_contract(account, address, descriptor.clone())
            .await?;
        let network = check_network(wallet, &self.network).await?;
        let capabilities = RoleResolver::new(contract.as_ref(), &descriptor, self.role_model)
            .resolve(account)
            .await;

        tracing::info!(
            %epoch,
            account = %account,
            contract = %address,
            network = %network.status_label(),
            "Session established"
        );

        Ok(Session {
            epoch,
            account,
            network,
            contract,
            descriptor,
            capabilities,
            statuses: StatusBoard::default(),
        })
    }
}

/// Session lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No session.
    #[default]
    Disconnected,

    /// Connection attempt in progress.
    Connecting,

    /// Session active.
    Connected {
        /// Session instance
        epoch: SessionEpoch,
        /// Connected account
        account: Address,
    },

    /// The last attempt failed.
    Error {
        /// User-facing message
        message: String,
    },
}

impl SessionState {
    /// Returns true if connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// Returns true if a connection attempt is in progress.
    #[must_use]
    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::Connecting)
    }

    /// The error message, if in the error state.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            _ => None,
        }
    }

    /// Short status label for display.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting...",
            Self::Connected { .. } => "Connected",
            Self::Error { .. } => "Error",
        }
    }
}

/// Owns the current session and its epoch counter.
pub struct SessionManager {
    connector: SessionConnector,
    epoch: AtomicU64,
    current: RwLock<Option<Arc<Session>>>,
    state: watch::Sender<SessionState>,
}

impl SessionManager {
    /// Manager with no session.
    #[must_use]
    pub fn new(connector: SessionConnector) -> Self {
        let (state, _) = watch::channel(SessionState::Disconnected);
        Self {
            connector,
            epoch: AtomicU64::new(0),
            current: RwLock::new(None),
            state,
        }
    }

    /// Underlying connector.
    #[must_use]
    pub fn connector(&self) -> &SessionConnector {
        &self.connector
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Watch lifecycle transitions.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Current epoch.
    #[must_use]
    pub fn epoch(&self) -> SessionEpoch {
        SessionEpoch(self.epoch.load(Ordering::SeqCst))
    }

    /// Whether `epoch` is still the live one.
    #[must_use]
    pub fn is_current(&self, epoch: SessionEpoch) -> bool {
        self.epoch() == epoch
    }

    /// Active session, if any.
    #[must_use]
    pub fn current(&self) -> Option<Arc<Session>> {
        self.current.read().clone()
    }

    /// Tear down the session wholesale and start a new epoch.
    pub fn invalidate(&self) -> SessionEpoch {
        let epoch = SessionEpoch(self.epoch.fetch_add(1, Ordering::SeqCst) + 1);
        let previous = self.current.write().take();
        self.connector.descriptors().clear();
        self.state.send_replace(SessionState::Disconnected);
        if let Some(previous) = previous {
            tracing::info!(
                old = %previous.epoch(),
                new = %epoch,
                "Session invalidated"
            );
        }
        epoch
    }

    /// Prompting connect under a fresh epoch.
    pub async fn connect(&self) -> SessionResult<Arc<Session>> {
        let epoch = self.begin();
        self.connect_in(epoch).await
    }

    /// Non-prompting connect under a fresh epoch.
    pub async fn auto_connect(&self) -> SessionResult<Option<Arc<Session>>> {
        let epoch = self.begin();
        self.auto_connect_in(epoch).await
    }

    /// Invalidate the current session and enter `Connecting` under a new
    /// epoch. Pair with [`Self::connect_in`] or [`Self::auto_connect_in`].
    pub fn begin(&self) -> SessionEpoch {
        let epoch = self.invalidate();
        self.state.send_replace(SessionState::Connecting);
        epoch
    }

    /// Prompting connect for an epoch returned by [`Self::begin`].
    pub async fn connect_in(&self, epoch: SessionEpoch) -> SessionResult<Arc<Session>> {
        let result = self.connector.connect(epoch).await;
        self.install(epoch, result.map(Some))?
            .ok_or(SessionError::NoAccount)
    }

    /// Non-prompting connect for an epoch returned by [`Self::begin`].
    pub async fn auto_connect_in(
        &self,
        epoch: SessionEpoch,
    ) -> SessionResult<Option<Arc<Session>>> {
        let result = self.connector.auto_connect(epoch).await;
        self.install(epoch, result)
    }

    fn install(
        &self,
        epoch: SessionEpoch,
        result: SessionResult<Option<Session>>,
    ) -> SessionResult<Option<Arc<Session>>> {
        if !self.is_current(epoch) {
            tracing::debug!(%epoch, "Discarding superseded connection attempt");
            return Err(SessionError::Superseded);
        }
        match result {
            Ok(Some(session)) => {
                let session = Arc::new(session);
                *self.current.write() = Some(session.clone());
                self.state.send_replace(SessionState::Connected {
                    epoch,
                    account: session.account(),
                });
                Ok(Some(session))
            }
            Ok(None) => {
                self.state.send_replace(SessionState::Disconnected);
                Ok(None)
            }
            Err(err) => {
                tracing::warn!(%epoch, error = %err, "Connection failed");
                self.state.send_replace(SessionState::Error {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }
}
