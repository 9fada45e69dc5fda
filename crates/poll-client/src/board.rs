//! Board controller.
//!
//! [`PollBoard`] runs the whole pipeline: validator, connector, roles,
//! repository, renderer. It owns the session manager and the view store and
//! consumes wallet notifications, rebuilding the session wholesale on each.
//!
//! ```text
//! connect() ──> Session ──> list_polls() ──> render_board() ──> ViewStore
//!                  ▲                                                ▲
//!   WalletEvent ───┘ (invalidate + auto-connect)                    │
//!   dispatch(action) ── confirmed ── refresh() ─────────────────────┘
//! ```
//!
//! Refreshes capture the session they started under. If the session is
//! replaced before they finish, their result is dropped by the view store.

use crate::activity::{ActivityReader, PollActivity, Roster};
use crate::config::ClientConfig;
use crate::dispatcher::{self, Action, ActionOrigin, ActionStatus};
use crate::error::{ActionError, ActionResult, ActivityError, SessionError, SessionResult};
use crate::render::{render_board, BoardBody, BoardView};
use crate::repository::{list_polls, Listing};
use crate::session::{Session, SessionConnector, SessionEpoch, SessionManager, SessionState};
use crate::validator::switch_network;
use crate::view::{PublishOutcome, ViewStore};
use parking_lot::Mutex;
use poll_core::{PollId, Receipt, Wallet, WalletEvent};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

/// Board message before a wallet is connected.
pub const CONNECT_PROMPT: &str = "Connect your wallet to see polls.";

/// Client facade over one wallet and one contract.
pub struct PollBoard {
    config: ClientConfig,
    sessions: SessionManager,
    views: ViewStore,
    snapshot: Mutex<Option<(SessionEpoch, Arc<Listing>)>>,
}

impl PollBoard {
    /// Board over `wallet` (`None` when no wallet is installed).
    #[must_use]
    pub fn new(config: ClientConfig, wallet: Option<Arc<dyn Wallet>>) -> Self {
        let sessions = SessionManager::new(SessionConnector::new(wallet, &config));
        let views = ViewStore::new(config.refresh_policy);
        Self {
            config,
            sessions,
            views,
            snapshot: Mutex::new(None),
        }
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Active session, if any.
    #[must_use]
    pub fn session(&self) -> Option<Arc<Session>> {
        self.sessions.current()
    }

    /// Session lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.sessions.state()
    }

    /// Current view.
    #[must_use]
    pub fn view(&self) -> Arc<BoardView> {
        self.views.current()
    }

    /// Watch view changes.
    #[must_use]
    pub fn subscribe_view(&self) -> watch::Receiver<Arc<BoardView>> {
        self.views.subscribe()
    }

    /// Watch the status line of `origin` in the current session.
    #[must_use]
    pub fn subscribe_status(&self, origin: ActionOrigin) -> Option<watch::Receiver<ActionStatus>> {
        self.session().map(|s| s.statuses().subscribe(origin))
    }

    /// Current status of `origin` in the current session.
    #[must_use]
    pub fn status(&self, origin: ActionOrigin) -> ActionStatus {
        self.session()
            .map(|s| s.statuses().get(origin))
            .unwrap_or_default()
    }

    /// Subscribe to wallet notifications (before spawning the event loop).
    pub fn subscribe_wallet(&self) -> SessionResult<broadcast::Receiver<WalletEvent>> {
        Ok(self.sessions.connector().wallet()?.subscribe())
    }

    /// Connect with an authorization prompt, then load and render polls.
    pub async fn connect(&self) -> SessionResult<Arc<BoardView>> {
        let epoch = self.begin();
        let result = self.sessions.connect_in(epoch).await;
        self.after_connect(epoch, result.map(Some)).await
    }

    /// Connect only if an account is already authorized.
    pub async fn auto_connect(&self) -> SessionResult<Arc<BoardView>> {
        let epoch = self.begin();
        let result = self.sessions.auto_connect_in(epoch).await;
        self.after_connect(epoch, result).await
    }

    /// Start a new epoch and drop everything shown for the old session.
    fn begin(&self) -> SessionEpoch {
        let epoch = self.sessions.begin();
        *self.snapshot.lock() = None;
        self.views.begin_epoch(epoch, BoardView::default());
        epoch
    }

    async fn after_connect(
        &self,
        epoch: SessionEpoch,
        result: SessionResult<Option<Arc<Session>>>,
    ) -> SessionResult<Arc<BoardView>> {
        match result {
            Ok(Some(session)) => {
                self.views.begin_epoch(
                    epoch,
                    BoardView::default()
                        .with_session(session.account(), session.network().clone()),
                );
                self.refresh_session(&session).await;
                Ok(self.view())
            }
            Ok(None) => {
                self.show_disconnected(epoch, BoardBody::Empty(CONNECT_PROMPT));
                Ok(self.view())
            }
            Err(SessionError::Superseded) => Err(SessionError::Superseded),
            Err(err) => {
                self.show_disconnected(epoch, BoardBody::Error(err.to_string()));
                Err(err)
            }
        }
    }

    fn show_disconnected(&self, epoch: SessionEpoch, body: BoardBody) {
        self.views.begin_epoch(
            epoch,
            BoardView {
                body,
                ..BoardView::default()
            },
        );
    }

    /// Re-read and re-render under the current session.
    pub async fn refresh(&self) -> Arc<BoardView> {
        if let Some(session) = self.session() {
            self.refresh_session(&session).await;
        }
        self.view()
    }

    async fn refresh_session(&self, session: &Session) -> PublishOutcome {
        let epoch = session.epoch();
        let version = self.views.issue(epoch);
        let listing = list_polls(session, self.config.closed_polls).await;
        if let Err(err) = &listing {
            tracing::warn!(%epoch, error = %err, "Poll listing failed");
        }

        let view = render_board(&listing, session.capabilities())
            .with_session(session.account(), session.network().clone());

        if self.sessions.is_current(epoch) {
            // Keep the previous snapshot on failure; validation stays advisory
            if let Ok(listing) = listing {
                *self.snapshot.lock() = Some((epoch, Arc::new(listing)));
            }
        }
        let outcome = self.views.publish(epoch, version, view);
        tracing::debug!(%epoch, version, ?outcome, "refresh published");
        outcome
    }

    /// Last listing of the current session.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<Listing>> {
        let epoch = self.sessions.epoch();
        self.snapshot
            .lock()
            .as_ref()
            .filter(|(e, _)| *e == epoch)
            .map(|(_, listing)| listing.clone())
    }

    /// Run one write action and refresh on success.
    ///
    /// The action is bound to the session current when it starts. If that
    /// session is replaced while the action is pending, its settlement only
    /// reaches the replaced session's status board, and its refresh is
    /// discarded.
    pub async fn dispatch(&self, action: Action) -> ActionResult<Receipt> {
        let session = self.session().ok_or(ActionError::NotConnected)?;
        let snapshot = self.snapshot();
        let receipt =
            dispatcher::dispatch(&session, &self.config.network, snapshot.as_deref(), action)
                .await?;
        self.refresh_session(&session).await;
        Ok(receipt)
    }

    fn activity_reader<'a>(&'a self, session: &'a Session) -> ActivityReader<'a> {
        ActivityReader::new(
            session.contract().as_ref(),
            &self.config.network,
            self.config.activity,
        )
    }

    /// Activity of one poll. Failures affect only this poll's card.
    pub async fn activity(&self, poll: PollId) -> Result<PollActivity, ActivityError> {
        let session = self.session().ok_or(ActivityError::NotConnected)?;
        self.activity_reader(&session)
            .poll_activity(poll)
            .await
            .inspect_err(|err| tracing::warn!(%poll, error = %err, "Activity lookup failed"))
    }

    /// Instructor roster replayed from events.
    pub async fn roster(&self) -> Result<Roster, ActivityError> {
        let session = self.session().ok_or(ActivityError::NotConnected)?;
        self.activity_reader(&session)
            .instructor_roster()
            .await
            .inspect_err(|err| tracing::warn!(error = %err, "Roster lookup failed"))
    }

    /// Ask the wallet to switch to (or add) the configured network.
    pub async fn switch_network(&self) -> SessionResult<()> {
        let wallet = self.sessions.connector().wallet()?;
        switch_network(wallet.as_ref(), &self.config.network).await?;
        Ok(())
    }

    /// Tear down and rebuild the session after a wallet notification.
    pub async fn handle_wallet_event(&self, event: WalletEvent) -> Arc<BoardView> {
        tracing::info!(?event, "Wallet changed, reloading");
        self.reload().await
    }

    /// Drop the session and reconnect without prompting, as a page reload
    /// would.
    pub async fn reload(&self) -> Arc<BoardView> {
        match self.auto_connect().await {
            Ok(view) => view,
            Err(err) => {
                tracing::warn!(error = %err, "Reload failed");
                self.view()
            }
        }
    }

    /// Consume wallet notifications until the wallet goes away.
    pub async fn run_event_loop(&self, mut events: broadcast::Receiver<WalletEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => {
                    self.handle_wallet_event(event).await;
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    // Something changed; the exact events do not matter
                    tracing::warn!(missed, "Wallet events lagged, reloading");
                    self.reload().await;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::debug!("Wallet event stream closed");
                    break;
                }
            }
        }
    }
}
