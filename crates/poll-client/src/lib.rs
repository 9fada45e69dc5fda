//! Client-side poll synchronization and voting model.
//!
//! `poll-client` keeps a local view of an on-chain poll board consistent with
//! the chain while the user votes, creates and closes polls, and manages
//! instructors. It talks to the outside world only through the
//! [`poll_core::Wallet`] and [`poll_core::PollContract`] traits.
//!
//! # Pipeline
//!
//! - [`validator`]: contract address and network checks
//! - [`session`]: wallet authorization and the session epoch
//! - [`roles`]: owner/instructor capability probing
//! - [`repository`]: ordered poll reads with per-account vote flags
//! - [`render`]: derived view (percentages, visibility, messages)
//! - [`dispatcher`]: write actions with per-origin status lines
//! - [`activity`]: event-log history and the instructor roster
//! - [`view`]: stale-result guards on the published view
//! - [`board`]: the [`PollBoard`] facade wiring all of the above
//!
//! # Example
//!
//! ```no_run
//! use poll_client::{ClientConfig, PollBoard};
//! use poll_core::Wallet;
//! use std::sync::Arc;
//!
//! # async fn run(wallet: Arc<dyn Wallet>) -> anyhow::Result<()> {
//! let config = ClientConfig::load()?;
//! poll_client::logging::init(&config.logging).map_err(anyhow::Error::msg)?;
//!
//! let board = PollBoard::new(config, Some(wallet));
//! let view = board.auto_connect().await?;
//! for card in view.cards() {
//!     println!("#{} {}", card.id, card.question);
//! }
//! # Ok(())
//! # }
//! ```

pub mod activity;
pub mod board;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod form;
pub mod logging;
pub mod render;
pub mod repository;
pub mod roles;
pub mod session;
pub mod validator;
pub mod view;

pub use activity::{ActivityEntry, ActivityKind, ActivityReader, PollActivity, Roster};
pub use board::{PollBoard, CONNECT_PROMPT};
pub use config::{ActivityConfig, ClientConfig};
pub use dispatcher::{Action, ActionKind, ActionOrigin, ActionStatus, StatusBoard};
pub use error::{
    ActionError, ActionResult, ActivityError, ConfigError, FormError, ListError, ListResult,
    SessionError, SessionResult,
};
pub use form::CreatePollForm;
pub use logging::{LoggingConfig, OutputFormat};
pub use render::{BoardBody, BoardView, OptionRow, PollCard};
pub use repository::{ClosedPollPolicy, Listing};
pub use roles::{Capabilities, RoleModel, RoleResolver};
pub use session::{Session, SessionConnector, SessionEpoch, SessionManager, SessionState};
pub use validator::NetworkCheck;
pub use view::{PublishOutcome, RefreshPolicy, ViewStore};
