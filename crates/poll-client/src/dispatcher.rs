//! Write actions and their per-origin status lines.
//!
//! Every action runs the same lifecycle, published on the status channel of
//! the control that started it:
//!
//! ```text
//! Idle ──validate──> Rejected                      (nothing sent)
//!   │
//!   └──> Sending ──wallet──> Submitted{tx} ──wait──> Confirmed{tx}
//!            │                     │
//!            └─────────────────────┴──────────────> Failed{message}
//! ```
//!
//! `Submitted` is published before the wait for confirmation begins, so the
//! transaction link is visible while the network settles it. Each origin has
//! its own `watch` channel: two actions in flight at once never overwrite
//! each other's status. There are no retries and no confirmation timeout.

use crate::error::{ActionError, ActionResult};
use crate::form::CreatePollForm;
use crate::repository::Listing;
use crate::session::Session;
use crate::validator::validate_contract_address;
use parking_lot::Mutex;
use poll_core::{Address, NetworkDescriptor, PollDraft, PollId, Receipt, TxHash, WriteCall};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use url::Url;

/// A state-changing request from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Vote for `option` in `poll`
    Vote {
        /// Target poll
        poll: PollId,
        /// Option index
        option: u64,
    },
    /// Create a poll
    CreatePoll(PollDraft),
    /// Close a poll
    ClosePoll(PollId),
    /// Add an instructor
    AddInstructor(Address),
    /// Remove an instructor
    RemoveInstructor(Address),
}

impl Action {
    /// Create action from the form contents.
    pub fn create_from_form(form: &CreatePollForm) -> ActionResult<Self> {
        Ok(Self::CreatePoll(form.submission()?))
    }

    /// Add-instructor action from address input.
    pub fn add_instructor(input: &str) -> ActionResult<Self> {
        Ok(Self::AddInstructor(validate_contract_address(input)?))
    }

    /// Remove-instructor action from address input.
    pub fn remove_instructor(input: &str) -> ActionResult<Self> {
        Ok(Self::RemoveInstructor(validate_contract_address(input)?))
    }

    /// Action category.
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Vote { .. } => ActionKind::Vote,
            Self::CreatePoll(_) => ActionKind::CreatePoll,
            Self::ClosePoll(_) => ActionKind::ClosePoll,
            Self::AddInstructor(_) => ActionKind::AddInstructor,
            Self::RemoveInstructor(_) => ActionKind::RemoveInstructor,
        }
    }

    /// Control whose status line this action reports to.
    #[must_use]
    pub fn origin(&self) -> ActionOrigin {
        match self {
            Self::Vote { poll, .. } | Self::ClosePoll(poll) => ActionOrigin::Poll(*poll),
            Self::CreatePoll(_) => ActionOrigin::CreateForm,
            Self::AddInstructor(_) | Self::RemoveInstructor(_) => ActionOrigin::AccessForm,
        }
    }

    fn into_call(self) -> WriteCall {
        match self {
            Self::Vote { poll, option } => WriteCall::Vote { poll, option },
            Self::CreatePoll(draft) => {
                let (question, options) = draft.into_parts();
                WriteCall::CreatePoll { question, options }
            }
            Self::ClosePoll(poll) => WriteCall::ClosePoll { poll },
            Self::AddInstructor(account) => WriteCall::AddInstructor { account },
            Self::RemoveInstructor(account) => WriteCall::RemoveInstructor { account },
        }
    }
}

/// Action category, used for status wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Vote
    Vote,
    /// Create poll
    CreatePoll,
    /// Close poll
    ClosePoll,
    /// Add instructor
    AddInstructor,
    /// Remove instructor
    RemoveInstructor,
}

impl ActionKind {
    /// Status while the wallet prompt is open.
    #[must_use]
    pub fn sending_label(self) -> &'static str {
        match self {
            Self::Vote => "Sending transaction…",
            Self::CreatePoll => "Creating poll…",
            Self::ClosePoll => "Closing poll…",
            Self::AddInstructor => "Adding instructor…",
            Self::RemoveInstructor => "Removing instructor…",
        }
    }

    /// Prefix for the submitted line.
    #[must_use]
    pub fn submitted_label(self) -> &'static str {
        match self {
            Self::Vote => "Vote sent",
            Self::CreatePoll => "Poll creation sent",
            Self::ClosePoll => "Poll closing…",
            Self::AddInstructor => "Instructor add sent",
            Self::RemoveInstructor => "Instructor removal sent",
        }
    }

    /// Suffix appended on confirmation.
    #[must_use]
    pub fn confirmed_label(self) -> &'static str {
        match self {
            Self::Vote => "✓ confirmed",
            Self::CreatePoll => "✓ created",
            Self::ClosePoll => "✓ closed",
            Self::AddInstructor => "✓ added",
            Self::RemoveInstructor => "✓ removed",
        }
    }
}

/// Control an action was started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionOrigin {
    /// A poll card (vote and close)
    Poll(PollId),
    /// The create-poll form
    CreateForm,
    /// The instructor management form
    AccessForm,
}

impl fmt::Display for ActionOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Poll(id) => write!(f, "poll #{id}"),
            Self::CreateForm => write!(f, "create form"),
            Self::AccessForm => write!(f, "access form"),
        }
    }
}

/// Status line state for one origin.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ActionStatus {
    /// Nothing to show
    #[default]
    Idle,
    /// Refused locally; nothing was sent
    Rejected {
        /// Validation message
        message: String,
    },
    /// Waiting for the wallet
    Sending {
        /// Action category
        kind: ActionKind,
    },
    /// Accepted by the wallet, waiting for the network
    Submitted {
        /// Action category
        kind: ActionKind,
        /// Transaction hash
        tx: TxHash,
        /// Explorer link
        url: Option<Url>,
    },
    /// Mined successfully
    Confirmed {
        /// Action category
        kind: ActionKind,
        /// Transaction hash
        tx: TxHash,
        /// Explorer link
        url: Option<Url>,
    },
    /// Rejected by the wallet or the network
    Failed {
        /// Action category
        kind: ActionKind,
        /// Most specific message available
        message: String,
    },
}

impl ActionStatus {
    /// Whether the action has finished, one way or another.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            Self::Rejected { .. } | Self::Confirmed { .. } | Self::Failed { .. }
        )
    }

    /// Transaction hash, once known.
    #[must_use]
    pub fn tx(&self) -> Option<TxHash> {
        match self {
            Self::Submitted { tx, .. } | Self::Confirmed { tx, .. } => Some(*tx),
            _ => None,
        }
    }

    /// Text for the status line.
    #[must_use]
    pub fn line(&self) -> String {
        match self {
            Self::Idle => String::new(),
            Self::Rejected { message } => message.clone(),
            Self::Sending { kind } => kind.sending_label().to_string(),
            Self::Submitted { kind, tx, .. } => {
                format!("{}: {tx} (waiting…)", kind.submitted_label())
            }
            Self::Confirmed { kind, tx, .. } => format!(
                "{}: {tx} (waiting…) {}",
                kind.submitted_label(),
                kind.confirmed_label()
            ),
            Self::Failed { message, .. } => format!("Error: {message}"),
        }
    }
}

/// Per-origin status channels for one session.
#[derive(Debug, Default)]
pub struct StatusBoard {
    channels: Mutex<HashMap<ActionOrigin, Arc<watch::Sender<ActionStatus>>>>,
}

impl StatusBoard {
    fn sender(&self, origin: ActionOrigin) -> Arc<watch::Sender<ActionStatus>> {
        self.channels
            .lock()
            .entry(origin)
            .or_insert_with(|| Arc::new(watch::channel(ActionStatus::Idle).0))
            .clone()
    }

    /// Watch the status line of `origin`.
    #[must_use]
    pub fn subscribe(&self, origin: ActionOrigin) -> watch::Receiver<ActionStatus> {
        self.sender(origin).subscribe()
    }

    /// Current status of `origin`.
    #[must_use]
    pub fn get(&self, origin: ActionOrigin) -> ActionStatus {
        self.sender(origin).borrow().clone()
    }

    /// Replace the status of `origin`.
    pub fn publish(&self, origin: ActionOrigin, status: ActionStatus) {
        self.sender(origin).send_replace(status);
    }
}

/// Check an action against the last listing before anything is sent.
///
/// Advisory only: the contract enforces the same rules authoritatively.
pub fn validate(action: &Action, snapshot: Option<&Listing>) -> ActionResult<()> {
    if let Action::Vote { poll, option } = action {
        let entry = snapshot
            .and_then(|listing| listing.get(*poll))
            .ok_or(ActionError::UnknownPoll(*poll))?;
        if !entry.poll.is_open() {
            return Err(ActionError::PollClosed(*poll));
        }
        if entry.has_voted {
            return Err(ActionError::AlreadyVoted(*poll));
        }
        if *option >= entry.poll.options().len() as u64 {
            return Err(ActionError::NoSuchOption {
                poll: *poll,
                option: *option,
            });
        }
    }
    Ok(())
}

/// Validate, submit, and wait for one action, publishing every phase on the
/// session's status board.
pub async fn dispatch(
    session: &Session,
    network: &NetworkDescriptor,
    snapshot: Option<&Listing>,
    action: Action,
) -> ActionResult<Receipt> {
    let statuses = session.statuses();
    let origin = action.origin();
    let kind = action.kind();

    if let Err(err) = validate(&action, snapshot) {
        tracing::debug!(%origin, error = %err, "dispatch() - rejected locally");
        statuses.publish(
            origin,
            ActionStatus::Rejected {
                message: err.to_string(),
            },
        );
        return Err(err);
    }

    statuses.publish(origin, ActionStatus::Sending { kind });
    let call = action.into_call();
    let method = call.method();

    let tx = match session.contract().send(call).await {
        Ok(tx) => tx,
        Err(err) => return Err(fail(statuses, origin, kind, err.into())),
    };
    let url = network.tx_url(&tx);
    tracing::info!(%origin, method, tx = %tx, epoch = %session.epoch(), "Transaction submitted");
    statuses.publish(
        origin,
        ActionStatus::Submitted {
            kind,
            tx,
            url: url.clone(),
        },
    );

    match session.contract().wait_for_receipt(tx).await {
        Ok(receipt) => {
            tracing::info!(
                %origin,
                method,
                tx = %tx,
                block = receipt.block_number,
                "Transaction confirmed"
            );
            statuses.publish(origin, ActionStatus::Confirmed { kind, tx, url });
            Ok(receipt)
        }
        Err(err) => Err(fail(statuses, origin, kind, err.into())),
    }
}

fn fail(
    statuses: &StatusBoard,
    origin: ActionOrigin,
    kind: ActionKind,
    err: ActionError,
) -> ActionError {
    tracing::warn!(%origin, error = %err, "Action failed");
    statuses.publish(
        origin,
        ActionStatus::Failed {
            kind,
            message: err.to_string(),
        },
    );
    err
}
