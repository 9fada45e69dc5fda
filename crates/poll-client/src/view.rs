//! Published board view with stale-result guards.
//!
//! Every refresh takes a version number when it starts and hands its result
//! to [`ViewStore::publish`] when it finishes. Two guards apply:
//!
//! - a result from an older session epoch is always discarded, so an action
//!   that settles after an account or chain change cannot touch the new
//!   session's view
//! - under [`RefreshPolicy::Monotonic`], a result whose version is older than
//!   the last published one is discarded as well; under
//!   [`RefreshPolicy::LastWriterWins`] the last result to arrive is shown

use crate::render::BoardView;
use crate::session::SessionEpoch;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// How overlapping refreshes are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefreshPolicy {
    /// Whichever refresh finishes last is shown
    #[default]
    LastWriterWins,
    /// A refresh started before an already-published one is dropped
    Monotonic,
}

/// What happened to a published view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The view is now current
    Published,
    /// The view belongs to a replaced session
    StaleEpoch,
    /// A newer refresh was already published
    Superseded,
}

#[derive(Debug)]
struct Versions {
    epoch: SessionEpoch,
    next: u64,
    published: Option<u64>,
}

/// Holder of the current board view.
#[derive(Debug)]
pub struct ViewStore {
    policy: RefreshPolicy,
    versions: Mutex<Versions>,
    view: watch::Sender<Arc<BoardView>>,
}

impl ViewStore {
    /// Store showing the loading view.
    #[must_use]
    pub fn new(policy: RefreshPolicy) -> Self {
        let (view, _) = watch::channel(Arc::new(BoardView::default()));
        Self {
            policy,
            versions: Mutex::new(Versions {
                epoch: SessionEpoch::default(),
                next: 0,
                published: None,
            }),
            view,
        }
    }

    /// Configured policy.
    #[must_use]
    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    /// Switch to `epoch` and show `view` immediately.
    ///
    /// Re-entering the current epoch resets its versions. An epoch older than
    /// the current one is ignored.
    pub fn begin_epoch(&self, epoch: SessionEpoch, view: BoardView) {
        let mut versions = self.versions.lock();
        if epoch < versions.epoch {
            tracing::debug!(
                %epoch,
                current = %versions.epoch,
                "ViewStore - ignoring older epoch"
            );
            return;
        }
        versions.epoch = epoch;
        versions.next = 0;
        versions.published = None;
        self.view.send_replace(Arc::new(view));
    }

    /// Version number for a refresh starting now.
    pub fn issue(&self, epoch: SessionEpoch) -> u64 {
        let mut versions = self.versions.lock();
        if versions.epoch != epoch {
            return 0;
        }
        versions.next += 1;
        versions.next
    }

    /// Offer a finished refresh.
    pub fn publish(&self, epoch: SessionEpoch, version: u64, view: BoardView) -> PublishOutcome {
        let mut versions = self.versions.lock();
        if versions.epoch != epoch {
            tracing::debug!(
                %epoch,
                current = %versions.epoch,
                "ViewStore - discarding view from replaced session"
            );
            return PublishOutcome::StaleEpoch;
        }
        if self.policy == RefreshPolicy::Monotonic
            && versions.published.is_some_and(|published| version < published)
        {
            tracing::debug!(version, "ViewStore - discarding superseded refresh");
            return PublishOutcome::Superseded;
        }
        versions.published = Some(versions.published.map_or(version, |p| p.max(version)));
        self.view.send_replace(Arc::new(view));
        PublishOutcome::Published
    }

    /// Current view.
    #[must_use]
    pub fn current(&self) -> Arc<BoardView> {
        self.view.borrow().clone()
    }

    /// Watch view changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<BoardView>> {
        self.view.subscribe()
    }
}
