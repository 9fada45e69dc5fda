//! Poll listing (read path).
//!
//! Reads are strictly sequential: the count, then for each index in order
//! the poll tuple and, only for listed polls with an account connected, the
//! has-voted flag. The result is a best-effort snapshot; on-chain changes
//! during the scan are not detected. Any failed read aborts the listing.

use crate::error::ListResult;
use crate::session::Session;
use poll_core::{Address, Poll, PollContract, PollEntry, PollId};
use serde::{Deserialize, Serialize};

/// Whether closed polls appear in the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClosedPollPolicy {
    /// Skip closed polls entirely
    #[default]
    Hide,
    /// List every poll
    Show,
}

/// Result of one listing pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Listing {
    /// Polls on chain, listed or not
    pub total: u64,
    /// Listed polls in index order
    pub entries: Vec<PollEntry>,
}

impl Listing {
    /// Look up a listed poll.
    #[must_use]
    pub fn get(&self, id: PollId) -> Option<&PollEntry> {
        self.entries.iter().find(|e| e.poll.id() == id)
    }
}

/// List polls through a contract handle.
pub async fn read_polls(
    contract: &dyn PollContract,
    account: Option<Address>,
    policy: ClosedPollPolicy,
) -> ListResult<Listing> {
    let total = contract.poll_count().await?;
    tracing::debug!(total, ?policy, "read_polls() - count");

    let mut entries = Vec::new();
    for index in 0..total {
        let id = PollId(index);
        let poll = Poll::from_tuple(id, contract.get_poll(id).await?)?;
        if policy == ClosedPollPolicy::Hide && !poll.is_open() {
            continue;
        }
        let has_voted = match account {
            Some(account) => contract.has_voted(id, account).await?,
            None => false,
        };
        entries.push(PollEntry { poll, has_voted });
    }

    tracing::debug!(total, listed = entries.len(), "read_polls() - done");
    Ok(Listing { total, entries })
}

/// List polls for the session's account.
pub async fn list_polls(session: &Session, policy: ClosedPollPolicy) -> ListResult<Listing> {
    read_polls(session.contract().as_ref(), Some(session.account()), policy).await
}
