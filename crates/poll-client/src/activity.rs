//! Event-log history per poll and the instructor roster.
//!
//! Both views are derived from a bounded trailing window of blocks. History
//! older than the window is silently absent: a missing creation record is
//! shown as "not in recent window", never reported as an error. The roster is
//! an eventually-consistent fold over add/remove events; authoritative role
//! checks go through the role resolver.

use crate::config::ActivityConfig;
use crate::error::ActivityError;
use poll_core::{
    Address, ContractEvent, EventKind, EventLog, LogFilter, NetworkDescriptor, PollContract,
    PollId, TxHash,
};
use std::collections::BTreeMap;
use url::Url;

/// First block of a trailing window ending at `latest`.
#[must_use]
pub fn window_start(latest: u64, window: u64) -> u64 {
    latest.saturating_sub(window)
}

/// Kind of activity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    /// Poll creation
    Created,
    /// Vote cast
    Voted,
}

/// One activity record linked to its transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    /// Record kind
    pub kind: ActivityKind,
    /// Originating transaction
    pub tx_hash: TxHash,
    /// Voter, for vote records
    pub voter: Option<Address>,
    /// Including block
    pub block_number: u64,
    /// Explorer link for the transaction
    pub url: Option<Url>,
}

impl ActivityEntry {
    fn from_log(log: &EventLog, network: &NetworkDescriptor) -> Option<Self> {
        let (kind, voter) = match &log.event {
            ContractEvent::PollCreated { .. } => (ActivityKind::Created, None),
            ContractEvent::VoteCast { voter, .. } => (ActivityKind::Voted, Some(*voter)),
            _ => return None,
        };
        Some(Self {
            kind,
            tx_hash: log.tx_hash,
            voter,
            block_number: log.block_number,
            url: network.tx_url(&log.tx_hash),
        })
    }

    /// Display line, e.g. `Vote by 0x12ab…cdef — 0x9f00…1234`.
    #[must_use]
    pub fn line(&self) -> String {
        match (self.kind, self.voter) {
            (ActivityKind::Voted, Some(voter)) => {
                format!("Vote by {} — {}", voter.short(), self.tx_hash.short())
            }
            _ => format!("Poll created — {}", self.tx_hash.short()),
        }
    }
}

/// Creation and vote history of one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollActivity {
    /// Poll
    pub poll: PollId,
    /// First block searched
    pub from_block: u64,
    /// Latest block at query time
    pub to_block: u64,
    /// First creation record in the window
    pub created: Option<ActivityEntry>,
    /// Every vote record in the window, in chain order
    pub votes: Vec<ActivityEntry>,
}

impl PollActivity {
    /// Display lines: the creation line, then one line per vote or a
    /// placeholder.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.votes.len() + 1);
        lines.push(self.created.as_ref().map_or_else(
            || "Poll created — not in recent window".to_string(),
            ActivityEntry::line,
        ));
        if self.votes.is_empty() {
            lines.push("No votes yet".to_string());
        } else {
            lines.extend(self.votes.iter().map(ActivityEntry::line));
        }
        lines
    }
}

/// Instructor membership replayed from events.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Roster {
    /// First block searched
    pub from_block: u64,
    /// Last known membership per address
    pub membership: BTreeMap<Address, bool>,
}

impl Roster {
    /// Addresses whose last event was an add.
    #[must_use]
    pub fn members(&self) -> Vec<Address> {
        self.membership
            .iter()
            .filter_map(|(address, active)| active.then_some(*address))
            .collect()
    }
}

/// Fold add/remove events, in the order given, into final membership.
pub fn fold_roster<'a>(
    events: impl IntoIterator<Item = &'a ContractEvent>,
) -> BTreeMap<Address, bool> {
    events
        .into_iter()
        .fold(BTreeMap::new(), |mut membership, event| {
            match event {
                ContractEvent::InstructorAdded { account } => {
                    membership.insert(*account, true);
                }
                ContractEvent::InstructorRemoved { account } => {
                    membership.insert(*account, false);
                }
                _ => {}
            }
            membership
        })
}

/// Reads activity through a session's contract handle.
pub struct ActivityReader<'a> {
    contract: &'a dyn PollContract,
    network: &'a NetworkDescriptor,
    windows: ActivityConfig,
}

impl<'a> ActivityReader<'a> {
    /// Reader with the configured windows.
    #[must_use]
    pub fn new(
        contract: &'a dyn PollContract,
        network: &'a NetworkDescriptor,
        windows: ActivityConfig,
    ) -> Self {
        Self {
            contract,
            network,
            windows,
        }
    }

    /// Creation and vote records of `poll` within the poll window.
    pub async fn poll_activity(&self, poll: PollId) -> Result<PollActivity, ActivityError> {
        let latest = self.contract.block_number().await?;
        let from_block = window_start(latest, self.windows.poll_window);
        let filter = |kind| LogFilter {
            to_block: Some(latest),
            ..LogFilter::new(kind, from_block).with_poll(poll)
        };

        let (created_filter, voted_filter) =
            (filter(EventKind::PollCreated), filter(EventKind::VoteCast));
        let (created, voted) = futures::try_join!(
            self.contract.get_logs(&created_filter),
            self.contract.get_logs(&voted_filter),
        )?;
        tracing::debug!(
            %poll,
            from_block,
            latest,
            created = created.len(),
            votes = voted.len(),
            "ActivityReader::poll_activity()"
        );

        Ok(PollActivity {
            poll,
            from_block,
            to_block: latest,
            created: created
                .iter()
                .find_map(|log| ActivityEntry::from_log(log, self.network)),
            votes: voted
                .iter()
                .filter_map(|log| ActivityEntry::from_log(log, self.network))
                .collect(),
        })
    }

    /// Replay instructor add/remove events within the roster window.
    pub async fn instructor_roster(&self) -> Result<Roster, ActivityError> {
        let latest = self.contract.block_number().await?;
        let from_block = window_start(latest, self.windows.roster_window);
        let filter = |kind| LogFilter {
            to_block: Some(latest),
            ..LogFilter::new(kind, from_block)
        };

        let (added_filter, removed_filter) = (
            filter(EventKind::InstructorAdded),
            filter(EventKind::InstructorRemoved),
        );
        let (mut logs, removed) = futures::try_join!(
            self.contract.get_logs(&added_filter),
            self.contract.get_logs(&removed_filter),
        )?;
        logs.extend(removed);
        // Two queries: restore chain order before folding
        logs.sort_by_key(|log| (log.block_number, log.log_index));

        let membership = fold_roster(logs.iter().map(|log| &log.event));
        tracing::debug!(
            from_block,
            events = logs.len(),
            members = membership.values().filter(|m| **m).count(),
            "ActivityReader::instructor_roster()"
        );
        Ok(Roster {
            from_block,
            membership,
        })
    }
}
