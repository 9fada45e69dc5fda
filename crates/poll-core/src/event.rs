//! Contract event records and log filters.
//!
//! Events are selected the way a JSON-RPC `eth_getLogs` filter selects them:
//! topic 0 is the keccak-256 hash of the canonical event signature, and for
//! poll-scoped events topic 1 is the poll id left-padded to 32 bytes.

use crate::address::{Address, TxHash};
use crate::poll::PollId;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;

/// A 32-byte log topic.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Topic(pub [u8; 32]);

impl Topic {
    /// Topic for a poll id: the id as a big-endian uint256.
    #[must_use]
    pub fn for_poll(poll: PollId) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&poll.0.to_be_bytes());
        Self(bytes)
    }

    /// keccak-256 of an event signature.
    #[must_use]
    pub fn for_signature(signature: &str) -> Self {
        Self(Keccak256::digest(signature.as_bytes()).into())
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Topic({self})")
    }
}

/// Event categories emitted by the poll contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// `PollCreated(uint256 indexed pollId, string question, string[] options)`
    PollCreated,
    /// `VoteCast(uint256 indexed pollId, address indexed voter, uint256 optionIndex)`
    VoteCast,
    /// `PollClosed(uint256 indexed pollId)`
    PollClosed,
    /// `InstructorAdded(address indexed account)`
    InstructorAdded,
    /// `InstructorRemoved(address indexed account)`
    InstructorRemoved,
}

impl EventKind {
    /// Canonical ABI signature.
    #[must_use]
    pub const fn signature(self) -> &'static str {
        match self {
            Self::PollCreated => "PollCreated(uint256,string,string[])",
            Self::VoteCast => "VoteCast(uint256,address,uint256)",
            Self::PollClosed => "PollClosed(uint256)",
            Self::InstructorAdded => "InstructorAdded(address)",
            Self::InstructorRemoved => "InstructorRemoved(address)",
        }
    }

    /// Event name as it appears in the interface descriptor.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PollCreated => "PollCreated",
            Self::VoteCast => "VoteCast",
            Self::PollClosed => "PollClosed",
            Self::InstructorAdded => "InstructorAdded",
            Self::InstructorRemoved => "InstructorRemoved",
        }
    }

    /// Topic 0 for this event.
    #[must_use]
    pub fn topic(self) -> Topic {
        Topic::for_signature(self.signature())
    }
}

/// A decoded contract event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ContractEvent {
    /// A poll was created
    PollCreated {
        /// New poll id
        poll: PollId,
        /// Question text
        question: String,
        /// Option labels
        options: Vec<String>,
    },
    /// A vote was recorded
    VoteCast {
        /// Poll voted on
        poll: PollId,
        /// Voting account
        voter: Address,
        /// Chosen option index
        option: u64,
    },
    /// A poll stopped accepting votes
    PollClosed {
        /// Closed poll
        poll: PollId,
    },
    /// An account joined the instructor set
    InstructorAdded {
        /// Added account
        account: Address,
    },
    /// An account left the instructor set
    InstructorRemoved {
        /// Removed account
        account: Address,
    },
}

impl ContractEvent {
    /// Category of this event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::PollCreated { .. } => EventKind::PollCreated,
            Self::VoteCast { .. } => EventKind::VoteCast,
            Self::PollClosed { .. } => EventKind::PollClosed,
            Self::InstructorAdded { .. } => EventKind::InstructorAdded,
            Self::InstructorRemoved { .. } => EventKind::InstructorRemoved,
        }
    }

    /// Poll the event is scoped to, if any.
    #[must_use]
    pub fn poll(&self) -> Option<PollId> {
        match self {
            Self::PollCreated { poll, .. }
            | Self::VoteCast { poll, .. }
            | Self::PollClosed { poll } => Some(*poll),
            Self::InstructorAdded { .. } | Self::InstructorRemoved { .. } => None,
        }
    }

    /// Log topics as the contract would emit them.
    #[must_use]
    pub fn topics(&self) -> Vec<Topic> {
        let mut topics = vec![self.kind().topic()];
        if let Some(poll) = self.poll() {
            topics.push(Topic::for_poll(poll));
        }
        match self {
            Self::VoteCast { voter, .. } => topics.push(address_topic(voter)),
            Self::InstructorAdded { account } | Self::InstructorRemoved { account } => {
                topics.push(address_topic(account));
            }
            _ => {}
        }
        topics
    }
}

fn address_topic(address: &Address) -> Topic {
    let mut bytes = [0u8; 32];
    bytes[12..].copy_from_slice(address.as_bytes());
    Topic(bytes)
}

/// An event together with where it was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    /// Block that included the transaction
    pub block_number: u64,
    /// Emitting transaction
    pub tx_hash: TxHash,
    /// Position within the block
    pub log_index: u32,
    /// Decoded payload
    pub event: ContractEvent,
}

/// Log query over a block range, by event kind and optional poll id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    /// Event category (topic 0)
    pub kind: EventKind,
    /// Poll id (topic 1), for poll-scoped events
    pub poll: Option<PollId>,
    /// First block, inclusive
    pub from_block: u64,
    /// Last block, inclusive; `None` means latest
    pub to_block: Option<u64>,
}

impl LogFilter {
    /// Filter for `kind` from `from_block` to latest.
    #[must_use]
    pub fn new(kind: EventKind, from_block: u64) -> Self {
        Self {
            kind,
            poll: None,
            from_block,
            to_block: None,
        }
    }

    /// Restrict to one poll.
    #[must_use]
    pub fn with_poll(mut self, poll: PollId) -> Self {
        self.poll = Some(poll);
        self
    }

    /// Topic list in `eth_getLogs` order.
    #[must_use]
    pub fn topics(&self) -> Vec<Option<Topic>> {
        vec![Some(self.kind.topic()), self.poll.map(Topic::for_poll)]
    }

    /// Whether a recorded log satisfies this filter.
    #[must_use]
    pub fn matches(&self, log: &EventLog) -> bool {
        if log.block_number < self.from_block {
            return false;
        }
        if self.to_block.is_some_and(|to| log.block_number > to) {
            return false;
        }
        let topics = log.event.topics();
        self.topics()
            .iter()
            .enumerate()
            .all(|(i, want)| want.map_or(true, |t| topics.get(i) == Some(&t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(block: u64, event: ContractEvent) -> EventLog {
        EventLog {
            block_number: block,
            tx_hash: TxHash::from_bytes([block as u8; 32]),
            log_index: 0,
            event,
        }
    }

    #[test]
    fn test_signature_topics_are_keccak() {
        // keccak256("Transfer(address,address,uint256)") is the well-known ERC-20 topic
        assert_eq!(
            Topic::for_signature("Transfer(address,address,uint256)").to_string(),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
        assert_ne!(EventKind::PollCreated.topic(), EventKind::VoteCast.topic());
    }

    #[test]
    fn test_poll_topic_is_zero_padded() {
        let topic = Topic::for_poll(PollId(0x0102));
        assert_eq!(&topic.0[..30], &[0u8; 30]);
        assert_eq!(&topic.0[30..], &[0x01, 0x02]);
    }

    #[test]
    fn test_filter_matches_kind_poll_and_range() {
        let voter = Address::from_bytes([7; 20]);
        let vote = log(
            50,
            ContractEvent::VoteCast {
                poll: PollId(2),
                voter,
                option: 1,
            },
        );

        assert!(LogFilter::new(EventKind::VoteCast, 0).matches(&vote));
        assert!(LogFilter::new(EventKind::VoteCast, 0)
            .with_poll(PollId(2))
            .matches(&vote));
        assert!(!LogFilter::new(EventKind::VoteCast, 0)
            .with_poll(PollId(3))
            .matches(&vote));
        assert!(!LogFilter::new(EventKind::PollCreated, 0).matches(&vote));
        assert!(!LogFilter::new(EventKind::VoteCast, 51).matches(&vote));

        let mut bounded = LogFilter::new(EventKind::VoteCast, 0);
        bounded.to_block = Some(49);
        assert!(!bounded.matches(&vote));
    }

    #[test]
    fn test_instructor_events_have_no_poll() {
        let added = ContractEvent::InstructorAdded {
            account: Address::ZERO,
        };
        assert_eq!(added.poll(), None);
        assert_eq!(added.topics().len(), 2);
    }
}
