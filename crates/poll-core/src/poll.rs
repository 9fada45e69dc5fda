//! Poll data as read from the contract.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Fewest options a poll may have.
pub const MIN_OPTIONS: usize = 2;

/// Most options a poll may have.
pub const MAX_OPTIONS: usize = 10;

/// Poll index assigned by the contract at creation. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PollId(pub u64);

impl fmt::Display for PollId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The raw `getPoll` return tuple, before shape checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollTuple {
    /// Question text
    pub question: String,
    /// Option labels
    pub options: Vec<String>,
    /// Per-option tallies
    pub vote_counts: Vec<u64>,
    /// Whether voting is still allowed
    pub is_open: bool,
}

/// A tuple whose tallies do not line up with its options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("poll {poll} has {options} options but {tallies} tallies")]
pub struct PollShapeError {
    /// Offending poll
    pub poll: PollId,
    /// Number of option labels
    pub options: usize,
    /// Number of tallies
    pub tallies: usize,
}

/// A poll with index-aligned options and tallies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    id: PollId,
    question: String,
    options: Vec<String>,
    vote_counts: Vec<u64>,
    is_open: bool,
}

impl Poll {
    /// Build a poll from its contract tuple, checking that tallies align with options.
    pub fn from_tuple(id: PollId, tuple: PollTuple) -> Result<Self, PollShapeError> {
        if tuple.options.len() != tuple.vote_counts.len() {
            return Err(PollShapeError {
                poll: id,
                options: tuple.options.len(),
                tallies: tuple.vote_counts.len(),
            });
        }
        Ok(Self {
            id,
            question: tuple.question,
            options: tuple.options,
            vote_counts: tuple.vote_counts,
            is_open: tuple.is_open,
        })
    }

    /// Poll index.
    #[must_use]
    pub fn id(&self) -> PollId {
        self.id
    }

    /// Question text.
    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    /// Option labels in contract order.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Tallies, index-aligned with [`Poll::options`].
    #[must_use]
    pub fn vote_counts(&self) -> &[u64] {
        &self.vote_counts
    }

    /// Whether the poll still accepts votes.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Sum of all tallies.
    #[must_use]
    pub fn total_votes(&self) -> u64 {
        self.vote_counts.iter().sum()
    }
}

/// A poll annotated with the connected account's vote status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollEntry {
    /// The poll
    pub poll: Poll,
    /// Whether the connected account already voted (false with no account)
    pub has_voted: bool,
}

/// Reasons a poll draft is refused before submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    /// Question is empty after trimming
    #[error("Enter a question and at least two non-empty options.")]
    EmptyQuestion,
    /// Fewer than two non-empty options
    #[error("Enter a question and at least two non-empty options.")]
    TooFewOptions(usize),
    /// More than ten options
    #[error("Max 10 options (got {0}).")]
    TooManyOptions(usize),
}

/// A validated poll-creation request: trimmed question and 2..=10 trimmed,
/// non-empty options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollDraft {
    question: String,
    options: Vec<String>,
}

impl PollDraft {
    /// Trim inputs, drop blank options, and check bounds.
    pub fn new<I, S>(question: &str, options: I) -> Result<Self, DraftError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let question = question.trim();
        let options: Vec<String> = options
            .into_iter()
            .map(|o| o.as_ref().trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        if question.is_empty() {
            return Err(DraftError::EmptyQuestion);
        }
        if options.len() < MIN_OPTIONS {
            return Err(DraftError::TooFewOptions(options.len()));
        }
        if options.len() > MAX_OPTIONS {
            return Err(DraftError::TooManyOptions(options.len()));
        }
        Ok(Self {
            question: question.to_string(),
            options,
        })
    }

    /// Trimmed question.
    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    /// Trimmed, non-empty options.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Split into question and options.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<String>) {
        (self.question, self.options)
    }
}
