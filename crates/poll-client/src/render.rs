//! Pure view models for the poll board.
//!
//! Nothing here performs I/O. A card is a function of one [`PollEntry`] and
//! the session's [`Capabilities`]; the board is a function of the listing
//! result and the same capabilities.

use crate::error::ListError;
use crate::repository::Listing;
use crate::roles::Capabilities;
use crate::validator::NetworkCheck;
use poll_core::{Address, PollEntry, PollId};

/// Tag shown on polls the account already voted in.
pub const VOTED_TAG: &str = "You already voted";

/// Board message when the chain has no polls.
pub const NO_POLLS: &str = "No polls yet.";

/// Board message when every poll was filtered out.
pub const NO_OPEN_POLLS: &str = "No open polls.";

/// Board message while the first listing is in flight.
pub const LOADING: &str = "Loading polls…";

/// Share of `votes` in `total`, rounded half up; `None` when `total` is zero.
#[must_use]
pub fn percent(votes: u64, total: u64) -> Option<u8> {
    if total == 0 {
        return None;
    }
    let (votes, total) = (u128::from(votes), u128::from(total));
    let rounded = (200 * votes + total) / (2 * total);
    u8::try_from(rounded.min(100)).ok()
}

/// One option row on a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionRow {
    /// Option index passed to `vote`
    pub index: u64,
    /// Option label
    pub label: String,
    /// Tally
    pub votes: u64,
    /// Rounded share, absent when nobody has voted
    pub percent: Option<u8>,
    /// Whether the vote control is active
    pub vote_enabled: bool,
}

impl OptionRow {
    /// Tally text, e.g. `2 (67%)`, or just `0` before any vote.
    #[must_use]
    pub fn tally_label(&self) -> String {
        match self.percent {
            Some(p) => format!("{} ({p}%)", self.votes),
            None => self.votes.to_string(),
        }
    }
}

/// View model for one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollCard {
    /// Poll index
    pub id: PollId,
    /// Question text
    pub question: String,
    /// Option rows in contract order
    pub options: Vec<OptionRow>,
    /// Sum of all tallies
    pub total_votes: u64,
    /// Accepting votes
    pub is_open: bool,
    /// Connected account already voted
    pub has_voted: bool,
    /// Close control shown
    pub close_visible: bool,
}

impl PollCard {
    /// `Open` or `Closed`.
    #[must_use]
    pub fn status_label(&self) -> &'static str {
        if self.is_open {
            "Open"
        } else {
            "Closed"
        }
    }

    /// The "already voted" tag, when it applies.
    #[must_use]
    pub fn voted_tag(&self) -> Option<&'static str> {
        self.has_voted.then_some(VOTED_TAG)
    }
}

/// Map one poll to its card.
#[must_use]
pub fn render_poll(entry: &PollEntry, capabilities: &Capabilities) -> PollCard {
    let poll = &entry.poll;
    let total = poll.total_votes();
    let vote_enabled = poll.is_open() && !entry.has_voted;

    let options = poll
        .options()
        .iter()
        .zip(poll.vote_counts())
        .enumerate()
        .map(|(index, (label, &votes))| OptionRow {
            index: index as u64,
            label: label.clone(),
            votes,
            percent: percent(votes, total),
            vote_enabled,
        })
        .collect();

    PollCard {
        id: poll.id(),
        question: poll.question().to_string(),
        options,
        total_votes: total,
        is_open: poll.is_open(),
        has_voted: entry.has_voted,
        close_visible: capabilities.can_close() && poll.is_open(),
    }
}

/// Main board area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardBody {
    /// First listing not finished
    Loading,
    /// One card per listed poll
    Polls(Vec<PollCard>),
    /// Nothing to list
    Empty(&'static str),
    /// Listing failed; shown instead of any cards
    Error(String),
}

/// Complete board view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    /// Cards, empty-state message, or error
    pub body: BoardBody,
    /// Create-poll form shown
    pub create_form_visible: bool,
    /// Instructor management form shown
    pub access_form_visible: bool,
    /// Connected account, for the address indicator
    pub account: Option<Address>,
    /// Network indicator
    pub network: Option<NetworkCheck>,
}

impl Default for BoardView {
    fn default() -> Self {
        Self {
            body: BoardBody::Loading,
            create_form_visible: false,
            access_form_visible: false,
            account: None,
            network: None,
        }
    }
}

impl BoardView {
    /// Attach the session indicators.
    #[must_use]
    pub fn with_session(mut self, account: Address, network: NetworkCheck) -> Self {
        self.account = Some(account);
        self.network = Some(network);
        self
    }

    /// Cards, if the listing succeeded and was non-empty.
    #[must_use]
    pub fn cards(&self) -> &[PollCard] {
        match &self.body {
            BoardBody::Polls(cards) => cards,
            _ => &[],
        }
    }

    /// Card for `id`, if listed.
    #[must_use]
    pub fn card(&self, id: PollId) -> Option<&PollCard> {
        self.cards().iter().find(|c| c.id == id)
    }

    /// Address indicator text.
    #[must_use]
    pub fn account_label(&self) -> String {
        self.account
            .map_or_else(|| "Not connected".to_string(), |a| a.short())
    }

    /// Network indicator text.
    #[must_use]
    pub fn network_label(&self) -> String {
        self.network
            .as_ref()
            .map_or_else(|| "Not connected".to_string(), NetworkCheck::status_label)
    }
}

/// Map a listing result to the board view.
#[must_use]
pub fn render_board(
    listing: &Result<Listing, ListError>,
    capabilities: &Capabilities,
) -> BoardView {
    let body = match listing {
        Err(err) => BoardBody::Error(err.to_string()),
        Ok(listing) if listing.total == 0 => BoardBody::Empty(NO_POLLS),
        Ok(listing) if listing.entries.is_empty() => BoardBody::Empty(NO_OPEN_POLLS),
        Ok(listing) => BoardBody::Polls(
            listing
                .entries
                .iter()
                .map(|entry| render_poll(entry, capabilities))
                .collect(),
        ),
    };
    BoardView {
        body,
        create_form_visible: capabilities.can_create(),
        access_form_visible: capabilities.can_manage_access(),
        account: None,
        network: None,
    }
}
