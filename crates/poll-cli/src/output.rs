//! Plain-text rendering of board views.

use poll_client::{ActionStatus, BoardBody, BoardView, PollActivity, PollCard, Roster};

/// Address and network indicators, plus which forms are available.
pub fn header(view: &BoardView) -> String {
    let mut out = format!(
        "Account: {}\nNetwork: {}",
        view.account_label(),
        view.network_label()
    );
    if view
        .network
        .as_ref()
        .is_some_and(|network| network.switch_visible())
    {
        out.push_str("  (run `poll-board switch-network`)");
    }
    let mut forms = Vec::new();
    if view.create_form_visible {
        forms.push("create/close polls");
    }
    if view.access_form_visible {
        forms.push("manage instructors");
    }
    if !forms.is_empty() {
        out.push_str(&format!("\nYou can: {}", forms.join(", ")));
    }
    out
}

/// One poll card.
pub fn card(card: &PollCard) -> String {
    let mut out = format!(
        "#{} {} [{}] ({} votes)",
        card.id,
        card.question,
        card.status_label(),
        card.total_votes
    );
    if let Some(tag) = card.voted_tag() {
        out.push_str(&format!("  {tag}"));
    }
    for row in &card.options {
        out.push_str(&format!(
            "\n   {}. {}  {}",
            row.index,
            row.label,
            row.tally_label()
        ));
    }
    out
}

/// Board body: cards, an empty-state message, or the listing error.
pub fn body(view: &BoardView) -> String {
    match &view.body {
        BoardBody::Loading => poll_client::render::LOADING.to_string(),
        BoardBody::Empty(message) => (*message).to_string(),
        BoardBody::Error(message) => message.clone(),
        BoardBody::Polls(cards) => cards.iter().map(card).collect::<Vec<_>>().join("\n\n"),
    }
}

/// Status line with the explorer link appended when known.
pub fn status(status: &ActionStatus) -> String {
    match status {
        ActionStatus::Submitted { url: Some(url), .. }
        | ActionStatus::Confirmed { url: Some(url), .. } => format!("{}\n{url}", status.line()),
        _ => status.line(),
    }
}

/// Activity lines for one poll.
pub fn activity(activity: &PollActivity) -> String {
    format!(
        "Poll #{} activity (blocks {}..={}):\n{}",
        activity.poll,
        activity.from_block,
        activity.to_block,
        activity
            .lines()
            .iter()
            .map(|line| format!("  {line}"))
            .collect::<Vec<_>>()
            .join("\n")
    )
}

/// Instructor roster.
pub fn roster(roster: &Roster) -> String {
    let members = roster.members();
    if members.is_empty() {
        return format!("No instructors since block {}", roster.from_block);
    }
    let mut out = format!("Instructors (since block {}):", roster.from_block);
    for member in members {
        out.push_str(&format!("\n  {member}"));
    }
    out
}
