//! Activity history and the instructor roster over the simulated chain.

mod common;

use common::{config, Fixture, ALICE, BOB, OWNER};
use poll_client::{Action, ActivityConfig, ActivityError, ActivityKind, ClientConfig};
use poll_core::ChainError;
use poll_sim::ContractShape;

#[tokio::test]
async fn test_fresh_poll_has_creation_and_no_votes() {
    let fx = Fixture::new();
    fx.board.auto_connect().await.unwrap();
    let poll = fx.create_poll("Lunch?", &["Pizza", "Tacos"]).await;

    let activity = fx.board.activity(poll).await.unwrap();
    let created = activity.created.as_ref().unwrap();
    assert_eq!(created.kind, ActivityKind::Created);
    assert!(created.url.is_some());
    assert!(activity.votes.is_empty());
    assert_eq!(activity.lines()[1], "No votes yet");
}

#[tokio::test]
async fn test_votes_listed_in_chain_order() {
    let fx = Fixture::new();
    fx.board.auto_connect().await.unwrap();
    let poll = fx.create_poll("Lunch?", &["Pizza", "Tacos"]).await;

    for voter in [ALICE, BOB] {
        fx.switch_to(voter).await;
        fx.board
            .dispatch(Action::Vote { poll, option: 0 })
            .await
            .unwrap();
    }

    let activity = fx.board.activity(poll).await.unwrap();
    let voters: Vec<_> = activity.votes.iter().map(|v| v.voter).collect();
    assert_eq!(voters, vec![Some(ALICE), Some(BOB)]);
    assert!(activity.votes[0].block_number < activity.votes[1].block_number);
    assert_eq!(
        activity.lines()[1],
        format!("Vote by {} — {}", ALICE.short(), activity.votes[0].tx_hash.short())
    );
}

#[tokio::test]
async fn test_creation_outside_window_is_placeholder() {
    let fx = Fixture::with(
        ContractShape::Full,
        OWNER,
        ClientConfig {
            activity: ActivityConfig {
                poll_window: 100,
                ..ActivityConfig::default()
            },
            ..config()
        },
    );
    fx.board.auto_connect().await.unwrap();
    let poll = fx.create_poll("Lunch?", &["Pizza", "Tacos"]).await;
    fx.chain.advance_blocks(500);

    let activity = fx.board.activity(poll).await.unwrap();
    assert!(activity.created.is_none());
    assert_eq!(
        activity.lines(),
        vec!["Poll created — not in recent window", "No votes yet"]
    );
    assert_eq!(activity.from_block, activity.to_block - 100);
}

#[tokio::test]
async fn test_activity_failure_is_isolated() {
    let fx = Fixture::new();
    fx.board.auto_connect().await.unwrap();
    let poll = fx.create_poll("Lunch?", &["Pizza", "Tacos"]).await;

    fx.chain
        .fail_reads_with(Some(ChainError::Transport("node down".to_string())));
    let err = fx.board.activity(poll).await.unwrap_err();
    assert!(matches!(err, ActivityError::Read(_)));
    // The board itself is not touched by an activity failure
    assert!(fx.board.view().card(poll).is_some());
}

#[tokio::test]
async fn test_roster_replays_adds_and_removes() {
    let fx = Fixture::new();
    fx.board.auto_connect().await.unwrap();

    for action in [
        Action::AddInstructor(ALICE),
        Action::AddInstructor(BOB),
        Action::RemoveInstructor(ALICE),
    ] {
        fx.board.dispatch(action).await.unwrap();
    }

    let roster = fx.board.roster().await.unwrap();
    assert_eq!(roster.members(), vec![BOB]);
    assert_eq!(roster.membership.get(&ALICE), Some(&false));

    fx.board
        .dispatch(Action::AddInstructor(ALICE))
        .await
        .unwrap();
    let roster = fx.board.roster().await.unwrap();
    let mut members = roster.members();
    members.sort();
    let mut expected = vec![ALICE, BOB];
    expected.sort();
    assert_eq!(members, expected);
}

#[tokio::test]
async fn test_activity_requires_session() {
    let fx = Fixture::new();
    let err = fx.board.roster().await.unwrap_err();
    assert!(matches!(err, ActivityError::NotConnected));
}
