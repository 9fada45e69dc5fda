//! End-to-end board behavior against the simulated contract and wallet.

mod common;

use common::{config, deploy, Fixture, ALICE, BOB, CONTRACT, OWNER};
use poll_client::render::{NO_OPEN_POLLS, NO_POLLS};
use poll_client::{
    Action, ActionError, ActionOrigin, ActionStatus, BoardBody, ClientConfig, ClosedPollPolicy,
    CreatePollForm, PollBoard, RoleModel, SessionError, SessionState, CONNECT_PROMPT,
};
use poll_core::{ChainError, ChainId, PollId, Wallet, WalletEvent};
use poll_sim::{ContractShape, MiningMode, SimWallet, MAINNET};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_empty_board_after_connect() {
    let fx = Fixture::new();
    let view = fx.board.auto_connect().await.unwrap();

    assert_eq!(view.body, BoardBody::Empty(NO_POLLS));
    assert_eq!(view.account, Some(OWNER));
    assert_eq!(view.network_label(), "Sepolia");
    assert!(view.create_form_visible);
    assert!(view.access_form_visible);
    assert!(fx.board.state().is_connected());
}

#[tokio::test]
async fn test_vote_then_refresh_shows_tally_and_flag() {
    let fx = Fixture::new();
    fx.board.auto_connect().await.unwrap();
    let poll = fx.create_poll("Lunch?", &["Pizza", "Tacos"]).await;
    assert_eq!(
        fx.board.status(ActionOrigin::CreateForm).line(),
        format!(
            "Poll creation sent: {} (waiting…) ✓ created",
            fx.board.status(ActionOrigin::CreateForm).tx().unwrap()
        )
    );

    let receipt = fx
        .board
        .dispatch(Action::Vote { poll, option: 1 })
        .await
        .unwrap();

    let view = fx.board.view();
    let card = view.card(poll).unwrap();
    assert!(card.has_voted);
    assert_eq!(card.voted_tag(), Some("You already voted"));
    assert_eq!(card.total_votes, 1);
    assert_eq!(card.options[0].tally_label(), "0");
    assert_eq!(card.options[1].tally_label(), "1 (100%)");
    assert!(card.options.iter().all(|o| !o.vote_enabled));

    let status = fx.board.status(ActionOrigin::Poll(poll));
    assert!(matches!(status, ActionStatus::Confirmed { tx, .. } if tx == receipt.tx_hash));
    assert!(status.line().starts_with("Vote sent: 0x"));
    assert!(status.line().ends_with("✓ confirmed"));
}

#[tokio::test]
async fn test_second_vote_rejected_locally() {
    let fx = Fixture::new();
    fx.board.auto_connect().await.unwrap();
    let poll = fx.create_poll("Lunch?", &["Pizza", "Tacos"]).await;
    fx.board
        .dispatch(Action::Vote { poll, option: 0 })
        .await
        .unwrap();
    fx.chain.set_mining(MiningMode::Manual);

    let err = fx
        .board
        .dispatch(Action::Vote { poll, option: 1 })
        .await
        .unwrap_err();
    assert_eq!(err, ActionError::AlreadyVoted(poll));
    assert_eq!(fx.chain.pending_count(), 0);
    assert_eq!(
        fx.board.status(ActionOrigin::Poll(poll)).line(),
        "You already voted"
    );
}

#[tokio::test]
async fn test_revert_reason_reaches_status_line() {
    let fx = Fixture::new();
    fx.board.auto_connect().await.unwrap();
    let poll = fx.create_poll("Lunch?", &["Pizza", "Tacos"]).await;

    // Close it behind the board's back so the snapshot still shows it open
    let other = Fixture::over(fx.chain.clone(), fx.wallet.clone(), config());
    other.board.auto_connect().await.unwrap();
    other.board.dispatch(Action::ClosePoll(poll)).await.unwrap();

    let err = fx
        .board
        .dispatch(Action::Vote { poll, option: 0 })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ActionError::Chain(ChainError::Reverted {
            reason: "Poll is closed".to_string()
        })
    );
    assert_eq!(
        fx.board.status(ActionOrigin::Poll(poll)).line(),
        "Error: Poll is closed"
    );
}

#[tokio::test]
async fn test_wallet_rejection_message() {
    let fx = Fixture::new();
    fx.board.auto_connect().await.unwrap();
    let poll = fx.create_poll("Lunch?", &["Pizza", "Tacos"]).await;

    fx.wallet.reject_next_prompt();
    let err = fx
        .board
        .dispatch(Action::Vote { poll, option: 0 })
        .await
        .unwrap_err();
    assert_eq!(err, ActionError::Chain(ChainError::UserRejected));
    assert!(!err.is_local());
    assert_eq!(
        fx.board.status(ActionOrigin::Poll(poll)).line(),
        "Error: Request rejected in wallet"
    );
    assert!(!fx.board.view().card(poll).unwrap().has_voted);
}

#[tokio::test]
async fn test_stale_action_cannot_touch_new_session() {
    let fx = Fixture::new();
    fx.board.auto_connect().await.unwrap();
    let poll = fx.create_poll("Lunch?", &["Pizza", "Tacos"]).await;
    let first = fx.board.session().unwrap();

    fx.chain.set_mining(MiningMode::Manual);
    let board = fx.board.clone();
    let pending =
        tokio::spawn(async move { board.dispatch(Action::Vote { poll, option: 0 }).await });
    while fx.chain.pending_count() == 0 {
        tokio::task::yield_now().await;
    }

    fx.switch_to(ALICE).await;
    let second = fx.board.session().unwrap();
    assert!(second.epoch() > first.epoch());

    fx.chain.mine();
    pending.await.unwrap().unwrap();

    // The old session saw its action through
    assert!(matches!(
        first.statuses().get(ActionOrigin::Poll(poll)),
        ActionStatus::Confirmed { .. }
    ));
    // The new session never heard of it
    assert_eq!(fx.board.status(ActionOrigin::Poll(poll)), ActionStatus::Idle);
    let view = fx.board.view();
    assert_eq!(view.account, Some(ALICE));
    let card = view.card(poll).unwrap();
    assert!(!card.has_voted);
    assert_eq!(card.total_votes, 0);

    // A fresh read under the new session sees the vote, but not as Alice's
    let view = fx.board.refresh().await;
    let card = view.card(poll).unwrap();
    assert_eq!(card.total_votes, 1);
    assert!(!card.has_voted);
}

#[tokio::test]
async fn test_reconnect_drops_old_view_before_new_session() {
    let (fx, held) = Fixture::held();
    fx.board.auto_connect().await.unwrap();
    let poll = fx.create_poll("Lunch?", &["Pizza", "Tacos"]).await;
    assert!(fx.board.view().create_form_visible);

    held.hold_next();
    let board = fx.board.clone();
    let reload = tokio::spawn(async move { board.reload().await });
    held.parked().await;

    // Halfway through the reconnect nothing of the owner's session is left
    assert!(fx.board.session().is_none());
    assert!(fx.board.snapshot().is_none());
    let view = fx.board.view();
    assert_eq!(view.account, None);
    assert_eq!(view.body, BoardBody::Loading);
    assert!(!view.create_form_visible);
    assert!(!view.access_form_visible);

    held.release();
    let view = reload.await.unwrap();
    assert_eq!(view.account, Some(OWNER));
    assert!(view.create_form_visible);
    assert!(view.card(poll).is_some());
}

#[tokio::test]
async fn test_action_settling_mid_reconnect_is_discarded() {
    let (fx, held) = Fixture::held();
    fx.board.auto_connect().await.unwrap();
    let poll = fx.create_poll("Lunch?", &["Pizza", "Tacos"]).await;
    let first = fx.board.session().unwrap();

    fx.chain.set_mining(MiningMode::Manual);
    let board = fx.board.clone();
    let pending =
        tokio::spawn(async move { board.dispatch(Action::Vote { poll, option: 0 }).await });
    while fx.chain.pending_count() == 0 {
        tokio::task::yield_now().await;
    }

    fx.wallet.switch_account(ALICE);
    held.hold_next();
    let board = fx.board.clone();
    let reload = tokio::spawn(async move {
        board
            .handle_wallet_event(WalletEvent::AccountsChanged(vec![ALICE]))
            .await
    });
    held.parked().await;

    // Settles while the new session is still being built
    fx.chain.mine();
    pending.await.unwrap().unwrap();
    assert!(matches!(
        first.statuses().get(ActionOrigin::Poll(poll)),
        ActionStatus::Confirmed { .. }
    ));
    let view = fx.board.view();
    assert_eq!(view.account, None);
    assert_eq!(view.body, BoardBody::Loading);
    assert!(fx.board.snapshot().is_none());

    held.release();
    let view = reload.await.unwrap();
    assert_eq!(view.account, Some(ALICE));
    assert_eq!(fx.board.status(ActionOrigin::Poll(poll)), ActionStatus::Idle);
    let card = view.card(poll).unwrap();
    assert_eq!(card.total_votes, 1);
    assert!(!card.has_voted);
}

#[tokio::test]
async fn test_closed_polls_hidden_by_default() {
    let fx = Fixture::new();
    fx.board.auto_connect().await.unwrap();
    let first = fx.create_poll("First?", &["a", "b"]).await;
    let second = fx.create_poll("Second?", &["a", "b"]).await;

    fx.board.dispatch(Action::ClosePoll(first)).await.unwrap();
    let view = fx.board.view();
    assert!(view.card(first).is_none());
    assert!(view.card(second).unwrap().close_visible);

    fx.board.dispatch(Action::ClosePoll(second)).await.unwrap();
    assert_eq!(fx.board.view().body, BoardBody::Empty(NO_OPEN_POLLS));
    assert_eq!(fx.board.snapshot().unwrap().total, 2);
}

#[tokio::test]
async fn test_closed_polls_shown_when_configured() {
    let fx = Fixture::with(
        ContractShape::Full,
        OWNER,
        ClientConfig {
            closed_polls: ClosedPollPolicy::Show,
            ..config()
        },
    );
    fx.board.auto_connect().await.unwrap();
    let poll = fx.create_poll("First?", &["a", "b"]).await;
    fx.board.dispatch(Action::ClosePoll(poll)).await.unwrap();

    let view = fx.board.view();
    let card = view.card(poll).unwrap();
    assert_eq!(card.status_label(), "Closed");
    assert!(!card.close_visible);
    assert!(card.options.iter().all(|o| !o.vote_enabled));

    let err = fx
        .board
        .dispatch(Action::Vote { poll, option: 0 })
        .await
        .unwrap_err();
    assert_eq!(err, ActionError::PollClosed(poll));
}

#[tokio::test]
async fn test_create_from_form() {
    let fx = Fixture::new();
    fx.board.auto_connect().await.unwrap();

    let mut form = CreatePollForm::new();
    let row = form.add_option().unwrap();
    form.set_option(row, "SOL").unwrap();
    fx.board
        .dispatch(Action::create_from_form(&form).unwrap())
        .await
        .unwrap();
    form.reset();

    let view = fx.board.view();
    let card = view.card(PollId(0)).unwrap();
    assert_eq!(card.question, "What’s your favourite cryptocurrency?");
    assert_eq!(card.options.len(), 3);
    assert_eq!(card.options[2].label, "SOL");
}

#[tokio::test]
async fn test_legacy_contract_hides_privileged_forms() {
    let fx = Fixture::with(ContractShape::Legacy, OWNER, config());
    let view = fx.board.auto_connect().await.unwrap();

    let capabilities = fx.board.session().unwrap().capabilities().clone();
    assert!(!capabilities.owner.is_supported());
    assert!(!view.create_form_visible);
    assert!(!view.access_form_visible);
    assert_eq!(view.body, BoardBody::Empty(NO_POLLS));
}

#[tokio::test]
async fn test_owner_only_contract() {
    let fx = Fixture::with(
        ContractShape::OwnerOnly,
        OWNER,
        ClientConfig {
            role_model: RoleModel::OwnerOnly,
            ..config()
        },
    );
    let view = fx.board.auto_connect().await.unwrap();
    assert!(view.create_form_visible);
    assert!(!view.access_form_visible);

    fx.switch_to(BOB).await;
    let view = fx.board.view();
    assert!(!view.create_form_visible);
    assert!(!view.access_form_visible);
}

#[tokio::test]
async fn test_instructor_gains_create_rights() {
    let fx = Fixture::new();
    fx.board.auto_connect().await.unwrap();
    fx.board
        .dispatch(Action::add_instructor(&ALICE.to_string()).unwrap())
        .await
        .unwrap();
    assert!(fx
        .board
        .status(ActionOrigin::AccessForm)
        .line()
        .ends_with("✓ added"));

    fx.switch_to(ALICE).await;
    let view = fx.board.view();
    assert!(view.create_form_visible);
    assert!(!view.access_form_visible);
    assert!(fx.board.session().unwrap().capabilities().is_instructor);

    fx.switch_to(BOB).await;
    assert!(!fx.board.view().create_form_visible);
}

#[tokio::test]
async fn test_invalid_instructor_address() {
    let err = Action::add_instructor("0x1234").unwrap_err();
    assert!(err.is_local());
    assert!(matches!(err, ActionError::InvalidAddress(_)));
}

#[tokio::test]
async fn test_no_wallet() {
    let board = PollBoard::new(config(), None);
    let err = board.connect().await.unwrap_err();
    assert!(matches!(err, SessionError::WalletUnavailable));
    assert!(matches!(board.view().body, BoardBody::Error(_)));
    assert!(matches!(board.state(), SessionState::Error { .. }));
    assert!(board.subscribe_wallet().is_err());
}

#[tokio::test]
async fn test_invalid_contract_address_never_prompts() {
    let chain = deploy(ContractShape::Full);
    let wallet = Arc::new(SimWallet::new(chain.clone(), OWNER));
    let fx = Fixture::over(
        chain,
        wallet,
        ClientConfig {
            contract_address: format!("0x{}", "ab".repeat(32)),
            ..config()
        },
    );

    let err = fx.board.connect().await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidAddress(_)));
    assert!(fx.wallet.accounts().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unauthorized_wallet_shows_connect_prompt() {
    let chain = deploy(ContractShape::Full);
    let wallet = Arc::new(SimWallet::new(chain.clone(), OWNER));
    let fx = Fixture::over(chain, wallet, config());

    let view = fx.board.auto_connect().await.unwrap();
    assert_eq!(view.body, BoardBody::Empty(CONNECT_PROMPT));
    assert!(fx.board.session().is_none());

    let view = fx.board.connect().await.unwrap();
    assert_eq!(view.account, Some(OWNER));
}

#[tokio::test]
async fn test_connect_rejected_in_wallet() {
    let chain = deploy(ContractShape::Full);
    let wallet = Arc::new(SimWallet::new(chain.clone(), OWNER));
    let fx = Fixture::over(chain, wallet, config());

    fx.wallet.reject_next_prompt();
    let err = fx.board.connect().await.unwrap_err();
    assert_eq!(err.to_string(), "Request rejected in wallet");
    assert_eq!(fx.board.state().error_message(), Some("Request rejected in wallet"));
}

#[tokio::test]
async fn test_wrong_network_then_switch() {
    let chain = deploy(ContractShape::Full);
    let wallet = Arc::new(
        SimWallet::new(chain.clone(), OWNER)
            .with_authorization()
            .on_chain(MAINNET)
            .forget_chain(ChainId::SEPOLIA),
    );
    let fx = Fixture::over(chain, wallet, config());

    let view = fx.board.auto_connect().await.unwrap();
    assert_eq!(view.network_label(), "Wrong network");
    assert!(view.network.as_ref().unwrap().switch_visible());
    assert!(matches!(view.body, BoardBody::Error(ref m) if m.starts_with("Error loading polls")));

    fx.board.switch_network().await.unwrap();
    assert_eq!(fx.wallet.active_chain(), ChainId::SEPOLIA);
    assert_eq!(fx.wallet.added_networks().len(), 1);

    let view = fx
        .board
        .handle_wallet_event(poll_core::WalletEvent::ChainChanged(ChainId::SEPOLIA))
        .await;
    assert_eq!(view.network_label(), "Sepolia");
    assert_eq!(view.body, BoardBody::Empty(NO_POLLS));
}

#[tokio::test]
async fn test_single_poll_read_failure_fails_listing() {
    let fx = Fixture::new();
    fx.board.auto_connect().await.unwrap();
    let poll = fx.create_poll("Lunch?", &["Pizza", "Tacos"]).await;
    fx.create_poll("Dinner?", &["Soup", "Salad"]).await;

    fx.chain
        .fail_poll_read(poll, ChainError::Transport("timeout".to_string()));
    let view = fx.board.refresh().await;
    assert_eq!(
        view.body,
        BoardBody::Error("Error loading polls: timeout".to_string())
    );
    // The last good listing still backs validation
    assert_eq!(fx.board.snapshot().unwrap().total, 2);
}

#[tokio::test]
async fn test_event_loop_reacts_to_lock() {
    let fx = Fixture::new();
    fx.board.auto_connect().await.unwrap();

    let events = fx.board.subscribe_wallet().unwrap();
    let board = fx.board.clone();
    let task = tokio::spawn(async move { board.run_event_loop(events).await });

    let mut views = fx.board.subscribe_view();
    fx.wallet.lock();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if views.borrow_and_update().body == BoardBody::Empty(CONNECT_PROMPT) {
                break;
            }
            views.changed().await.unwrap();
        }
    })
    .await
    .unwrap();

    assert!(fx.board.session().is_none());
    assert_eq!(fx.board.state(), SessionState::Disconnected);
    task.abort();
}

#[tokio::test]
async fn test_second_board_on_other_contract_sees_nothing() {
    let fx = Fixture::with(
        ContractShape::Full,
        OWNER,
        ClientConfig {
            contract_address: BOB.to_string(),
            ..config()
        },
    );
    assert_ne!(BOB, CONTRACT);
    let view = fx.board.auto_connect().await.unwrap();
    assert!(matches!(view.body, BoardBody::Error(_)));
}
