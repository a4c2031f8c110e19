// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end engine behaviour against mock wallet, chain and store.

mod common;

use std::time::Duration;

use common::{Harness, drain};
use questline_bus::{EngineEvent, NoticeLevel};
use questline_config::QuestlineConfig;
use questline_config::model::{FieldAuthority, ReconcileMode};
use questline_core::types::MICRO_PER_TOKEN;
use questline_core::{
    BadgeId, MissionId, QuestlineError, SignInOutcome, SignInStatus, TxId, WalletAddress,
};
use questline_engine::{CacheState, PollOutcome};
use questline_test_utils::TEST_ADDRESS;
use questline_test_utils::mock_chain::StatusStep;

#[tokio::test(start_paused = true)]
async fn mission_completion_is_optimistic_then_verified() {
    let h = Harness::new().await;
    h.wallet.push_tx("abc").await;
    h.chain
        .script("abc", [StatusStep::pending(), StatusStep::success()])
        .await;
    h.chain_mission(1, true).await;

    let ticket = h.engine.complete_mission(MissionId(1)).await.unwrap();
    assert_eq!(ticket.tx_id, TxId("abc".into()));
    let state = h.engine.snapshot();
    assert_eq!(state.xp(), 50);
    assert!(state.has_mission(MissionId(1)));

    assert!(matches!(ticket.settled().await, PollOutcome::Confirmed(_)));
    let state = h.engine.snapshot();
    assert_eq!(state.xp(), 50);
    assert!(state.has_mission(MissionId(1)));
    assert_eq!(h.chain.status_queries("abc").await, 2);

    let stored = h.store.stored(&h.address).await.unwrap();
    assert_eq!(stored.xp, 50);
    assert!(stored.completed_missions.contains(&MissionId(1)));

    let calls = h.wallet.submitted().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].function_name, "complete-mission");
    assert_eq!(calls[0].contract.name, "genesis-rewards-v1");
}

#[tokio::test(start_paused = true)]
async fn completing_a_mission_twice_submits_once() {
    let h = Harness::new().await;
    h.chain.set_default_step(StatusStep::success()).await;
    h.chain_mission(1, true).await;

    let first = h.engine.complete_mission(MissionId(1)).await.unwrap();
    let again = h.engine.complete_mission(MissionId(1)).await;
    assert!(matches!(again, Err(QuestlineError::AlreadyCompleted { .. })));

    first.settled().await;
    let after = h.engine.complete_mission(MissionId(1)).await;
    assert!(matches!(after, Err(QuestlineError::AlreadyCompleted { .. })));

    assert_eq!(h.wallet.submission_count().await, 1);
    assert_eq!(h.engine.snapshot().xp(), 50);
}

#[tokio::test(start_paused = true)]
async fn concurrent_awards_both_count() {
    let h = Harness::new().await;
    h.chain.set_default_step(StatusStep::success()).await;
    h.chain_mission(1, true).await;
    h.chain_mission(3, true).await;

    let (a, b) = tokio::join!(
        h.engine.complete_mission(MissionId(1)),
        h.engine.complete_mission(MissionId(3)),
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_ne!(a.tx_id, b.tx_id);
    assert_eq!(h.engine.snapshot().xp(), 150);

    a.settled().await;
    b.settled().await;
    assert_eq!(h.engine.snapshot().xp(), 150);
    assert_eq!(h.store.stored(&h.address).await.unwrap().xp, 150);
}

#[tokio::test(start_paused = true)]
async fn cancelled_prompt_changes_nothing() {
    let h = Harness::new().await;
    h.wallet.push_cancel().await;
    let mut events = h.engine.events();
    let before = h.engine.snapshot();

    let err = h.engine.complete_mission(MissionId(2)).await.unwrap_err();
    assert!(matches!(err, QuestlineError::Cancelled));
    assert_eq!(h.engine.snapshot(), before);
    assert!(h.engine.pending().is_empty());

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(h.chain.total_status_queries().await, 0, "no poller started");
    assert_eq!(h.store.write_attempts(), 0);

    let notices: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            EngineEvent::Notice(n) => Some(n),
            _ => None,
        })
        .collect();
    let last = notices.last().unwrap();
    assert_eq!(last.level, NoticeLevel::Info);
    assert_eq!(last.message, "Transaction cancelled by user.");

    // The target is free again after a cancelled prompt.
    assert!(h.engine.complete_mission(MissionId(2)).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn chain_overrides_optimistic_badge() {
    let h = Harness::builder().with_profile(|p| p.xp = 200).build().await;
    h.chain.set_default_step(StatusStep::success()).await;
    h.chain_badge("genesis", false).await;
    let mut events = h.engine.events();

    let ticket = h.engine.mint_badge("genesis").await.unwrap();
    assert!(h.engine.snapshot().has_badge(&BadgeId("genesis".into())));

    assert!(matches!(ticket.settled().await, PollOutcome::Confirmed(_)));
    assert!(!h.engine.snapshot().has_badge(&BadgeId("genesis".into())));

    let corrected = drain(&mut events).into_iter().find_map(|e| match e {
        EngineEvent::Reconciled { corrected, .. } => Some(corrected),
        _ => None,
    });
    assert!(corrected.unwrap().contains(&"badge genesis".to_string()));
}

#[tokio::test(start_paused = true)]
async fn locked_badge_is_rejected_without_prompt() {
    let h = Harness::new().await;
    let err = h.engine.mint_badge("guardian").await.unwrap_err();
    assert!(matches!(err, QuestlineError::BadgeLocked { .. }));
    assert_eq!(h.wallet.submission_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn aborted_transaction_is_rolled_back() {
    let h = Harness::new().await;
    h.wallet.push_tx("bad").await;
    h.chain
        .script("bad", [StatusStep::pending(), StatusStep::abort("u101")])
        .await;
    let mut events = h.engine.events();

    let ticket = h.engine.complete_mission(MissionId(2)).await.unwrap();
    assert_eq!(h.engine.snapshot().xp(), 50);

    let err = ticket.confirmed().await.unwrap_err();
    match err {
        QuestlineError::TransactionAborted { error_code, .. } => {
            assert_eq!(error_code.as_deref(), Some("u101"))
        }
        other => panic!("unexpected error: {other}"),
    }

    let state = h.engine.snapshot();
    assert_eq!(state.xp(), 0);
    assert!(!state.has_mission(MissionId(2)));
    assert!(h.engine.pending().is_empty());

    let stored = h.store.stored(&h.address).await.unwrap();
    assert_eq!(stored.xp, 0, "compensating write");
    assert!(stored.completed_missions.is_empty());

    let events = drain(&mut events);
    assert!(events.iter().any(|e| matches!(
        e,
        EngineEvent::ActionFailed { error_code: Some(code), .. } if code == "u101"
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        EngineEvent::Notice(n) if n.level == NoticeLevel::Error && n.message.contains("u101")
    )));
}

fn backend_authority(config: &mut QuestlineConfig) {
    config.reconcile.authority.experience = FieldAuthority::Backend;
    config.reconcile.authority.missions = FieldAuthority::Backend;
}

#[tokio::test(start_paused = true)]
async fn aborted_award_stays_reverted_under_backend_authority() {
    let h = Harness::builder().configure(backend_authority).build().await;
    h.wallet.push_tx("bad").await;
    h.chain
        .script("bad", [StatusStep::pending(), StatusStep::abort("u101")])
        .await;

    let ticket = h.engine.complete_mission(MissionId(2)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(
        h.store.stored(&h.address).await.unwrap().xp,
        50,
        "optimistic award mirrored to the store"
    );

    ticket.confirmed().await.unwrap_err();

    let state = h.engine.snapshot();
    assert_eq!(state.xp(), 0);
    assert!(!state.has_mission(MissionId(2)));
    let stored = h.store.stored(&h.address).await.unwrap();
    assert_eq!(stored.xp, 0);
    assert!(stored.completed_missions.is_empty());
}

#[tokio::test(start_paused = true)]
async fn concurrent_awards_survive_backend_reconcile() {
    let h = Harness::builder().configure(backend_authority).build().await;
    h.wallet.push_tx("first").await;
    h.wallet.push_tx("second").await;
    h.chain.script("first", [StatusStep::success()]).await;
    h.chain
        .script("second", [StatusStep::pending(), StatusStep::success()])
        .await;

    let first = h.engine.complete_mission(MissionId(1)).await.unwrap();
    let second = h.engine.complete_mission(MissionId(3)).await.unwrap();
    first.confirmed().await.unwrap();
    assert_eq!(h.engine.snapshot().xp(), 150, "first settle kept the second award");

    second.confirmed().await.unwrap();
    let state = h.engine.snapshot();
    assert_eq!(state.xp(), 150);
    assert!(state.has_mission(MissionId(1)) && state.has_mission(MissionId(3)));
    assert_eq!(h.store.stored(&h.address).await.unwrap().xp, 150);
}

#[tokio::test(start_paused = true)]
async fn unconfirmed_transaction_times_out() {
    let h = Harness::builder()
        .configure(|c| c.poller.max_wait_secs = 60)
        .build()
        .await;
    let mut events = h.engine.events();

    let ticket = h.engine.perform_check_in().await.unwrap();
    let tx_id = ticket.tx_id.clone();
    let outcome = ticket.settled().await;

    assert_eq!(
        outcome,
        PollOutcome::TimedOut {
            waited: Duration::from_secs(60)
        }
    );
    assert_eq!(h.chain.status_queries(&tx_id.0).await, 6);
    assert!(h.engine.pending().is_empty());
    assert_eq!(h.engine.snapshot().xp(), 20, "local experience is kept");
    assert!(
        drain(&mut events)
            .iter()
            .any(|e| matches!(e, EngineEvent::ActionTimedOut { .. }))
    );
}

#[tokio::test(start_paused = true)]
async fn failing_store_degrades_without_failing_the_action() {
    let h = Harness::new().await;
    h.store.fail_next_writes(u32::MAX);
    h.chain.set_default_step(StatusStep::success()).await;
    let mut events = h.engine.events();

    let ticket = h.engine.perform_check_in().await.unwrap();
    assert!(matches!(ticket.settled().await, PollOutcome::Confirmed(_)));

    let events = drain(&mut events);
    let degraded = events
        .iter()
        .filter(|e| matches!(e, EngineEvent::BackendDegraded { .. }))
        .count();
    assert_eq!(degraded, 1);
    assert!(h.store.write_attempts() >= 3);
    assert_eq!(h.engine.snapshot().xp(), 20);
}

const OTHER_ADDRESS: &str = "SP3GHKMV4GSYNA8WGBX83DACG80K1RRVQZAZMB9J3";

#[tokio::test(start_paused = true)]
async fn account_switch_releases_the_previous_accounts_actions() {
    let h = Harness::new().await;
    h.chain.set_default_step(StatusStep::pending()).await;
    let previous = h.engine.perform_check_in().await.unwrap();
    assert_eq!(h.engine.pending().len(), 1);

    h.wallet.switch_account(OTHER_ADDRESS).await;
    let mut events = h.engine.events();
    let current = h.engine.perform_check_in().await.unwrap();

    let other = WalletAddress(OTHER_ADDRESS.into());
    assert_eq!(h.engine.snapshot().address(), Some(&other));
    assert_eq!(previous.settled().await, PollOutcome::Cancelled);

    let pending = h.engine.pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].tx_id, current.tx_id);
    assert!(drain(&mut events).iter().any(|e| matches!(
        e,
        EngineEvent::SessionEnded { reason } if reason == "wallet account changed"
    )));
}

#[tokio::test(start_paused = true)]
async fn broadcast_after_sign_out_reports_the_tx() {
    let h = Harness::new().await;
    h.wallet.push_tx("0xlate").await;
    h.wallet.hold_prompts();
    let mut events = h.engine.events();

    let engine = h.engine.clone();
    let dispatch = tokio::spawn(async move { engine.complete_mission(MissionId(2)).await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(h.wallet.submission_count().await, 1, "prompt is open");

    h.engine.disconnect().await.unwrap();
    h.wallet.release_prompts();
    let err = dispatch.await.unwrap().unwrap_err();
    assert!(matches!(&err, QuestlineError::Untracked { tx_id } if tx_id.0 == "0xlate"));

    assert_eq!(h.engine.snapshot(), CacheState::default());
    assert!(h.engine.pending().is_empty());
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(h.chain.total_status_queries().await, 0);
    assert!(drain(&mut events).iter().any(|e| matches!(
        e,
        EngineEvent::Notice(n) if n.level == NoticeLevel::Error && n.message.contains("0xlate")
    )));
}

#[tokio::test(start_paused = true)]
async fn corrupted_session_wipes_local_state() {
    let h = Harness::builder().with_profile(|p| p.xp = 80).build().await;
    assert_eq!(h.engine.snapshot().xp(), 80);
    let mut events = h.engine.events();

    h.wallet.corrupt_session();
    let err = h.engine.perform_check_in().await.unwrap_err();
    assert!(matches!(err, QuestlineError::SessionCorrupted(_)));

    assert_eq!(h.engine.snapshot(), CacheState::default());
    assert_eq!(h.engine.session_state().status, SignInStatus::SignedOut);
    assert_eq!(h.wallet.submission_count().await, 0);
    assert!(
        drain(&mut events)
            .iter()
            .any(|e| matches!(e, EngineEvent::SessionEnded { .. }))
    );

    assert!(matches!(
        h.engine.perform_check_in().await,
        Err(QuestlineError::NotAuthenticated)
    ));
}

#[tokio::test(start_paused = true)]
async fn signed_out_actions_fail_locally() {
    let h = Harness::builder().signed_out().build().await;
    let mut events = h.engine.events();

    let err = h.engine.perform_check_in().await.unwrap_err();
    assert!(matches!(err, QuestlineError::NotAuthenticated));
    assert_eq!(h.wallet.submission_count().await, 0);

    let notice = drain(&mut events).into_iter().find_map(|e| match e {
        EngineEvent::Notice(n) => Some(n),
        _ => None,
    });
    assert_eq!(notice.unwrap().message, "Please connect your wallet first.");
}

#[tokio::test(start_paused = true)]
async fn connect_loads_profile() {
    let h = Harness::builder().signed_out().build().await;
    h.wallet
        .push_sign_in(SignInOutcome::SignedIn(WalletAddress(TEST_ADDRESS.into())))
        .await;

    let outcome = h.engine.connect().await.unwrap();
    assert!(matches!(outcome, SignInOutcome::SignedIn(_)));
    assert_eq!(h.engine.snapshot().address(), Some(&h.address));
    assert!(h.store.stored(&h.address).await.is_some(), "profile created lazily");

    h.engine.disconnect().await.unwrap();
    assert_eq!(h.engine.snapshot(), CacheState::default());
    assert_eq!(h.engine.session_state().status, SignInStatus::SignedOut);
}

#[tokio::test(start_paused = true)]
async fn check_in_resets_at_utc_midnight() {
    let h = Harness::builder()
        .with_profile(|p| p.last_checkin = Some("2024-01-01T23:59:59Z".parse().unwrap()))
        .at("2024-01-02T00:00:01Z")
        .build()
        .await;

    h.engine.perform_check_in().await.unwrap();
    assert_eq!(h.engine.snapshot().xp(), 20);
    assert!(matches!(
        h.engine.perform_check_in().await,
        Err(QuestlineError::AlreadyCompleted { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn fixed_delay_reconciles_while_still_pending() {
    let h = Harness::builder()
        .configure(|c| {
            c.reconcile.mode = ReconcileMode::FixedDelay;
            c.reconcile.delay_secs = 15;
        })
        .build()
        .await;

    let _ticket = h.engine.complete_mission(MissionId(1)).await.unwrap();
    assert!(h.engine.snapshot().has_mission(MissionId(1)));

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert!(
        !h.engine.snapshot().has_mission(MissionId(1)),
        "chain has no record yet"
    );
    assert_eq!(h.engine.pending().len(), 1, "poller still running");
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_polling() {
    let h = Harness::new().await;
    let ticket = h.engine.perform_check_in().await.unwrap();
    let tx_id = ticket.tx_id.clone();

    tokio::time::sleep(Duration::from_secs(25)).await;
    h.engine.shutdown().await;
    assert_eq!(ticket.settled().await, PollOutcome::Cancelled);

    let seen = h.chain.status_queries(&tx_id.0).await;
    assert_eq!(seen, 3);
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(h.chain.status_queries(&tx_id.0).await, seen);
}

#[tokio::test(start_paused = true)]
async fn vault_actions_track_balances() {
    let h = Harness::new().await;
    h.chain_poin(120).await;
    h.chain.set_tip_height(1_000);
    h.engine.refresh().await.unwrap();
    assert_eq!(h.engine.snapshot().vault.poin, Some(120 * MICRO_PER_TOKEN));

    h.engine.spin_gacha().await.unwrap();
    assert_eq!(h.engine.snapshot().vault.poin, Some(70 * MICRO_PER_TOKEN));
    assert!(matches!(
        h.engine.spin_gacha().await,
        Err(QuestlineError::ActionInFlight { .. })
    ));

    h.engine.claim_daily().await.unwrap();
    let vault = h.engine.snapshot().vault;
    assert_eq!(vault.poin, Some(170 * MICRO_PER_TOKEN));
    assert_eq!(vault.last_claim_height, Some(1_000));

    assert!(matches!(
        h.engine.stake(500 * MICRO_PER_TOKEN).await,
        Err(QuestlineError::InsufficientBalance { .. })
    ));
    assert!(matches!(
        h.engine.stake(0).await,
        Err(QuestlineError::InvalidAmount(_))
    ));

    let staked = h.engine.stake(25 * MICRO_PER_TOKEN).await.unwrap();
    assert_eq!(h.wallet.submitted().await.last().unwrap().contract.name, "staking-refinery");
    assert_eq!(
        h.engine.snapshot().vault.poin,
        Some(145 * MICRO_PER_TOKEN)
    );
    assert_eq!(h.engine.pending().len(), 3);
    drop(staked);
}
