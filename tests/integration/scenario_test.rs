//! End-to-end scenarios across the teams, pitches and rate limit crates

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Duration;
use hackhub_common::{Error, ManualClock};
use hackhub_pitches::SlotStatus;
use hackhub_ratelimit::{
    ActionKind, CounterStore, DocumentCounterStore, MemoryCounterStore, RateLimit,
    RateLimitPolicy, RateLimiter,
};
use hackhub_store::MemoryStore;
use hackhub_teams::InviteCodeGenerator;
use uuid::Uuid;

mod common;
use common::{actor, epoch, TestApp};

async fn assert_window_behaviour(counters: Arc<dyn CounterStore>) {
    let clock = ManualClock::new(epoch());
    let policy = RateLimitPolicy::default().with_limit(
        ActionKind::TeamCreate,
        RateLimit::new(3, Duration::milliseconds(1000)),
    );
    let limiter = RateLimiter::new(counters, policy, Arc::new(clock.clone()));
    let user = Uuid::new_v4();

    for _ in 0..3 {
        limiter.enforce(user, ActionKind::TeamCreate).await.unwrap();
        clock.advance(Duration::milliseconds(100));
    }
    let denied = limiter.enforce(user, ActionKind::TeamCreate).await;
    match denied {
        Err(Error::RateLimitExceeded { reset_at }) => {
            assert_eq!(reset_at, epoch() + Duration::milliseconds(1000))
        }
        other => panic!("expected RateLimitExceeded, got {:?}", other),
    }

    clock.advance(Duration::milliseconds(1000));
    let decision = limiter.enforce(user, ActionKind::TeamCreate).await.unwrap();
    assert!(decision.allowed);
    assert_eq!(decision.remaining, 2);
}

#[tokio::test]
async fn test_rate_limit_window_in_memory() {
    assert_window_behaviour(Arc::new(MemoryCounterStore::new())).await;
}

#[tokio::test]
async fn test_rate_limit_window_on_document_store() {
    let store = Arc::new(MemoryStore::new());
    assert_window_behaviour(Arc::new(DocumentCounterStore::new(store))).await;
}

#[tokio::test]
async fn test_team_names_are_case_insensitive() {
    let app = TestApp::new();
    app.team("AlphaWolf").await;

    let rival = actor("Rival");
    let result = app
        .registry()
        .create_team(&rival, "alphawolf", HashMap::new(), None)
        .await;
    assert!(matches!(result, Err(Error::NameTaken(_))));
    assert!(!app.registry().check_name_available("ALPHAWOLF").await.unwrap());
    assert!(app.registry().team_for_user(rival.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_generated_codes_avoid_assigned_codes() {
    let app = TestApp::new();
    let mut assigned = HashSet::new();
    for i in 0..500 {
        let (_, team) = app.team(&format!("Team {:03}", i)).await;
        assigned.insert(team.invite_code);
    }
    assert_eq!(assigned.len(), 500);

    let lookup = Arc::new(app.registry().repositories().teams.clone());
    let generator = InviteCodeGenerator::new(lookup, 5);
    for _ in 0..10_000 {
        let code = generator.generate().await.unwrap();
        assert!(!assigned.contains(&code), "generated assigned code {}", code);
    }
}

#[tokio::test]
async fn test_nebula_formation() {
    let app = TestApp::new();
    let a = actor("Ada");
    let nebula = app
        .registry()
        .create_team(&a, "Nebula", HashMap::new(), Some("backend".to_string()))
        .await
        .unwrap();
    assert_eq!(nebula.leader_id, a.id);
    assert_eq!(nebula.member_ids(), vec![a.id]);

    // B finds the team through its code and asks to join
    let b = actor("Ben");
    let team_id = app
        .registry()
        .repositories()
        .teams
        .resolve_code(&nebula.invite_code)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(team_id, nebula.id);
    let request = app.join_requests.request_join(&b, team_id).await.unwrap();

    let nebula = app.join_requests.approve(&a, request.id).await.unwrap();
    assert_eq!(nebula.member_ids(), vec![a.id, b.id]);
    assert!(app
        .registry()
        .repositories()
        .join_requests
        .get(request.id)
        .await
        .unwrap()
        .is_none());
    let participants = &app.registry().repositories().participants;
    assert_eq!(participants.team_id_for(b.id).await.unwrap(), Some(nebula.id));

    for name in ["Cleo", "Dev", "Eve"] {
        let user = actor(name);
        app.registry()
            .join_by_code(&user, &nebula.invite_code, None)
            .await
            .unwrap();
    }
    let nebula = app.registry().get_team(nebula.id).await.unwrap();
    assert_eq!(nebula.size(), 5);

    let f = actor("Fay");
    let result = app
        .registry()
        .join_by_code(&f, &nebula.invite_code, None)
        .await;
    assert!(matches!(result, Err(Error::TeamFull)));
    assert!(participants.team_id_for(f.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_slot_booking() {
    let app = TestApp::new();
    let slots = app.seed_slots(5, 20).await;
    assert_eq!(slots.len(), 5);
    for pair in slots.windows(2) {
        assert_eq!(pair[1].start_time - pair[0].start_time, Duration::minutes(20));
    }

    let (leader, x) = app.shortlisted_team("Team X").await;
    let third = app
        .allocator()
        .book_slot(&leader, slots[2].id, x.id)
        .await
        .unwrap();
    assert_eq!(third.status, SlotStatus::Booked);
    assert_eq!(third.team_id, Some(x.id));

    let mine = app.allocator().my_slot(x.id).await.unwrap().unwrap();
    assert_eq!(mine.id, slots[2].id);

    let result = app.allocator().book_slot(&leader, slots[3].id, x.id).await;
    assert!(matches!(result, Err(Error::TeamAlreadyBooked)));
    let listed = app.allocator().list_slots().await.unwrap();
    assert!(listed[3].is_open());
}

#[tokio::test]
async fn test_unshortlisted_team_cannot_book() {
    let app = TestApp::new();
    let slots = app.seed_slots(2, 20).await;
    let (leader, team) = app.team("Hopefuls").await;

    let result = app.allocator().book_slot(&leader, slots[0].id, team.id).await;
    assert!(matches!(result, Err(Error::NotShortlisted)));
}

#[tokio::test]
async fn test_released_slot_can_be_rebooked() {
    let app = TestApp::new();
    let slots = app.seed_slots(1, 20).await;
    let (leader_a, a) = app.shortlisted_team("Early Birds").await;
    let (leader_b, b) = app.shortlisted_team("Night Owls").await;

    app.allocator()
        .book_slot(&leader_a, slots[0].id, a.id)
        .await
        .unwrap();
    let taken = app.allocator().book_slot(&leader_b, slots[0].id, b.id).await;
    assert!(matches!(taken, Err(Error::SlotAlreadyTaken)));

    app.allocator()
        .release_slot(&app.admin, slots[0].id)
        .await
        .unwrap();
    assert!(app.allocator().my_slot(a.id).await.unwrap().is_none());

    let slot = app
        .allocator()
        .book_slot(&leader_b, slots[0].id, b.id)
        .await
        .unwrap();
    assert_eq!(slot.team_id, Some(b.id));
}

#[tokio::test]
async fn test_member_leaves_and_joins_another_team() {
    let app = TestApp::new();
    let (_, first) = app.team("First Wave").await;
    let (_, second) = app.team("Second Wave").await;
    let member = actor("Drifter");

    app.registry()
        .join_by_code(&member, &first.invite_code, None)
        .await
        .unwrap();
    let blocked = app
        .registry()
        .join_by_code(&member, &second.invite_code, None)
        .await;
    assert!(matches!(blocked, Err(Error::AlreadyInTeam)));

    app.registry().leave_team(&member, first.id).await.unwrap();
    let second = app
        .registry()
        .join_by_code(&member, &second.invite_code, None)
        .await
        .unwrap();
    assert!(second.is_member(member.id));
    let first = app.registry().get_team(first.id).await.unwrap();
    assert!(!first.is_member(member.id));
}
