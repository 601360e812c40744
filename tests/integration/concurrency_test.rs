//! Concurrency invariants under racing callers
//!
//! Each race runs several rounds on a multi-threaded runtime so the
//! optimistic transactions genuinely interleave.

use std::collections::HashMap;

use hackhub_common::{Error, Result};
use hackhub_teams::Team;

mod common;
use common::{actor, TestApp};

const ROUNDS: usize = 10;

/// Count outcomes, panicking on anything other than success or `expected`
fn tally<T>(results: Vec<Result<T>>, expected: fn(&Error) -> bool) -> (usize, usize) {
    let mut ok = 0;
    let mut rejected = 0;
    for result in results {
        match result {
            Ok(_) => ok += 1,
            Err(ref e) if expected(e) => rejected += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    (ok, rejected)
}

async fn join_all<T: Send + 'static>(
    handles: Vec<tokio::task::JoinHandle<Result<T>>>,
) -> Vec<Result<T>> {
    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.expect("task panicked"));
    }
    results
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_code_joins_never_overfill() {
    for round in 0..ROUNDS {
        let app = TestApp::new();
        let (_, team) = app.team(&format!("Capacity {}", round)).await;
        app.fill_to(&team, 4).await;

        let handles = (0..8)
            .map(|i| {
                let registry = app.registry().clone();
                let code = team.invite_code.clone();
                let user = actor(&format!("Racer {}", i));
                tokio::spawn(async move { registry.join_by_code(&user, &code, None).await })
            })
            .collect();

        let (ok, full) = tally(join_all(handles).await, |e| matches!(e, Error::TeamFull));
        assert_eq!((ok, full), (1, 7), "round {}", round);

        let team = app.registry().get_team(team.id).await.unwrap();
        assert_eq!(team.size(), 5);
        team.validate(5).unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_approvals_never_overfill() {
    for round in 0..ROUNDS {
        let app = TestApp::new();
        let (leader, team) = app.team(&format!("Approvals {}", round)).await;
        app.fill_to(&team, 4).await;

        let mut requests = Vec::new();
        for i in 0..6 {
            let applicant = actor(&format!("Applicant {}", i));
            requests.push(app.join_requests.request_join(&applicant, team.id).await.unwrap());
        }

        let handles = requests
            .iter()
            .map(|request| {
                let coordinator = app.join_requests.clone();
                let leader = leader.clone();
                let request_id = request.id;
                tokio::spawn(async move { coordinator.approve(&leader, request_id).await })
            })
            .collect();

        let (ok, full) = tally(join_all(handles).await, |e| matches!(e, Error::TeamFull));
        assert_eq!((ok, full), (1, 5), "round {}", round);

        let team = app.registry().get_team(team.id).await.unwrap();
        assert_eq!(team.size(), 5);
        let pending = app.join_requests.pending_for_team(&leader, team.id).await.unwrap();
        assert_eq!(pending.len(), 5);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_user_lands_in_exactly_one_team() {
    for round in 0..ROUNDS {
        let app = TestApp::new();
        let (_, first) = app.team(&format!("First {}", round)).await;
        let (_, second) = app.team(&format!("Second {}", round)).await;
        let user = actor("Solo");

        let mut handles = Vec::new();
        {
            let (registry, user) = (app.registry().clone(), user.clone());
            let name = format!("Solo Team {}", round);
            handles.push(tokio::spawn(async move {
                registry
                    .create_team(&user, &name, HashMap::new(), None)
                    .await
            }));
        }
        for code in [first.invite_code.clone(), second.invite_code.clone()] {
            let (registry, user) = (app.registry().clone(), user.clone());
            handles.push(tokio::spawn(async move {
                registry.join_by_code(&user, &code, None).await
            }));
        }

        let results: Vec<Result<Team>> = join_all(handles).await;
        let (ok, in_team) = tally(results, |e| matches!(e, Error::AlreadyInTeam));
        assert_eq!((ok, in_team), (1, 2), "round {}", round);

        let teams = app.registry().list_teams(&app.admin, None).await.unwrap();
        let memberships = teams.iter().filter(|t| t.is_member(user.id)).count();
        assert_eq!(memberships, 1);

        let current = app.registry().team_for_user(user.id).await.unwrap().unwrap();
        assert!(current.is_member(user.id));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_duplicate_join_requests_collapse_to_one() {
    let app = TestApp::new();
    let (leader, team) = app.team("Popular").await;
    let applicant = actor("Eager");

    let handles = (0..4)
        .map(|_| {
            let coordinator = app.join_requests.clone();
            let applicant = applicant.clone();
            let team_id = team.id;
            tokio::spawn(async move { coordinator.request_join(&applicant, team_id).await })
        })
        .collect();

    let (ok, pending) = tally(join_all(handles).await, |e| {
        matches!(e, Error::RequestAlreadyPending)
    });
    assert_eq!((ok, pending), (1, 3));
    assert_eq!(
        app.join_requests
            .pending_for_team(&leader, team.id)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_slot_has_exactly_one_winner() {
    for round in 0..ROUNDS {
        let app = TestApp::new();
        let slots = app.seed_slots(1, 20).await;
        let (leader_a, team_a) = app.shortlisted_team(&format!("Alpha {}", round)).await;
        let (leader_b, team_b) = app.shortlisted_team(&format!("Bravo {}", round)).await;
        let slot_id = slots[0].id;

        let handles = [(leader_a, team_a.id), (leader_b, team_b.id)]
            .into_iter()
            .map(|(leader, team_id)| {
                let allocator = app.allocator().clone();
                tokio::spawn(async move { allocator.book_slot(&leader, slot_id, team_id).await })
            })
            .collect();

        let (ok, taken) = tally(join_all(handles).await, |e| {
            matches!(e, Error::SlotAlreadyTaken)
        });
        assert_eq!((ok, taken), (1, 1), "round {}", round);

        let holders = [team_a.id, team_b.id];
        let mut booked = 0;
        for team_id in holders {
            if app.allocator().my_slot(team_id).await.unwrap().is_some() {
                booked += 1;
            }
        }
        assert_eq!(booked, 1);
    }
}
