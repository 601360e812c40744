//! HTTP surface tests over the assembled application router

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use hackhub_common::Actor;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;
use common::{actor, bearer, TestApp};

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

async fn send(router: &Router, method: Method, uri: &str, caller: &Actor, body: Option<Value>) -> Reply {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, bearer(caller));
    let body = match body {
        Some(value) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    Reply {
        status,
        headers,
        body,
    }
}

#[tokio::test]
async fn test_join_by_code_over_http() {
    let app = TestApp::new();
    let router = app.router();
    let leader = actor("Lead");
    let member = actor("Joiner");
    let outsider = actor("Visitor");

    let created = send(
        &router,
        Method::POST,
        "/v1/teams",
        &leader,
        Some(json!({"name": "Quasar", "position": "backend"})),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let team_id = created.body["id"].as_str().unwrap().to_string();
    let code = created.body["invite_code"].as_str().unwrap().to_string();

    let joined = send(
        &router,
        Method::POST,
        "/v1/teams/join",
        &member,
        Some(json!({"code": format!("  {}  ", code.to_lowercase())})),
    )
    .await;
    assert_eq!(joined.status, StatusCode::OK);
    assert_eq!(joined.body["size"], 2);

    let mine = send(&router, Method::GET, "/v1/teams/mine", &member, None).await;
    assert_eq!(mine.status, StatusCode::OK);
    assert_eq!(mine.body["id"], team_id.as_str());
    assert_eq!(mine.body["invite_code"], code.as_str());

    let viewed = send(
        &router,
        Method::GET,
        &format!("/v1/teams/{}", team_id),
        &outsider,
        None,
    )
    .await;
    assert_eq!(viewed.status, StatusCode::OK);
    assert!(viewed.body["invite_code"].is_null());

    let none = send(&router, Method::GET, "/v1/teams/mine", &outsider, None).await;
    assert_eq!(none.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_code_join_rate_limit_returns_retry_after() {
    let app = TestApp::new();
    let router = app.router();
    let guesser = actor("Guesser");

    for _ in 0..10 {
        let reply = send(
            &router,
            Method::POST,
            "/v1/teams/join",
            &guesser,
            Some(json!({"code": "ZZZZZZ"})),
        )
        .await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert_eq!(reply.body["error"]["code"], "INVALID_CODE");
    }

    let limited = send(
        &router,
        Method::POST,
        "/v1/teams/join",
        &guesser,
        Some(json!({"code": "ZZZZZZ"})),
    )
    .await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.body["error"]["code"], "RATE_LIMIT_EXCEEDED");
    assert!(limited.headers.contains_key(header::RETRY_AFTER));
}

#[tokio::test]
async fn test_join_request_lifecycle_over_http() {
    let app = TestApp::new();
    let router = app.router();
    let (leader, team) = app.team("Pulsar").await;
    let applicant = actor("Applicant");

    let requested = send(
        &router,
        Method::POST,
        &format!("/v1/teams/{}/join-requests", team.id),
        &applicant,
        None,
    )
    .await;
    assert_eq!(requested.status, StatusCode::CREATED);
    let request_id = requested.body["id"].as_str().unwrap().to_string();

    let duplicate = send(
        &router,
        Method::POST,
        &format!("/v1/teams/{}/join-requests", team.id),
        &applicant,
        None,
    )
    .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.body["error"]["code"], "REQUEST_ALREADY_PENDING");

    let mine = send(&router, Method::GET, "/v1/join-requests/mine", &applicant, None).await;
    assert_eq!(mine.body.as_array().unwrap().len(), 1);

    let pending = send(
        &router,
        Method::GET,
        &format!("/v1/teams/{}/join-requests", team.id),
        &leader,
        None,
    )
    .await;
    assert_eq!(pending.status, StatusCode::OK);
    assert_eq!(pending.body[0]["user_id"], applicant.id.to_string());

    let approved = send(
        &router,
        Method::POST,
        &format!("/v1/join-requests/{}/approve", request_id),
        &leader,
        None,
    )
    .await;
    assert_eq!(approved.status, StatusCode::OK);
    assert_eq!(approved.body["size"], 2);

    let left = send(
        &router,
        Method::POST,
        &format!("/v1/teams/{}/leave", team.id),
        &applicant,
        None,
    )
    .await;
    assert_eq!(left.status, StatusCode::NO_CONTENT);

    let leader_leaves = send(
        &router,
        Method::POST,
        &format!("/v1/teams/{}/leave", team.id),
        &leader,
        None,
    )
    .await;
    assert_eq!(leader_leaves.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_pitch_slot_conflicts_over_http() {
    let app = TestApp::new();
    let router = app.router();
    let slots = app.seed_slots(3, 20).await;
    let (leader_a, a) = app.shortlisted_team("Comet").await;
    let (leader_b, b) = app.shortlisted_team("Meteor").await;
    let (leader_c, c) = app.team("Asteroid").await;

    let book = |slot: usize, team_id: uuid::Uuid| {
        (
            format!("/v1/pitch-slots/{}/book", slots[slot].id),
            json!({"team_id": team_id}),
        )
    };

    let (uri, body) = book(0, a.id);
    let booked = send(&router, Method::POST, &uri, &leader_a, Some(body)).await;
    assert_eq!(booked.status, StatusCode::OK);
    assert_eq!(booked.body["status"], "booked");

    let (uri, body) = book(0, b.id);
    let taken = send(&router, Method::POST, &uri, &leader_b, Some(body)).await;
    assert_eq!(taken.status, StatusCode::CONFLICT);
    assert_eq!(taken.body["error"]["code"], "SLOT_ALREADY_TAKEN");

    let (uri, body) = book(1, a.id);
    let twice = send(&router, Method::POST, &uri, &leader_a, Some(body)).await;
    assert_eq!(twice.status, StatusCode::CONFLICT);
    assert_eq!(twice.body["error"]["code"], "TEAM_ALREADY_BOOKED");

    let (uri, body) = book(2, c.id);
    let unlisted = send(&router, Method::POST, &uri, &leader_c, Some(body)).await;
    assert_eq!(unlisted.body["error"]["code"], "NOT_SHORTLISTED");

    let (uri, body) = book(1, b.id);
    let stranger = send(&router, Method::POST, &uri, &leader_a, Some(body)).await;
    assert_eq!(stranger.status, StatusCode::FORBIDDEN);

    let held = send(
        &router,
        Method::GET,
        &format!("/v1/teams/{}/pitch-slot", a.id),
        &leader_a,
        None,
    )
    .await;
    assert_eq!(held.body["id"], slots[0].id.to_string());

    let seeded = send(
        &router,
        Method::POST,
        "/v1/admin/pitch-slots/seed",
        &leader_a,
        Some(json!({
            "count": 2,
            "start_time": "2030-03-14T09:00:00Z",
            "duration_minutes": 15,
            "interval_minutes": 20
        })),
    )
    .await;
    assert_eq!(seeded.status, StatusCode::FORBIDDEN);
}
