use actix_web::http::StatusCode;
use arena_engine::{
    db_types::{Match, MatchId, MatchState},
    drivers::matchmaker::{Backoff, Matchmaker},
    MatchFlowApi,
    StoreError,
};
use serde_json::json;

use super::{
    helpers::{configure_api, json, post_request, put_request, TestStore},
    mocks::MockArenaStore,
};

async fn paired(store: &TestStore) -> Match {
    for (id, name) in [("alice", "Alice"), ("bob", "Bob")] {
        let body = json!({"device_id": id, "player_name": name, "player_nation": "NZ", "player_status": "WaitingForMatch"});
        let (status, _) = store.post("/api/player/status/upsert", body).await;
        assert_eq!(status, StatusCode::OK);
    }
    let mut matchmaker = Matchmaker::new(store.db.clone(), Backoff::default());
    let mut report = matchmaker.run_cycle().await.expect("Error running matchmaker");
    assert_eq!(report.created.len(), 1);
    report.created.remove(0)
}

async fn ready(store: &TestStore, device_id: &str, game: &Match) -> serde_json::Value {
    let body = json!({"device_id": device_id, "match_id": game.id});
    let (status, body) = store.post("/api/match/ready", body).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    json(&body)
}

#[actix_web::test]
async fn full_match_over_http() {
    let store = TestStore::new().await;
    let game = paired(&store).await;

    let (status, body) = store.post("/api/match/info", json!({"device_id": "alice"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["match_id"], game.id.as_str());

    assert_eq!(ready(&store, "alice", &game).await, json!({}));
    let bob = ready(&store, "bob", &game).await;
    assert_eq!(bob["first_turn"], true);
    assert_eq!(bob["enemy_id"], "alice");
    assert_eq!(bob["enemy_name"], "Alice");
    assert_eq!(bob["enemy_nation"], "NZ");
    let alice = ready(&store, "alice", &game).await;
    assert_eq!(alice["first_turn"], false);
    assert_eq!(alice["enemy_id"], "bob");

    let step = json!({"match_id": game.id, "device_id": "bob", "sequence": 1, "step": "north"});
    let (status, body) = store.post("/api/match/sync/send", step).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let (status, body) = store.post("/api/match/sync/receive", json!({"match_id": game.id, "sequence": 1})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), json!({"match_id": game.id, "sequence": 1, "step": "north"}));
    let query = json!({"match_id": game.id, "sequence": 2, "device_id": "alice"});
    let (status, body) = store.post("/api/match/sync/receive", query).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), json!({}));

    let report = json!({"device_id": "alice", "match_id": game.id, "winner": true});
    let (status, _) = store.put("/api/match/info/update", report.clone()).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = store.put("/api/match/info/update", report).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json(&body)["error"].as_str().unwrap().contains("already been reported"));

    let api = MatchFlowApi::new(store.db.clone());
    let stored = api.fetch_match(&game.id).await.unwrap();
    assert_eq!(stored.state, MatchState::Start);
    assert_eq!(stored.reports.winner.as_ref().map(|d| d.as_str()), Some("alice"));
    store.tear_down().await;
}

#[actix_web::test]
async fn match_errors_map_to_statuses() {
    let store = TestStore::new().await;
    let game = paired(&store).await;

    // Moves are refused until both players have passed the ready-check
    let step = json!({"match_id": game.id, "device_id": "bob", "sequence": 1, "step": "north"});
    let (status, _) = store.post("/api/match/sync/send", step).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let unknown = MatchId::random();
    let (status, body) = store.post("/api/match/ready", json!({"device_id": "alice", "match_id": unknown})).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");

    let (status, _) = store.post("/api/match/ready", json!({"device_id": "alice", "match_id": "nope"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = store.post("/api/match/ready", json!({"device_id": "mallory", "match_id": game.id})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Rejoining the pool abandons the pending match
    let body = json!({"device_id": "alice", "player_status": "WaitingForMatch"});
    let (status, _) = store.post("/api/player/status/upsert", body).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = store.post("/api/match/ready", json!({"device_id": "bob", "match_id": game.id})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json(&body)["error"].as_str().unwrap().contains("already over"));
    let (status, body) = store.post("/api/match/info", json!({"device_id": "bob"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), json!({}));
    store.tear_down().await;
}

#[actix_web::test]
async fn relay_round_trip_starts_the_match() {
    let store = TestStore::new().await;
    let game = paired(&store).await;
    let offer = json!({"device_id": "alice", "match_id": game.id, "webrtc_type": "off", "webrtc_message": "sdp-offer"});
    let (status, body) = store.post("/api/match/relay/send", offer).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let query = json!({"device_id": "bob", "match_id": game.id, "relay_type": "offer"});
    let (status, body) = store.post("/api/match/relay/receive", query).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), json!({"match_id": game.id, "relay_type": "offer", "relay_message": "sdp-offer"}));

    let query = json!({"device_id": "alice", "match_id": game.id, "relay_type": "answer"});
    let (status, body) = store.post("/api/match/relay/receive", query.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), json!({"match_id": game.id, "relay_type": "answer"}));

    let answer = json!({"device_id": "bob", "match_id": game.id, "relay_type": "answer", "relay_message": "sdp-answer"});
    let (status, _) = store.post("/api/match/relay/send", answer).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = store.post("/api/match/relay/receive", query).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["relay_message"], "sdp-answer");

    let api = MatchFlowApi::new(store.db.clone());
    assert_eq!(api.fetch_match(&game.id).await.unwrap().state, MatchState::Start);
    store.tear_down().await;
}

#[actix_web::test]
async fn report_store_failure_is_a_server_error() {
    let _ = env_logger::try_init();
    let mut matches = MockArenaStore::new();
    matches.expect_record_result().returning(|_, _, _| Err(StoreError::MatchChanged(MatchId::random())));
    let body = json!({"device_id": "alice", "match_id": MatchId::random(), "winner": false});
    let (status, body) = put_request("/api/match/info/update", body, configure_api(matches, MockArenaStore::new())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json(&body)["error"].as_str().unwrap().contains("Database error"));
}

#[actix_web::test]
async fn missing_move_from_mock_is_empty() {
    let mut matches = MockArenaStore::new();
    matches.expect_fetch_move().returning(|_, _| Ok(None));
    let body = json!({"match_id": MatchId::random(), "sequence": 7});
    let (status, body) = post_request("/api/match/sync/receive", body, configure_api(matches, MockArenaStore::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), json!({}));
}
