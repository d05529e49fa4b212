use actix_web::http::StatusCode;
use arena_engine::{db_types::PlayerStatus, PlayerManagement, StoreError};
use serde_json::json;

use super::{
    helpers::{configure_api, get_request, json, TestStore},
    mocks::MockArenaStore,
};

#[actix_web::test]
async fn upsert_and_count_online_players() {
    let store = TestStore::new().await;
    let body = json!({"device_id": "dev-1", "player_name": "Kim", "player_nation": "KR", "player_status": "Online"});
    let (status, body) = store.post("/api/player/status/upsert", body).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body = json(&body);
    assert_eq!(body["success"], true);

    let body = json!({"device_id": "dev-2", "player_status": "WaitMatch"});
    let (status, _) = store.post("/api/player/status/upsert", body).await;
    assert_eq!(status, StatusCode::OK);
    let player = store.db.fetch_player(&"dev-2".into()).await.unwrap().unwrap();
    assert_eq!(player.status, PlayerStatus::WaitingForMatch);

    let (status, body) = store.get("/api/player/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), json!({"online": 1}));
    store.tear_down().await;
}

#[actix_web::test]
async fn upsert_rejects_bad_bodies() {
    let store = TestStore::new().await;
    let body = json!({"device_id": "dev-1", "player_status": "Online", "password": "hunter2"});
    let (status, body) = store.post("/api/player/status/upsert", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().starts_with("Could not read request body"));

    let body = json!({"device_id": "", "player_status": "Online"});
    let (status, body) = store.post("/api/player/status/upsert", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let body = json!({"device_id": "dev-1", "player_status": "Sleeping"});
    let (status, _) = store.post("/api/player/status/upsert", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    store.tear_down().await;
}

#[actix_web::test]
async fn rank_for_new_and_unknown_players() {
    let store = TestStore::new().await;
    let (status, _) = store.post("/api/player/status/upsert", json!({"device_id": "kim", "player_name": "Kim", "player_status": "Online"})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = store.post("/api/player/rank", json!({"device_id": "kim", "match_limit": 10})).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body = json(&body);
    assert_eq!(body["your_rank"], 1);
    assert_eq!(body["top_player_id"], "kim");
    assert_eq!(body["top_player_name"], "Kim");
    assert_eq!(body["latest_matches"], json!([]));

    let (status, body) = store.post("/api/player/rank", json!({"device_id": "ghost", "match_limit": 10})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json(&body).get("your_rank").is_none());

    let (status, body) = store.post("/api/player/rank", json!({"device_id": "kim", "match_limit": 0})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().contains("match_limit"));
    store.tear_down().await;
}

#[actix_web::test]
async fn store_failures_are_server_errors() {
    let _ = env_logger::try_init();
    let mut players = MockArenaStore::new();
    players
        .expect_count_players_with_status()
        .returning(|_| Err(StoreError::CorruptMatch("x".into(), "broken".into())));
    let (status, body) = get_request("/api/player/status", configure_api(MockArenaStore::new(), players)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json(&body)["error"].as_str().unwrap().contains("Database error"));
}

#[actix_web::test]
async fn health_check() {
    let (status, body) = get_request("/health", |cfg| {
        cfg.service(crate::routes::health);
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}
