use arena_engine::db_types::{DeviceId, MatchStatus, PlayerStatus, PlayerUpdate};
use chrono::{Duration, Utc};
use cucumber::{then, when};
use log::*;

use crate::cucumber::ArenaWorld;

#[when("the matchmaker runs")]
async fn run_matchmaker(world: &mut ArenaWorld) {
    let report = world.system_mut().matchmaker.run_cycle().await.expect("Error running matchmaker");
    debug!("🧪️ Matchmaker created {} matches", report.created.len());
    world.created = report.created;
}

#[when(expr = "the reconciler runs {int} minutes later")]
async fn run_reconciler(world: &mut ArenaWorld, minutes: i64) {
    let now = Utc::now() + Duration::minutes(minutes);
    let report = world.system().reconciler.run_cycle_at(now).await.expect("Error running reconciler");
    debug!("🧪️ Reconciler resolved {} matches", report.total());
}

#[when(expr = "{word} performs a ready-check")]
async fn ready_check(world: &mut ArenaWorld, device_id: String) {
    let match_id = world.current_match().clone();
    let result = world.system().flow.ready_check(&device_id.into(), &match_id).await;
    match result {
        Ok(ready) => {
            world.last_ready = ready;
            world.last_error = None;
        },
        Err(e) => {
            world.last_ready = None;
            world.last_error = Some(e.to_string());
        },
    }
}

#[when(expr = "{word} sends move {int} {string}")]
async fn send_move(world: &mut ArenaWorld, device_id: String, sequence: i64, step: String) {
    let match_id = world.current_match().clone();
    let result = world.system().flow.append_move(&match_id, &device_id.into(), sequence, step).await;
    world.last_error = result.err().map(|e| e.to_string());
}

#[when(expr = "{word} reports a {word}")]
async fn report_result(world: &mut ArenaWorld, device_id: String, outcome: String) {
    let won = match outcome.as_str() {
        "win" => true,
        "loss" => false,
        s => panic!("Unknown outcome: {s}"),
    };
    let match_id = world.current_match().clone();
    let result = world.system().flow.report_result(&match_id, &device_id.into(), won).await;
    world.last_error = result.err().map(|e| e.to_string());
}

#[when(expr = "{word} goes back to the waiting pool")]
async fn rejoin_pool(world: &mut ArenaWorld, device_id: String) {
    let update = PlayerUpdate::new(device_id.into(), PlayerStatus::WaitingForMatch);
    world.system().players.upsert_player_status(update).await.expect("Error rejoining the pool");
}

#[then(expr = "{int} matches are created")]
async fn matches_created(world: &mut ArenaWorld, count: usize) {
    assert_eq!(world.created.len(), count);
}

#[then(expr = "{word} and {word} are paired")]
async fn are_paired(world: &mut ArenaWorld, a: String, b: String) {
    assert!(world.select_match_between(&a, &b), "{a} and {b} were not paired");
}

#[then(expr = "{word} moves first")]
async fn moves_first(world: &mut ArenaWorld, device_id: String) {
    let game = world.system().flow.fetch_match(world.current_match()).await.expect("Error fetching match");
    assert_eq!(game.first_turn, DeviceId::from(device_id));
}

#[then(expr = "the match is {word}")]
async fn match_status(world: &mut ArenaWorld, status: String) {
    let expected = status.parse::<MatchStatus>().expect("Not a match status");
    let game = world.system().flow.fetch_match(world.current_match()).await.expect("Error fetching match");
    assert_eq!(game.status(), expected);
}

#[then("the match is not ready yet")]
async fn not_ready(world: &mut ArenaWorld) {
    assert!(world.last_error.is_none(), "Unexpected error: {:?}", world.last_error);
    assert!(world.last_ready.is_none());
}

#[then(expr = "the match is ready against {word}")]
async fn ready_against(world: &mut ArenaWorld, enemy: String) {
    let ready = world.last_ready.as_ref().expect("The match is not ready");
    assert_eq!(ready.enemy_id, DeviceId::from(enemy));
}

#[then(expr = "the request is rejected with {string}")]
async fn rejected(world: &mut ArenaWorld, message: String) {
    let err = world.last_error.as_ref().expect("The request was not rejected");
    assert!(err.contains(&message), "'{err}' does not contain '{message}'");
}

#[then("the request succeeds")]
async fn succeeds(world: &mut ArenaWorld) {
    assert!(world.last_error.is_none(), "Unexpected error: {:?}", world.last_error);
}

#[then(expr = "move {int} reads {string}")]
async fn move_reads(world: &mut ArenaWorld, sequence: i64, step: String) {
    let found = world.system().flow.read_move(world.current_match(), sequence).await.expect("Error reading move");
    assert_eq!(found.map(|m| m.step), Some(step));
}

#[then(expr = "move {int} is not found yet")]
async fn move_missing(world: &mut ArenaWorld, sequence: i64) {
    let found = world.system().flow.read_move(world.current_match(), sequence).await.expect("Error reading move");
    assert!(found.is_none());
}

#[then(expr = "{word} has a score of {int}")]
async fn score(world: &mut ArenaWorld, device_id: String, expected: i64) {
    let player = world.system().players.fetch_player(&device_id.into()).await.expect("Error fetching player");
    assert_eq!(player.map(|p| p.score), Some(expected));
}

#[then(expr = "{word} is {word}")]
async fn player_status(world: &mut ArenaWorld, device_id: String, status: String) {
    let expected = status.parse::<PlayerStatus>().expect("Not a player status");
    let player = world.system().players.fetch_player(&device_id.into()).await.expect("Error fetching player");
    assert_eq!(player.map(|p| p.status), Some(expected));
}
