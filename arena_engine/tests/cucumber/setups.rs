use arena_engine::db_types::{PlayerStatus, PlayerUpdate};
use cucumber::given;

use crate::cucumber::{ArenaSystem, ArenaWorld};

#[given("a fresh arena")]
async fn fresh_arena(world: &mut ArenaWorld) {
    let system = ArenaSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "{word} from {word} is waiting for a match")]
async fn waiting_player(world: &mut ArenaWorld, device_id: String, nation: String) {
    let update = PlayerUpdate::new(device_id.as_str().into(), PlayerStatus::WaitingForMatch)
        .with_display_name(device_id.to_uppercase())
        .with_nation(nation);
    world.system().players.upsert_player_status(update).await.expect("Error joining the pool");
}
