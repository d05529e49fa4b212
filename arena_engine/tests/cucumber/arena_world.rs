use std::fmt::Debug;

use arena_engine::{
    db_types::{DeviceId, Match, MatchId},
    drivers::{
        matchmaker::{Backoff, Matchmaker},
        reconciler::Reconciler,
    },
    match_objects::ReadyMatch,
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    MatchFlowApi,
    PlayerApi,
    SqliteDatabase,
};
use chrono::Duration;
use cucumber::World;
use log::*;

#[derive(Default, Debug, World)]
pub struct ArenaWorld {
    pub system: Option<ArenaSystem>,
    /// The match the scenario is currently talking about.
    pub current_match: Option<MatchId>,
    pub created: Vec<Match>,
    pub last_ready: Option<ReadyMatch>,
    pub last_error: Option<String>,
}

pub struct ArenaSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub flow: MatchFlowApi<SqliteDatabase>,
    pub players: PlayerApi<SqliteDatabase>,
    pub matchmaker: Matchmaker<SqliteDatabase>,
    pub reconciler: Reconciler<SqliteDatabase>,
}

impl Debug for ArenaSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ArenaSystem({})", self.db_path)
    }
}

impl ArenaWorld {
    pub fn system(&self) -> &ArenaSystem {
        self.system.as_ref().expect("Arena not initialised")
    }

    pub fn system_mut(&mut self) -> &mut ArenaSystem {
        self.system.as_mut().expect("Arena not initialised")
    }

    pub fn current_match(&self) -> &MatchId {
        self.current_match.as_ref().expect("No match has been selected")
    }

    /// Picks the newly created match that `a` and `b` were paired into.
    pub fn select_match_between(&mut self, a: &str, b: &str) -> bool {
        let (a, b) = (DeviceId::from(a), DeviceId::from(b));
        let found = self.created.iter().find(|m| m.is_participant(&a) && m.is_participant(&b)).map(|m| m.id.clone());
        let selected = found.is_some();
        self.current_match = found;
        selected
    }
}

impl ArenaSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let flow = MatchFlowApi::new(db.clone());
        let players = PlayerApi::new(db.clone());
        let matchmaker = Matchmaker::new(db.clone(), Backoff::default());
        let reconciler = Reconciler::new(db.clone(), Duration::minutes(10));
        Self { db_path: url, db, flow, players, matchmaker, reconciler }
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
