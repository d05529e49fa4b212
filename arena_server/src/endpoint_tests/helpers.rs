use actix_web::{
    http::{Method, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use arena_engine::{
    test_utils::prepare_env::{drop_database, prepare_test_env, random_db_path},
    ArenaDatabase,
    MatchFlowApi,
    PlayerApi,
    SqliteDatabase,
};
use log::debug;
use serde_json::Value;

use crate::server::{api_scope, json_config};

/// Sends one request to an app set up by `configure` and returns the status and the body.
pub async fn send_request<F>(method: Method, path: &str, body: Option<Value>, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let mut req = TestRequest::default().method(method).uri(path);
    if let Some(body) = body {
        req = req.set_json(body);
    }
    let app = App::new().app_data(json_config()).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request to {path}");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}

pub async fn get_request<F>(path: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    send_request(Method::GET, path, None, configure).await
}

pub async fn post_request<F>(path: &str, body: Value, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    send_request(Method::POST, path, Some(body), configure).await
}

pub async fn put_request<F>(path: &str, body: Value, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    send_request(Method::PUT, path, Some(body), configure).await
}

pub fn json(body: &str) -> Value {
    serde_json::from_str(body).expect("response body was not JSON")
}

/// Registers the `/api` routes against a backend. `match_db` and `player_db` may be different objects, which lets
/// tests hand each API its own mock.
pub fn configure_api<B>(match_db: B, player_db: B) -> impl FnOnce(&mut ServiceConfig)
where B: arena_engine::PlayerManagement + arena_engine::MatchManagement + 'static {
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(MatchFlowApi::new(match_db)))
            .app_data(web::Data::new(PlayerApi::new(player_db)))
            .service(api_scope::<B>());
    }
}

/// A throw-away SQLite store with the schema in place.
pub struct TestStore {
    pub db: SqliteDatabase,
}

impl TestStore {
    pub async fn new() -> Self {
        let _ = env_logger::try_init();
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        Self { db }
    }

    pub fn configure(&self) -> impl FnOnce(&mut ServiceConfig) {
        configure_api(self.db.clone(), self.db.clone())
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, String) {
        post_request(path, body, self.configure()).await
    }

    pub async fn put(&self, path: &str, body: Value) -> (StatusCode, String) {
        put_request(path, body, self.configure()).await
    }

    pub async fn get(&self, path: &str) -> (StatusCode, String) {
        get_request(path, self.configure()).await
    }

    pub async fn tear_down(self) {
        let url = self.db.url().to_string();
        self.db.close().await;
        drop_database(&url).await;
    }
}
