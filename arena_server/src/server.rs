use std::time::Duration;

use actix_web::{
    dev::Server,
    error::JsonPayloadError,
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpRequest,
    HttpServer,
    Scope,
};
use arena_engine::{MatchFlowApi, MatchManagement, PlayerApi, PlayerManagement, SqliteDatabase};
use log::*;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    routes::{
        health,
        FindActiveMatchRoute,
        OnlinePlayersRoute,
        PlayerRankRoute,
        ReadyCheckRoute,
        ReceiveMoveRoute,
        RelayReceiveRoute,
        RelaySendRoute,
        ReportResultRoute,
        SendMoveRoute,
        UpsertPlayerStatusRoute,
    },
    workers::Workers,
};

/// Opens the store, starts the background workers and serves requests until the server is stopped. The workers are
/// cancelled and drained before this function returns.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_timeout(&config.database_url, config.max_connections, config.store_timeout)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.auto_migrate {
        db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    }
    let workers = Workers::start(db.clone(), &config.workers);
    info!("🚀️ {} background workers started", workers.len());
    let srv = create_server_instance(config, db.clone())?;
    let result = srv.await.map_err(|e| ServerError::Unspecified(e.to_string()));
    info!("🚀️ Server has stopped. Waiting for background workers to finish.");
    workers.shutdown().await;
    db.close().await;
    result
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let match_api = MatchFlowApi::new(db.clone());
        let player_api = PlayerApi::new(db.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("arena::access_log"))
            .app_data(json_config())
            .app_data(web::Data::new(match_api))
            .app_data(web::Data::new(player_api))
            .service(health)
            .service(api_scope::<SqliteDatabase>())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// All `/api` routes, served by backend `B`. The app must provide `MatchFlowApi<B>` and `PlayerApi<B>` as app data.
pub fn api_scope<B>() -> Scope
where B: PlayerManagement + MatchManagement + 'static
{
    web::scope("/api")
        .service(UpsertPlayerStatusRoute::<B>::new())
        .service(OnlinePlayersRoute::<B>::new())
        .service(PlayerRankRoute::<B>::new())
        .service(FindActiveMatchRoute::<B>::new())
        .service(ReadyCheckRoute::<B>::new())
        .service(ReportResultRoute::<B>::new())
        .service(SendMoveRoute::<B>::new())
        .service(ReceiveMoveRoute::<B>::new())
        .service(RelaySendRoute::<B>::new())
        .service(RelayReceiveRoute::<B>::new())
}

/// Malformed or unexpected request bodies are answered with the usual `{"error": ...}` body and a 400 status.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, req: &HttpRequest| {
        debug!("💻️ Rejected request body for {}. {err}", req.path());
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}
