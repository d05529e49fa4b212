//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution.
//!
//! "Not ready yet" and "nothing there yet" are not errors: the handlers answer `200 OK` with an empty JSON object, and
//! clients poll again.
use actix_web::{get, web, HttpResponse, Responder};
use arena_engine::{MatchFlowApi, MatchManagement, PlayerApi, PlayerManagement};
use log::*;
use serde_json::json;

use crate::{
    data_objects::{
        ActiveMatchResponse,
        DeviceRequest,
        JsonResponse,
        MatchRequest,
        MoveResponse,
        OnlineCount,
        PlayerStatusRequest,
        RankRequest,
        RankResponse,
        ReadMoveRequest,
        RelayReceiveRequest,
        RelayResponse,
        RelaySendRequest,
        ResultReport,
        SendMoveRequest,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Players  ----------------------------------------------------
route!(upsert_player_status => Post "/player/status/upsert" impl PlayerManagement, MatchManagement);
/// Creates or updates a player's record.
///
/// Putting a player into the waiting pool (`WaitingForMatch`) errors any match the player was paired into but never
/// started. Empty or missing `player_name` and `player_nation` leave the stored values alone.
pub async fn upsert_player_status<B: PlayerManagement + MatchManagement>(
    body: web::Json<PlayerStatusRequest>,
    api: web::Data<PlayerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let update = body.into_inner().try_into_update()?;
    debug!("💻️ Status update for {} to {}", update.device_id, update.status);
    let player = api.upsert_player_status(update).await.map_err(|e| {
        debug!("💻️ Could not update player status. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("{} is {}", player.device_id, player.status))))
}

route!(online_players => Get "/player/status" impl PlayerManagement, MatchManagement);
pub async fn online_players<B: PlayerManagement + MatchManagement>(
    api: web::Data<PlayerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Online player count request");
    let online = api.count_online_players().await?;
    Ok(HttpResponse::Ok().json(OnlineCount { online }))
}

route!(player_rank => Post "/player/rank" impl PlayerManagement, MatchManagement);
/// The leaderboard view for the caller: the top player, the caller's rank and their most recent settled matches.
///
/// `match_limit` must be at least 1. Values above 50 are capped.
pub async fn player_rank<B: PlayerManagement + MatchManagement>(
    body: web::Json<RankRequest>,
    api: web::Data<PlayerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let device_id = body.device_id()?;
    debug!("💻️ Rank request for {device_id}");
    let summary = api.rank_summary(&device_id, body.match_limit).await?;
    Ok(HttpResponse::Ok().json(RankResponse::from(summary)))
}

//----------------------------------------------   Matches  ----------------------------------------------------
route!(find_active_match => Post "/match/info" impl PlayerManagement, MatchManagement);
pub async fn find_active_match<B: PlayerManagement + MatchManagement>(
    body: web::Json<DeviceRequest>,
    api: web::Data<MatchFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let device_id = body.device_id()?;
    trace!("💻️ Active match request for {device_id}");
    let match_id = api.find_active_match(&device_id).await?;
    Ok(HttpResponse::Ok().json(ActiveMatchResponse { match_id }))
}

route!(ready_check => Post "/match/ready" impl PlayerManagement, MatchManagement);
/// The ready-check handshake.
///
/// Answers with the opponent's details once both participants have checked in, and with `{}` until then.
pub async fn ready_check<B: PlayerManagement + MatchManagement>(
    body: web::Json<MatchRequest>,
    api: web::Data<MatchFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (device_id, match_id) = body.ids()?;
    trace!("💻️ Ready-check from {device_id} for match {match_id}");
    let ready = api.ready_check(&device_id, &match_id).await.map_err(|e| {
        debug!("💻️ Ready-check by {device_id} failed. {e}");
        e
    })?;
    match ready {
        Some(ready) => Ok(HttpResponse::Ok().json(ready)),
        None => Ok(HttpResponse::Ok().json(json!({}))),
    }
}

route!(report_result => Put "/match/info/update" impl PlayerManagement, MatchManagement);
pub async fn report_result<B: PlayerManagement + MatchManagement>(
    body: web::Json<ResultReport>,
    api: web::Data<MatchFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (device_id, match_id) = body.ids()?;
    let won = body.winner;
    info!("💻️ {device_id} reports {} match {match_id}", if won { "winning" } else { "losing" });
    api.report_result(&match_id, &device_id, won).await.map_err(|e| {
        debug!("💻️ Result report for {match_id} was rejected. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Result recorded")))
}

route!(send_move => Post "/match/sync/send" impl PlayerManagement, MatchManagement);
pub async fn send_move<B: PlayerManagement + MatchManagement>(
    body: web::Json<SendMoveRequest>,
    api: web::Data<MatchFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (device_id, match_id) = body.ids()?;
    let SendMoveRequest { sequence, step, .. } = body.into_inner();
    api.append_move(&match_id, &device_id, sequence, step).await.map_err(|e| {
        debug!("💻️ Move #{sequence} from {device_id} was rejected. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Move {sequence} stored"))))
}

route!(receive_move => Post "/match/sync/receive" impl PlayerManagement, MatchManagement);
pub async fn receive_move<B: PlayerManagement + MatchManagement>(
    body: web::Json<ReadMoveRequest>,
    api: web::Data<MatchFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let match_id = body.match_id()?;
    let sequence = body.sequence;
    match api.read_move(&match_id, sequence).await? {
        Some(step) => Ok(HttpResponse::Ok().json(MoveResponse::new(match_id, step))),
        None => {
            trace!("💻️ Move #{sequence} of match {match_id} is not there yet");
            Ok(HttpResponse::Ok().json(json!({})))
        },
    }
}

//----------------------------------------------   Relay  ----------------------------------------------------
route!(relay_send => Post "/match/relay/send" impl PlayerManagement, MatchManagement);
pub async fn relay_send<B: PlayerManagement + MatchManagement>(
    body: web::Json<RelaySendRequest>,
    api: web::Data<MatchFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (device_id, match_id) = body.ids()?;
    let kind = body.relay_type;
    api.relay_send(&match_id, &device_id, kind, &body.relay_message).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("{kind} stored"))))
}

route!(relay_receive => Post "/match/relay/receive" impl PlayerManagement, MatchManagement);
pub async fn relay_receive<B: PlayerManagement + MatchManagement>(
    body: web::Json<RelayReceiveRequest>,
    api: web::Data<MatchFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (device_id, match_id) = body.ids()?;
    let message = api.relay_receive(&match_id, &device_id, body.relay_type).await?;
    Ok(HttpResponse::Ok().json(RelayResponse::from(message)))
}
