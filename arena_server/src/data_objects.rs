//! Request and response bodies of the HTTP API.
//!
//! Requests carry plain strings for identifiers. They are validated into engine types by the `try_*` helpers so that
//! malformed ids are reported as bad requests rather than as unknown matches.
use std::fmt::Display;

use arena_engine::{
    db_types::{DeviceId, MatchId, Move, Player, PlayerStatus, PlayerUpdate, RelayKind},
    match_objects::RelayMessage,
    rank_objects::{MatchHistoryEntry, RankSummary},
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

fn device_id(s: &str) -> Result<DeviceId, ServerError> {
    Ok(s.parse::<DeviceId>()?)
}

fn match_id(s: &str) -> Result<MatchId, ServerError> {
    Ok(s.parse::<MatchId>()?)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

//-------------------------------------------------  Players  ----------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlayerStatusRequest {
    pub device_id: String,
    #[serde(default)]
    pub player_name: Option<String>,
    #[serde(default)]
    pub player_nation: Option<String>,
    pub player_status: PlayerStatus,
}

impl PlayerStatusRequest {
    pub fn try_into_update(self) -> Result<PlayerUpdate, ServerError> {
        let mut update = PlayerUpdate::new(device_id(&self.device_id)?, self.player_status);
        if let Some(name) = self.player_name {
            update = update.with_display_name(name);
        }
        if let Some(nation) = self.player_nation {
            update = update.with_nation(nation);
        }
        Ok(update)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineCount {
    pub online: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RankRequest {
    pub device_id: String,
    pub match_limit: i64,
}

impl RankRequest {
    pub fn device_id(&self) -> Result<DeviceId, ServerError> {
        device_id(&self.device_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_player_id: Option<DeviceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_player_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_player_nation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub your_rank: Option<i64>,
    pub latest_matches: Vec<MatchHistoryItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchHistoryItem {
    pub match_id: MatchId,
    /// RFC3339, UTC
    pub match_date: String,
    pub enemy_id: DeviceId,
    pub enemy_name: String,
    pub enemy_nation: String,
    pub win: bool,
}

fn rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl From<MatchHistoryEntry> for MatchHistoryItem {
    fn from(entry: MatchHistoryEntry) -> Self {
        Self {
            match_id: entry.match_id,
            match_date: rfc3339(entry.match_date),
            enemy_id: entry.enemy_id,
            enemy_name: entry.enemy_name,
            enemy_nation: entry.enemy_nation,
            win: entry.win,
        }
    }
}

impl From<RankSummary> for RankResponse {
    fn from(summary: RankSummary) -> Self {
        let (top_player_id, top_player_name, top_player_nation) = match summary.top_player {
            Some(Player { device_id, display_name, nation, .. }) => (Some(device_id), Some(display_name), Some(nation)),
            None => (None, None, None),
        };
        Self {
            top_player_id,
            top_player_name,
            top_player_nation,
            your_rank: summary.your_rank,
            latest_matches: summary.latest_matches.into_iter().map(MatchHistoryItem::from).collect(),
        }
    }
}

//-------------------------------------------------  Matches  ----------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceRequest {
    pub device_id: String,
}

impl DeviceRequest {
    pub fn device_id(&self) -> Result<DeviceId, ServerError> {
        device_id(&self.device_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveMatchResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<MatchId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchRequest {
    pub device_id: String,
    pub match_id: String,
}

impl MatchRequest {
    pub fn ids(&self) -> Result<(DeviceId, MatchId), ServerError> {
        Ok((device_id(&self.device_id)?, match_id(&self.match_id)?))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResultReport {
    pub device_id: String,
    pub match_id: String,
    pub winner: bool,
}

impl ResultReport {
    pub fn ids(&self) -> Result<(DeviceId, MatchId), ServerError> {
        Ok((device_id(&self.device_id)?, match_id(&self.match_id)?))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMoveRequest {
    pub match_id: String,
    pub device_id: String,
    pub sequence: i64,
    pub step: String,
}

impl SendMoveRequest {
    pub fn ids(&self) -> Result<(DeviceId, MatchId), ServerError> {
        Ok((device_id(&self.device_id)?, match_id(&self.match_id)?))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadMoveRequest {
    pub match_id: String,
    pub sequence: i64,
    /// Accepted for compatibility. Moves are readable by anyone who knows the match id.
    #[serde(default)]
    pub device_id: Option<String>,
}

impl ReadMoveRequest {
    pub fn match_id(&self) -> Result<MatchId, ServerError> {
        match_id(&self.match_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveResponse {
    pub match_id: MatchId,
    pub sequence: i64,
    pub step: String,
}

impl MoveResponse {
    pub fn new(match_id: MatchId, step: Move) -> Self {
        Self { match_id, sequence: step.sequence, step: step.step }
    }
}

//-------------------------------------------------  Relay  ------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelaySendRequest {
    pub device_id: String,
    pub match_id: String,
    #[serde(alias = "webrtc_type")]
    pub relay_type: RelayKind,
    #[serde(alias = "webrtc_message")]
    pub relay_message: String,
}

impl RelaySendRequest {
    pub fn ids(&self) -> Result<(DeviceId, MatchId), ServerError> {
        Ok((device_id(&self.device_id)?, match_id(&self.match_id)?))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayReceiveRequest {
    pub device_id: String,
    pub match_id: String,
    #[serde(alias = "webrtc_type")]
    pub relay_type: RelayKind,
}

impl RelayReceiveRequest {
    pub fn ids(&self) -> Result<(DeviceId, MatchId), ServerError> {
        Ok((device_id(&self.device_id)?, match_id(&self.match_id)?))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayResponse {
    pub match_id: MatchId,
    pub relay_type: RelayKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay_message: Option<String>,
}

impl From<RelayMessage> for RelayResponse {
    fn from(msg: RelayMessage) -> Self {
        Self { match_id: msg.match_id, relay_type: msg.kind, relay_message: msg.payload }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn relay_request_accepts_legacy_field_names() {
        let json = r#"{"device_id":"d1","match_id":"00112233445566778899aabb","webrtc_type":"off","webrtc_message":"sdp"}"#;
        let req: RelaySendRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.relay_type, RelayKind::Offer);
        assert_eq!(req.relay_message, "sdp");
        let (device, game) = req.ids().unwrap();
        assert_eq!(device.as_str(), "d1");
        assert_eq!(game.as_str(), "00112233445566778899aabb");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let json = r#"{"device_id":"d1","player_status":"Online","extra":1}"#;
        assert!(serde_json::from_str::<PlayerStatusRequest>(json).is_err());
    }

    #[test]
    fn malformed_ids_are_bad_requests() {
        let req = MatchRequest { device_id: "d1".into(), match_id: "not-a-match".into() };
        assert!(matches!(req.ids(), Err(ServerError::InvalidRequestBody(_))));
        let req = DeviceRequest { device_id: "   ".into() };
        assert!(matches!(req.device_id(), Err(ServerError::InvalidRequestBody(_))));
    }

    #[test]
    fn empty_display_fields_are_ignored() {
        let req = PlayerStatusRequest {
            device_id: "d1".into(),
            player_name: Some(String::new()),
            player_nation: Some("NZ".into()),
            player_status: PlayerStatus::WaitingForMatch,
        };
        let update = req.try_into_update().unwrap();
        assert_eq!(update.display_name, None);
        assert_eq!(update.nation.as_deref(), Some("NZ"));
    }
}
