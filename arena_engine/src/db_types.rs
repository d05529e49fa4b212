use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MATCH_ID_LENGTH: usize = 24;
pub const MAX_DEVICE_ID_LENGTH: usize = 128;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------       DeviceId        ---------------------------------------------------------
/// The caller-supplied identifier of a player's device. It is the primary key of the player directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DeviceId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConversionError("device id cannot be empty".into()));
        }
        if s.len() > MAX_DEVICE_ID_LENGTH {
            return Err(ConversionError(format!("device id is longer than {MAX_DEVICE_ID_LENGTH} characters")));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for DeviceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DeviceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------        MatchId        ---------------------------------------------------------
/// A system-generated match identifier: 12 random bytes, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct MatchId(String);

impl MatchId {
    pub fn random() -> Self {
        let bytes: [u8; MATCH_ID_LENGTH / 2] = rand::random();
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for MatchId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s.len() != MATCH_ID_LENGTH || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConversionError(format!("'{s}' is not a valid match id")));
        }
        Ok(Self(s))
    }
}

impl Display for MatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------     PlayerStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerStatus {
    Offline,
    Online,
    /// The player is in the waiting pool. Older clients spell this `WaitMatch`.
    #[serde(alias = "WaitMatch")]
    WaitingForMatch,
    InMatch,
}

impl Display for PlayerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerStatus::Offline => write!(f, "Offline"),
            PlayerStatus::Online => write!(f, "Online"),
            PlayerStatus::WaitingForMatch => write!(f, "WaitingForMatch"),
            PlayerStatus::InMatch => write!(f, "InMatch"),
        }
    }
}

impl TryFrom<String> for PlayerStatus {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, ConversionError> {
        value.parse()
    }
}

impl FromStr for PlayerStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Offline" => Ok(Self::Offline),
            "Online" => Ok(Self::Online),
            "WaitingForMatch" | "WaitMatch" => Ok(Self::WaitingForMatch),
            "InMatch" => Ok(Self::InMatch),
            s => Err(ConversionError(format!("Invalid player status: {s}"))),
        }
    }
}

//--------------------------------------        Player         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Player {
    pub device_id: DeviceId,
    pub display_name: String,
    pub nation: String,
    #[sqlx(try_from = "String")]
    pub status: PlayerStatus,
    pub score: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The fields a client may set on its own player record. `None` (or an empty string) leaves the stored value as it
/// is, so a status-only update does not wipe the display metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerUpdate {
    pub device_id: DeviceId,
    pub display_name: Option<String>,
    pub nation: Option<String>,
    pub status: PlayerStatus,
}

impl PlayerUpdate {
    pub fn new(device_id: DeviceId, status: PlayerStatus) -> Self {
        Self { device_id, display_name: None, nation: None, status }
    }

    pub fn with_display_name<S: Into<String>>(mut self, name: S) -> Self {
        self.display_name = Some(name.into()).filter(|s: &String| !s.is_empty());
        self
    }

    pub fn with_nation<S: Into<String>>(mut self, nation: S) -> Self {
        self.nation = Some(nation.into()).filter(|s: &String| !s.is_empty());
        self
    }
}

//--------------------------------------     MatchStatus       ---------------------------------------------------------
/// The flat status label of a match, as stored and as queried. See [`MatchState`] for the tagged form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    Init,
    Wait,
    Start,
    End,
    Error,
    Invalid,
}

impl MatchStatus {
    pub const ACTIVE: [MatchStatus; 3] = [MatchStatus::Init, MatchStatus::Wait, MatchStatus::Start];
    pub const PENDING: [MatchStatus; 2] = [MatchStatus::Init, MatchStatus::Wait];

    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchStatus::End | MatchStatus::Error | MatchStatus::Invalid)
    }
}

impl Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Init => write!(f, "Init"),
            MatchStatus::Wait => write!(f, "Wait"),
            MatchStatus::Start => write!(f, "Start"),
            MatchStatus::End => write!(f, "End"),
            MatchStatus::Error => write!(f, "Error"),
            MatchStatus::Invalid => write!(f, "Invalid"),
        }
    }
}

impl TryFrom<String> for MatchStatus {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, ConversionError> {
        value.parse()
    }
}

impl FromStr for MatchStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Init" => Ok(Self::Init),
            "Wait" => Ok(Self::Wait),
            "Start" => Ok(Self::Start),
            "End" => Ok(Self::End),
            "Error" => Ok(Self::Error),
            "Invalid" => Ok(Self::Invalid),
            s => Err(ConversionError(format!("Invalid match status: {s}"))),
        }
    }
}

//--------------------------------------      MatchState       ---------------------------------------------------------
/// The lifecycle state of a match. Fields only exist in the states where they carry meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status")]
pub enum MatchState {
    /// Created by the matchmaker. Nobody has performed a ready-check yet.
    Init,
    /// One participant has performed a ready-check and is waiting for the other.
    Wait { first_connect: DeviceId },
    /// Both participants are ready. Moves can be exchanged.
    Start,
    /// Settled. The winner has been credited.
    End { winner: DeviceId, loser: DeviceId },
    /// Abandoned or timed out before it started.
    Error,
    /// Started, but the results were missing or contradictory.
    Invalid,
}

impl MatchState {
    pub fn status(&self) -> MatchStatus {
        match self {
            MatchState::Init => MatchStatus::Init,
            MatchState::Wait { .. } => MatchStatus::Wait,
            MatchState::Start => MatchStatus::Start,
            MatchState::End { .. } => MatchStatus::End,
            MatchState::Error => MatchStatus::Error,
            MatchState::Invalid => MatchStatus::Invalid,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, MatchState::Init | MatchState::Wait { .. })
    }
}

impl Display for MatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.status())
    }
}

//--------------------------------------     ResultReports     ---------------------------------------------------------
/// The raw winner/loser fields, each written by at most one report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultReports {
    pub winner: Option<DeviceId>,
    pub loser: Option<DeviceId>,
}

impl ResultReports {
    pub fn is_empty(&self) -> bool {
        self.winner.is_none() && self.loser.is_none()
    }
}

/// Which of the two result fields a report writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportedOutcome {
    Won,
    Lost,
}

impl ReportedOutcome {
    pub fn from_won(won: bool) -> Self {
        if won {
            Self::Won
        } else {
            Self::Lost
        }
    }
}

impl Display for ReportedOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportedOutcome::Won => write!(f, "winner"),
            ReportedOutcome::Lost => write!(f, "loser"),
        }
    }
}

//--------------------------------------      RelayKind        ---------------------------------------------------------
/// The three rendezvous slots used to relay session-setup payloads between the two participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayKind {
    #[serde(alias = "off")]
    Offer,
    #[serde(alias = "can")]
    Candidates,
    #[serde(alias = "ans")]
    Answer,
}

impl RelayKind {
    pub fn column(&self) -> &'static str {
        match self {
            RelayKind::Offer => "relay_offer",
            RelayKind::Candidates => "relay_candidates",
            RelayKind::Answer => "relay_answer",
        }
    }
}

impl Display for RelayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayKind::Offer => write!(f, "offer"),
            RelayKind::Candidates => write!(f, "candidates"),
            RelayKind::Answer => write!(f, "answer"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelayPayloads {
    pub offer: Option<String>,
    pub candidates: Option<String>,
    pub answer: Option<String>,
}

impl RelayPayloads {
    pub fn get(&self, kind: RelayKind) -> Option<&str> {
        match kind {
            RelayKind::Offer => self.offer.as_deref(),
            RelayKind::Candidates => self.candidates.as_deref(),
            RelayKind::Answer => self.answer.as_deref(),
        }
    }
}

//--------------------------------------         Match         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    pub id: MatchId,
    pub player_a: DeviceId,
    pub player_b: DeviceId,
    pub first_turn: DeviceId,
    #[serde(flatten)]
    pub state: MatchState,
    pub reports: ResultReports,
    pub relay: RelayPayloads,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    pub fn status(&self) -> MatchStatus {
        self.state.status()
    }

    pub fn is_participant(&self, device: &DeviceId) -> bool {
        &self.player_a == device || &self.player_b == device
    }

    /// The other participant, if `device` is one of the two.
    pub fn opponent_of(&self, device: &DeviceId) -> Option<&DeviceId> {
        if &self.player_a == device {
            Some(&self.player_b)
        } else if &self.player_b == device {
            Some(&self.player_a)
        } else {
            None
        }
    }
}

//--------------------------------------       NewMatch        ---------------------------------------------------------
/// A freshly paired match, as built by the matchmaker before it is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMatch {
    pub id: MatchId,
    pub player_a: DeviceId,
    pub player_b: DeviceId,
    pub first_turn: DeviceId,
    pub created_at: DateTime<Utc>,
}

impl NewMatch {
    /// Pairs two players. The second player pulled from the pool always moves first.
    pub fn pair(first: DeviceId, second: DeviceId) -> Self {
        Self { id: MatchId::random(), first_turn: second.clone(), player_a: first, player_b: second, created_at: Utc::now() }
    }
}

//--------------------------------------         Move          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Move {
    pub player: DeviceId,
    pub sequence: i64,
    pub step: String,
}

impl Move {
    pub fn new<S: Into<String>>(player: DeviceId, sequence: i64, step: S) -> Self {
        Self { player, sequence, step: step.into() }
    }
}

//--------------------------------------      Settlement       ---------------------------------------------------------
/// The reconciliation outcome for one stale match. `expected` pins the record the decision was based on, so that the
/// write only lands if nothing changed in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub match_id: MatchId,
    pub expected_status: MatchStatus,
    pub expected_reports: ResultReports,
    pub resolution: Resolution,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The ready-check never completed.
    TimedOut,
    /// A winner and loser are known. The winner is credited.
    Settled { winner: DeviceId, loser: DeviceId },
    /// Nothing, or something contradictory, was reported.
    Invalidated,
}

impl Resolution {
    pub fn final_status(&self) -> MatchStatus {
        match self {
            Resolution::TimedOut => MatchStatus::Error,
            Resolution::Settled { .. } => MatchStatus::End,
            Resolution::Invalidated => MatchStatus::Invalid,
        }
    }

    pub fn credited_player(&self) -> Option<&DeviceId> {
        match self {
            Resolution::Settled { winner, .. } => Some(winner),
            _ => None,
        }
    }
}
