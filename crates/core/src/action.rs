//! Action log vocabulary.
//!
//! The authority describes a game only through an append-only log of actions.
//! Each entry travels as `{"type": "CARD_PLAYED", "payload": {...}}`; decoding reads
//! the envelope, matches the kind tag and only then parses that kind's payload.
//! Anything that cannot be understood becomes [`Action::Undefined`] so a single bad
//! entry never blocks the entries behind it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::{Card, CoreError, WireSeat};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    #[serde(default)]
    pub game_id: String,
    #[serde(default)]
    pub game_type: String,
    pub max_players: i64,
    #[serde(default)]
    pub swap_bottom_card: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeatAssignment {
    pub seat: WireSeat,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameStarted {
    pub seats: Vec<SeatAssignment>,
    pub starting_seat: WireSeat,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BottomCardSelected {
    pub bottom_card: Card,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardDrawn {
    pub seat: WireSeat,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardPlayed {
    pub seat: WireSeat,
    /// Position of the card in the player's hand when it was played.
    #[serde(default)]
    pub index: i64,
    pub card: Card,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnWon {
    pub seat: WireSeat,
}

/// `seat` is `-1` for a tie in two and three player games; four player games
/// report `team` as `"A"`, `"B"` or `"draw"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameWon {
    #[serde(default = "no_seat")]
    pub seat: WireSeat,
    #[serde(default)]
    pub team: String,
}

fn no_seat() -> WireSeat { -1 }

/// Payload shared by `SEAT_AFK` and `SEAT_NOT_AFK`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatFlag {
    pub seat: WireSeat,
}

/// One entry of the action log. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    GameConfig(GameConfig),
    GameStarted(GameStarted),
    BottomCardSelected(BottomCardSelected),
    GracePeriodEnded,
    SwapBottomCard,
    CardDrawn(CardDrawn),
    CardPlayed(CardPlayed),
    TurnWon(TurnWon),
    GameWon(GameWon),
    SeatAfk(SeatFlag),
    SeatNotAfk(SeatFlag),
    /// Client-only pacing marker inserted after every played card.
    TurnSwitch,
    /// Entry the client could not understand; still occupies a log slot.
    Undefined { kind: String, reason: String },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ActionKind {
    GameConfig,
    GameStarted,
    BottomCardSelected,
    GracePeriodEnded,
    SwapBottomCard,
    CardDrawn,
    CardPlayed,
    TurnWon,
    GameWon,
    SeatAfk,
    SeatNotAfk,
    TurnSwitch,
    Undefined,
}

impl ActionKind {
    const WIRE: [(ActionKind, &'static str); 12] = [
        (ActionKind::GameConfig, "GAME_CONFIG"),
        (ActionKind::GameStarted, "GAME_STARTED"),
        (ActionKind::BottomCardSelected, "BOTTOM_CARD_SELECTED"),
        (ActionKind::GracePeriodEnded, "GRACE_PERIOD_ENDED"),
        (ActionKind::SwapBottomCard, "SWAP_BOTTOM_CARD"),
        (ActionKind::CardDrawn, "CARD_DRAWN"),
        (ActionKind::CardPlayed, "CARD_PLAYED"),
        (ActionKind::TurnWon, "TURN_WON"),
        (ActionKind::GameWon, "GAME_WON"),
        (ActionKind::SeatAfk, "SEAT_AFK"),
        (ActionKind::SeatNotAfk, "SEAT_NOT_AFK"),
        (ActionKind::TurnSwitch, "TURN_SWITCH"),
    ];

    pub fn wire_name(self) -> &'static str {
        Self::WIRE
            .iter()
            .find(|(k, _)| *k == self)
            .map(|(_, name)| *name)
            .unwrap_or("UNDEFINED")
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Self::WIRE.iter().find(|(_, n)| *n == name).map(|(k, _)| *k)
    }

    /// Kinds the client makes up itself and never accepts from the authority.
    pub fn is_synthetic(self) -> bool { matches!(self, ActionKind::TurnSwitch) }

    /// Kinds after which the local hand has to be fetched again.
    pub fn affects_hand(self) -> bool {
        matches!(
            self,
            ActionKind::GameStarted | ActionKind::SwapBottomCard | ActionKind::CardDrawn | ActionKind::CardPlayed
        )
    }
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::GameConfig(_) => ActionKind::GameConfig,
            Action::GameStarted(_) => ActionKind::GameStarted,
            Action::BottomCardSelected(_) => ActionKind::BottomCardSelected,
            Action::GracePeriodEnded => ActionKind::GracePeriodEnded,
            Action::SwapBottomCard => ActionKind::SwapBottomCard,
            Action::CardDrawn(_) => ActionKind::CardDrawn,
            Action::CardPlayed(_) => ActionKind::CardPlayed,
            Action::TurnWon(_) => ActionKind::TurnWon,
            Action::GameWon(_) => ActionKind::GameWon,
            Action::SeatAfk(_) => ActionKind::SeatAfk,
            Action::SeatNotAfk(_) => ActionKind::SeatNotAfk,
            Action::TurnSwitch => ActionKind::TurnSwitch,
            Action::Undefined { .. } => ActionKind::Undefined,
        }
    }

    pub fn is_terminal(&self) -> bool { matches!(self, Action::GameWon(_)) }

    /// Wire envelope for this action. Undefined entries keep their original tag
    /// and lose the payload, so they decode back to `Undefined`.
    pub fn to_wire(&self) -> Value {
        let (kind, payload) = match self {
            Action::GameConfig(p) => (self.kind().wire_name(), to_value(p)),
            Action::GameStarted(p) => (self.kind().wire_name(), to_value(p)),
            Action::BottomCardSelected(p) => (self.kind().wire_name(), to_value(p)),
            Action::CardDrawn(p) => (self.kind().wire_name(), to_value(p)),
            Action::CardPlayed(p) => (self.kind().wire_name(), to_value(p)),
            Action::TurnWon(p) => (self.kind().wire_name(), to_value(p)),
            Action::GameWon(p) => (self.kind().wire_name(), to_value(p)),
            Action::SeatAfk(p) | Action::SeatNotAfk(p) => (self.kind().wire_name(), to_value(p)),
            Action::GracePeriodEnded | Action::SwapBottomCard | Action::TurnSwitch => {
                (self.kind().wire_name(), Value::Object(Default::default()))
            }
            Action::Undefined { kind, .. } => (kind.as_str(), Value::Null),
        };
        serde_json::json!({ "type": kind, "payload": payload })
    }
}

fn to_value<T: Serialize>(payload: &T) -> Value {
    serde_json::to_value(payload).unwrap_or_default()
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

/// Decode one wire entry. Never fails: unreadable entries become `Undefined`.
pub fn decode_action(entry: Value) -> Action {
    let envelope: Envelope = match serde_json::from_value(entry) {
        Ok(env) => env,
        Err(e) => {
            warn!(error = %e, "action envelope unreadable; mapping to Undefined");
            return Action::Undefined { kind: String::new(), reason: e.to_string() };
        }
    };
    let kind = match ActionKind::from_wire(&envelope.kind) {
        Some(kind) if !kind.is_synthetic() => kind,
        _ => {
            warn!(kind = %envelope.kind, "unrecognized action kind; mapping to Undefined");
            return Action::Undefined { kind: envelope.kind, reason: "unrecognized kind".to_string() };
        }
    };
    match decode_payload(kind, envelope.payload) {
        Ok(action) => action,
        Err(e) => {
            warn!(kind = %envelope.kind, error = %e, "action payload unreadable; mapping to Undefined");
            Action::Undefined { kind: envelope.kind, reason: e.to_string() }
        }
    }
}

fn decode_payload(kind: ActionKind, payload: Value) -> Result<Action, serde_json::Error> {
    use serde_json::from_value;
    Ok(match kind {
        ActionKind::GameConfig => Action::GameConfig(from_value(payload)?),
        ActionKind::GameStarted => Action::GameStarted(from_value(payload)?),
        ActionKind::BottomCardSelected => Action::BottomCardSelected(from_value(payload)?),
        ActionKind::GracePeriodEnded => Action::GracePeriodEnded,
        ActionKind::SwapBottomCard => Action::SwapBottomCard,
        ActionKind::CardDrawn => Action::CardDrawn(from_value(payload)?),
        ActionKind::CardPlayed => Action::CardPlayed(from_value(payload)?),
        ActionKind::TurnWon => Action::TurnWon(from_value(payload)?),
        ActionKind::GameWon => Action::GameWon(from_value(payload)?),
        ActionKind::SeatAfk => Action::SeatAfk(from_value(payload)?),
        ActionKind::SeatNotAfk => Action::SeatNotAfk(from_value(payload)?),
        ActionKind::TurnSwitch | ActionKind::Undefined => Action::Undefined {
            kind: kind.wire_name().to_string(),
            reason: "not an authoritative kind".to_string(),
        },
    })
}

/// Decode a whole log. Only a top level that is not a JSON array is an error.
pub fn decode_log(bytes: &[u8]) -> Result<Vec<Action>, CoreError> {
    let entries: Vec<Value> = serde_json::from_slice(bytes)?;
    Ok(entries.into_iter().map(decode_action).collect())
}

/// Encode the authoritative part of a log; synthetic markers are left out.
pub fn encode_log(actions: &[Action]) -> Value {
    Value::Array(
        actions
            .iter()
            .filter(|a| !a.kind().is_synthetic())
            .map(Action::to_wire)
            .collect(),
    )
}
