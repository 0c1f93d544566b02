//! Brisca core types: cards, the action log vocabulary and its wire codec.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

pub mod action;
pub mod card;

pub use action::{
    decode_action, decode_log, encode_log, Action, ActionKind, BottomCardSelected, CardDrawn, CardPlayed,
    GameConfig, GameStarted, GameWon, SeatAssignment, SeatFlag, TurnWon,
};
pub use card::{Card, Suit, DECK_SIZE};

/// Seat numbers as they travel on the wire. Signed so that a bad value from the
/// authority survives decoding and can be rejected by bounds checks later.
pub type WireSeat = i64;

/// Errors raised while decoding authoritative data.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid card: {0}")]
    InvalidCard(String),
    #[error("invalid action log: {0}")]
    InvalidLog(#[from] serde_json::Error),
}

/// Team split used by four player games: seats 0 and 2 against seats 1 and 3.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Team {
    A,
    B,
}

impl Team {
    pub fn of_seat(seat: usize) -> Self {
        if seat % 2 == 0 { Team::A } else { Team::B }
    }

    pub fn seats(self) -> [usize; 2] {
        match self {
            Team::A => [0, 2],
            Team::B => [1, 3],
        }
    }
}

/// Final result of a game.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Outcome {
    Seat(usize),
    Team(Team),
    Tie,
    /// The game ended but the announced winner could not be read.
    Unknown,
}

pub mod prelude {
    pub use super::{Action, ActionKind, Card, CoreError, Outcome, Suit, Team, WireSeat};
}
