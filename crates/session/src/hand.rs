//! The local hand, with room for one optimistic play.

use brisca_core::Card;
use brisca_store::Projections;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlayError {
    #[error("the game has not started yet")]
    NotStarted,
    #[error("the game is over")]
    GameOver,
    #[error("it is not your turn")]
    NotYourTurn,
    #[error("you already played this trick")]
    AlreadyPlayed,
    #[error("a play is already waiting for the server")]
    Pending,
    #[error("no card at position {index}; hand has {len}")]
    NoSuchCard { index: usize, len: usize },
}

/// Cards the UI shows. `pending` holds the server's copy while a play is
/// unconfirmed so a rejection can put it back.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct HandState {
    cards: Vec<Card>,
    #[serde(skip)]
    pending: Option<Vec<Card>>,
}

impl HandState {
    pub fn cards(&self) -> &[Card] { &self.cards }
    pub fn is_pending(&self) -> bool { self.pending.is_some() }

    pub fn check_play(&self, index: usize, p: &Projections) -> Result<(), PlayError> {
        if p.is_over() {
            return Err(PlayError::GameOver);
        }
        if !p.status.started {
            return Err(PlayError::NotStarted);
        }
        if !p.is_my_turn() {
            return Err(PlayError::NotYourTurn);
        }
        if p.status.i_played {
            return Err(PlayError::AlreadyPlayed);
        }
        if self.is_pending() {
            return Err(PlayError::Pending);
        }
        if index >= self.cards.len() {
            return Err(PlayError::NoSuchCard { index, len: self.cards.len() });
        }
        Ok(())
    }

    /// Remove the card at `index` ahead of the server.
    pub fn speculate_play(&mut self, index: usize) -> Option<Card> {
        if index >= self.cards.len() {
            return None;
        }
        self.pending = Some(self.cards.clone());
        Some(self.cards.remove(index))
    }

    /// The server took the play; keep the local edit until the next refresh.
    pub fn confirm(&mut self) { self.pending = None; }

    /// The server refused the play; drop the local edit.
    pub fn reject(&mut self) -> bool {
        match self.pending.take() {
            Some(prev) => {
                self.cards = prev;
                true
            }
            None => false,
        }
    }

    /// Install the server's hand as is.
    pub fn replace(&mut self, cards: Vec<Card>) {
        self.cards = cards;
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brisca_store::{BoardPosition, PlayerState};

    fn cards(list: &[&str]) -> Vec<Card> { list.iter().map(|c| c.parse().unwrap()).collect() }

    fn my_turn() -> Projections {
        let mut p = Projections::new(Some(0));
        p.players.push(PlayerState {
            seat: 0,
            name: "me".into(),
            hand_size: 3,
            score_pile: Vec::new(),
            score: 0,
            afk: false,
            position: BoardPosition::Bottom,
        });
        p.status.started = true;
        p
    }

    #[test]
    fn speculation_and_rejection() {
        let mut hand = HandState::default();
        hand.replace(cards(&["ORO:1", "COPA:2", "BASTO:3"]));
        assert_eq!(hand.speculate_play(1), Some("COPA:2".parse().unwrap()));
        assert_eq!(hand.cards(), cards(&["ORO:1", "BASTO:3"]).as_slice());
        assert!(hand.is_pending());
        assert!(hand.reject());
        assert_eq!(hand.cards(), cards(&["ORO:1", "COPA:2", "BASTO:3"]).as_slice());
        assert!(!hand.reject());
    }

    #[test]
    fn refresh_overwrites_speculation() {
        let mut hand = HandState::default();
        hand.replace(cards(&["ORO:1", "COPA:2"]));
        hand.speculate_play(0);
        hand.replace(cards(&["COPA:2", "ESPADA:12"]));
        assert!(!hand.is_pending());
        assert_eq!(hand.cards(), cards(&["COPA:2", "ESPADA:12"]).as_slice());
    }

    #[test]
    fn play_preconditions() {
        let mut hand = HandState::default();
        hand.replace(cards(&["ORO:1"]));
        let mut p = my_turn();
        assert_eq!(hand.check_play(0, &p), Ok(()));
        assert_eq!(hand.check_play(3, &p), Err(PlayError::NoSuchCard { index: 3, len: 1 }));

        p.status.i_played = true;
        assert_eq!(hand.check_play(0, &p), Err(PlayError::AlreadyPlayed));
        p.status.i_played = false;

        p.status.turn = 1;
        assert_eq!(hand.check_play(0, &p), Err(PlayError::NotYourTurn));
        p.status.turn = 0;

        p.status.started = false;
        assert_eq!(hand.check_play(0, &p), Err(PlayError::NotStarted));
        p.status.started = true;

        hand.speculate_play(0);
        assert_eq!(hand.check_play(0, &p), Err(PlayError::Pending));
    }
}
