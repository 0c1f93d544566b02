//! Views rebuilt from the action log: settings, table, seats and turn status.

use std::time::Duration;

use brisca_core::{Card, Outcome, Team};
use serde::Serialize;
use smallvec::SmallVec;

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct GameSettings {
    pub game_id: String,
    pub game_type: String,
    pub max_players: usize,
    pub swap_bottom_card: bool,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct TableState {
    /// Cards left to draw, bottom card included.
    pub deck: u32,
    pub bottom_card: Option<Card>,
    pub bottom_swapped: bool,
    /// Cards on the table in the order they were played.
    pub cards_in_play: SmallVec<[Card; 4]>,
}

/// Where a seat sits on screen relative to the viewer.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum BoardPosition {
    Bottom,
    Left,
    Top,
    Right,
}

impl BoardPosition {
    pub fn for_seat(seat: usize, viewer: usize, players: usize) -> Self {
        if players == 0 {
            return BoardPosition::Bottom;
        }
        let offset = (seat + players - viewer % players) % players;
        match (players, offset) {
            (_, 0) => BoardPosition::Bottom,
            (4, 1) => BoardPosition::Left,
            (4, 2) | (_, 1) => BoardPosition::Top,
            _ => BoardPosition::Right,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlayerState {
    pub seat: usize,
    pub name: String,
    pub hand_size: u32,
    /// Won cards, most recent trick last.
    pub score_pile: Vec<Card>,
    pub score: u32,
    pub afk: bool,
    pub position: BoardPosition,
}

impl PlayerState {
    pub fn recompute_score(&mut self) { self.score = self.score_pile.iter().map(Card::points).sum(); }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub enum TimerPhase {
    #[default]
    Grace,
    Turn,
    AfkTurn,
}

/// Countdown for the seat holding the turn. `restarts` grows on every restart so
/// a renderer can tell a fresh countdown from a running one.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct TurnTimer {
    pub phase: TimerPhase,
    pub length: Duration,
    pub restarts: u64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct StatusState {
    pub turn: usize,
    /// Grace period is over.
    pub started: bool,
    /// Cards played in the current trick.
    pub cards_played: usize,
    pub i_played: bool,
    pub can_swap: bool,
    pub timer: TurnTimer,
}

/// Everything the client knows about the game, derived only from the log.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Projections {
    pub settings: Option<GameSettings>,
    pub table: TableState,
    pub players: Vec<PlayerState>,
    pub status: StatusState,
    pub outcome: Option<Outcome>,
    pub my_seat: Option<usize>,
}

impl Projections {
    pub fn new(my_seat: Option<usize>) -> Self { Self { my_seat, ..Self::default() } }

    pub fn max_players(&self) -> Option<usize> { self.settings.as_ref().map(|s| s.max_players) }
    pub fn player(&self, seat: usize) -> Option<&PlayerState> { self.players.get(seat) }
    pub fn is_over(&self) -> bool { self.outcome.is_some() }

    pub fn is_my_turn(&self) -> bool {
        !self.players.is_empty() && self.my_seat == Some(self.status.turn)
    }

    /// Seat used to lay out the board: the local seat, or seat 0 for spectators.
    pub fn viewer(&self) -> usize { self.my_seat.unwrap_or(0) }

    /// Set the viewer once it is known and lay out the seats again.
    pub fn set_my_seat(&mut self, seat: Option<usize>) {
        self.my_seat = seat;
        let viewer = self.viewer();
        let count = self.players.len();
        for p in &mut self.players {
            p.position = BoardPosition::for_seat(p.seat, viewer, count);
        }
    }

    /// Whether the local player may take the bottom card with `hand`.
    pub fn swap_candidate(&self, hand: &[Card]) -> bool {
        let rule = self.settings.as_ref().is_some_and(|s| s.swap_bottom_card);
        let Some(bottom) = self.table.bottom_card else { return false };
        rule && self.status.started
            && !self.table.bottom_swapped
            && !self.is_over()
            && hand.contains(&bottom.swap_counterpart())
    }

    /// Team totals for four player games, `None` otherwise.
    pub fn team_scores(&self) -> Option<[(Team, u32); 2]> {
        if self.players.len() != 4 {
            return None;
        }
        let total = |team: Team| -> u32 { team.seats().iter().filter_map(|s| self.player(*s)).map(|p| p.score).sum() };
        Some([(Team::A, total(Team::A)), (Team::B, total(Team::B))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_positions_by_table_size() {
        assert_eq!(BoardPosition::for_seat(1, 1, 2), BoardPosition::Bottom);
        assert_eq!(BoardPosition::for_seat(0, 1, 2), BoardPosition::Top);

        assert_eq!(BoardPosition::for_seat(1, 0, 3), BoardPosition::Top);
        assert_eq!(BoardPosition::for_seat(2, 0, 3), BoardPosition::Right);

        assert_eq!(BoardPosition::for_seat(3, 2, 4), BoardPosition::Left);
        assert_eq!(BoardPosition::for_seat(0, 2, 4), BoardPosition::Top);
        assert_eq!(BoardPosition::for_seat(1, 2, 4), BoardPosition::Right);
    }

    #[test]
    fn team_scores_only_for_four_seats() {
        let mut p = Projections::new(Some(0));
        for seat in 0..4 {
            p.players.push(PlayerState {
                seat,
                name: format!("p{seat}"),
                hand_size: 0,
                score_pile: Vec::new(),
                score: seat as u32 * 10,
                afk: false,
                position: BoardPosition::Bottom,
            });
        }
        assert_eq!(p.team_scores(), Some([(Team::A, 20), (Team::B, 40)]));
        p.players.pop();
        assert_eq!(p.team_scores(), None);
    }

    #[test]
    fn swap_needs_rule_bottom_and_counterpart() {
        let mut p = Projections::new(Some(0));
        let hand: Vec<Card> = vec!["COPA:2".parse().unwrap(), "ORO:5".parse().unwrap()];
        assert!(!p.swap_candidate(&hand));

        p.settings = Some(GameSettings { max_players: 2, swap_bottom_card: true, ..Default::default() });
        p.table.bottom_card = Some("COPA:7".parse().unwrap());
        p.status.started = true;
        assert!(p.swap_candidate(&hand));

        p.table.bottom_swapped = true;
        assert!(!p.swap_candidate(&hand));
    }
}
