//! Apply one action to the projections.
//!
//! Every action is validated against the current projections before anything is
//! mutated, so a rejected action leaves them exactly as they were.

use std::time::Duration;

use brisca_core::{Action, ActionKind, Card, GameStarted, GameWon, Outcome, Team, WireSeat, DECK_SIZE};
use thiserror::Error;
use tracing::warn;

use crate::pacing::TimerConfig;
use crate::projection::{BoardPosition, GameSettings, PlayerState, Projections, StatusState, TimerPhase};

const STARTING_HAND: u32 = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReduceError {
    #[error("{kind:?} names seat {seat} but the table has {seats} seats")]
    SeatOutOfRange { kind: ActionKind, seat: WireSeat, seats: usize },
    #[error("{0:?} arrived before the game was configured")]
    NotConfigured(ActionKind),
    #[error("invalid game configuration: {0}")]
    InvalidConfig(String),
    #[error("bottom card swap before any bottom card was selected")]
    NoBottomCard,
    #[error("turn switch without a card on the table to account for it")]
    UnmatchedTurnSwitch,
}

/// Side effects the caller has to act on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Applied {
    /// The local hand changed on the authority and must be fetched again.
    pub hand_affecting: bool,
    /// The game is over; nothing after this action is applied.
    pub terminal: bool,
}

pub fn apply(p: &mut Projections, action: &Action, timers: &TimerConfig) -> Result<Applied, ReduceError> {
    let kind = action.kind();
    match action {
        Action::GameConfig(cfg) => {
            let max_players = usize::try_from(cfg.max_players)
                .ok()
                .filter(|n| (2..=4).contains(n))
                .ok_or_else(|| ReduceError::InvalidConfig(format!("maxPlayers {} outside 2..=4", cfg.max_players)))?;
            p.settings = Some(GameSettings {
                game_id: cfg.game_id.clone(),
                game_type: cfg.game_type.clone(),
                max_players,
                swap_bottom_card: cfg.swap_bottom_card,
            });
        }
        Action::GameStarted(start) => start_game(p, start, timers)?,
        Action::BottomCardSelected(sel) => p.table.bottom_card = Some(sel.bottom_card),
        Action::GracePeriodEnded => {
            p.status.started = true;
            restart_timer(&mut p.status, TimerPhase::Turn, timers.turn);
        }
        Action::SwapBottomCard => {
            let bottom = p.table.bottom_card.ok_or(ReduceError::NoBottomCard)?;
            p.table.bottom_card = Some(bottom.swap_counterpart());
            p.table.bottom_swapped = true;
        }
        Action::CardDrawn(drawn) => {
            let seat = seat_index(p, kind, drawn.seat)?;
            p.table.deck = p.table.deck.saturating_sub(1);
            p.players[seat].hand_size += 1;
        }
        Action::CardPlayed(played) => {
            let seat = seat_index(p, kind, played.seat)?;
            p.table.cards_in_play.push(played.card);
            p.players[seat].hand_size = p.players[seat].hand_size.saturating_sub(1);
            if p.my_seat == Some(seat) {
                p.status.i_played = true;
            }
        }
        Action::TurnSwitch => {
            let max_players = p.max_players().ok_or(ReduceError::NotConfigured(kind))?;
            // The marker only counts a card that actually reached the table.
            if p.table.cards_in_play.len() <= p.status.cards_played {
                return Err(ReduceError::UnmatchedTurnSwitch);
            }
            let cards_played = p.status.cards_played + 1;
            let turn = if cards_played < max_players { (p.status.turn + 1) % max_players } else { p.status.turn };
            let (phase, length) = turn_length(p, kind, turn, timers)?;
            p.status.cards_played = cards_played;
            p.status.turn = turn;
            restart_timer(&mut p.status, phase, length);
        }
        Action::TurnWon(won) => {
            let seat = seat_index(p, kind, won.seat)?;
            let (phase, length) = turn_length(p, kind, seat, timers)?;
            let trick: Vec<Card> = p.table.cards_in_play.drain(..).rev().collect();
            let winner = &mut p.players[seat];
            winner.score_pile.extend(trick);
            winner.recompute_score();
            p.status.cards_played = 0;
            p.status.i_played = false;
            p.status.turn = seat;
            restart_timer(&mut p.status, phase, length);
        }
        Action::GameWon(won) => {
            let result = outcome(p, won).unwrap_or_else(|e| {
                warn!(error = %e, team = %won.team, "unreadable game result; ending the game anyway");
                Outcome::Unknown
            });
            p.outcome = Some(result);
            return Ok(Applied { hand_affecting: false, terminal: true });
        }
        Action::SeatAfk(flag) | Action::SeatNotAfk(flag) => {
            let seat = seat_index(p, kind, flag.seat)?;
            p.players[seat].afk = matches!(action, Action::SeatAfk(_));
        }
        Action::Undefined { .. } => {}
    }
    Ok(Applied { hand_affecting: kind.affects_hand(), terminal: false })
}

fn start_game(p: &mut Projections, start: &GameStarted, timers: &TimerConfig) -> Result<(), ReduceError> {
    let kind = ActionKind::GameStarted;
    let max_players = p.max_players().ok_or(ReduceError::NotConfigured(kind))?;
    let count = start.seats.len();
    if count != max_players {
        return Err(ReduceError::InvalidConfig(format!("{count} seats for a {max_players} player game")));
    }
    let mut seats: Vec<_> = start.seats.iter().collect();
    seats.sort_by_key(|s| s.seat);
    if let Some((_, bad)) = seats.iter().enumerate().find(|(i, s)| s.seat != *i as WireSeat) {
        return Err(ReduceError::SeatOutOfRange { kind, seat: bad.seat, seats: count });
    }
    let turn = usize::try_from(start.starting_seat)
        .ok()
        .filter(|s| *s < count)
        .ok_or(ReduceError::SeatOutOfRange { kind, seat: start.starting_seat, seats: count })?;

    let viewer = p.viewer();
    p.players = seats
        .iter()
        .enumerate()
        .map(|(seat, a)| PlayerState {
            seat,
            name: a.username.clone(),
            hand_size: STARTING_HAND,
            score_pile: Vec::new(),
            score: 0,
            afk: false,
            position: BoardPosition::for_seat(seat, viewer, count),
        })
        .collect();
    // Three player games put one card aside so the deck splits evenly.
    let aside = u32::from(max_players == 3);
    p.table.deck = DECK_SIZE.saturating_sub(STARTING_HAND * count as u32 + aside);
    p.table.cards_in_play.clear();
    p.status.turn = turn;
    p.status.cards_played = 0;
    p.status.i_played = false;
    restart_timer(&mut p.status, TimerPhase::Grace, timers.grace);
    Ok(())
}

fn outcome(p: &Projections, won: &GameWon) -> Result<Outcome, ReduceError> {
    match won.team.as_str() {
        "A" => return Ok(Outcome::Team(Team::A)),
        "B" => return Ok(Outcome::Team(Team::B)),
        "draw" => return Ok(Outcome::Tie),
        _ => {}
    }
    if won.seat == -1 {
        return Ok(Outcome::Tie);
    }
    seat_index(p, ActionKind::GameWon, won.seat).map(Outcome::Seat)
}

fn seat_index(p: &Projections, kind: ActionKind, seat: WireSeat) -> Result<usize, ReduceError> {
    usize::try_from(seat)
        .ok()
        .filter(|s| *s < p.players.len())
        .ok_or(ReduceError::SeatOutOfRange { kind, seat, seats: p.players.len() })
}

/// Timer phase and length for `turn`, shorter when that seat is away.
fn turn_length(
    p: &Projections,
    kind: ActionKind,
    turn: usize,
    timers: &TimerConfig,
) -> Result<(TimerPhase, Duration), ReduceError> {
    let player = p
        .player(turn)
        .ok_or(ReduceError::SeatOutOfRange { kind, seat: turn as WireSeat, seats: p.players.len() })?;
    Ok(if player.afk { (TimerPhase::AfkTurn, timers.afk_turn) } else { (TimerPhase::Turn, timers.turn) })
}

fn restart_timer(status: &mut StatusState, phase: TimerPhase, length: Duration) {
    status.timer.phase = phase;
    status.timer.length = length;
    status.timer.restarts += 1;
}
