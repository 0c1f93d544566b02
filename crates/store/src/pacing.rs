//! Per-kind display delays and turn timer lengths.

use std::time::Duration;

use brisca_core::Action;

fn env_ms(key: &str, default: u64) -> Duration {
    Duration::from_millis(std::env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default))
}

fn env_secs(key: &str, default: u64) -> Duration {
    Duration::from_secs(std::env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default))
}

/// What the pacing decision needs to know about the local player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaceContext {
    pub my_seat: Option<usize>,
    pub my_turn: bool,
    pub game_over: bool,
}

/// Delay applied before an action's effect becomes visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    pub default_delay: Duration,
    pub draw_delay: Duration,
    pub turn_switch_delay: Duration,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            default_delay: Duration::from_millis(1000),
            draw_delay: Duration::from_millis(300),
            turn_switch_delay: Duration::from_millis(250),
        }
    }
}

impl PacingPolicy {
    /// No delays at all; offline replays and tests.
    pub fn instant() -> Self {
        Self { default_delay: Duration::ZERO, draw_delay: Duration::ZERO, turn_switch_delay: Duration::ZERO }
    }

    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            default_delay: env_ms("BRISCA_PACE_DEFAULT_MS", d.default_delay.as_millis() as u64),
            draw_delay: env_ms("BRISCA_PACE_DRAW_MS", d.draw_delay.as_millis() as u64),
            turn_switch_delay: env_ms("BRISCA_PACE_TURN_SWITCH_MS", d.turn_switch_delay.as_millis() as u64),
        }
    }

    pub fn delay_for(&self, action: &Action, ctx: PaceContext) -> Duration {
        match action {
            Action::GameConfig(_) | Action::GameStarted(_) | Action::BottomCardSelected(_) => Duration::ZERO,
            Action::SwapBottomCard if ctx.my_turn && !ctx.game_over => Duration::ZERO,
            Action::CardPlayed(p)
                if !ctx.game_over && ctx.my_seat.is_some_and(|me| i64::try_from(me) == Ok(p.seat)) =>
            {
                Duration::ZERO
            }
            Action::CardDrawn(_) => self.draw_delay,
            Action::TurnSwitch => self.turn_switch_delay,
            _ => self.default_delay,
        }
    }
}

/// Turn countdown lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    pub grace: Duration,
    pub turn: Duration,
    pub afk_turn: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self { grace: Duration::from_secs(10), turn: Duration::from_secs(60), afk_turn: Duration::from_secs(5) }
    }
}

impl TimerConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            grace: env_secs("BRISCA_GRACE_SECS", d.grace.as_secs()),
            turn: env_secs("BRISCA_TURN_SECS", d.turn.as_secs()),
            afk_turn: env_secs("BRISCA_AFK_TURN_SECS", d.afk_turn.as_secs()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brisca_core::{CardDrawn, CardPlayed, GameWon, TurnWon};

    fn played(seat: i64) -> Action {
        Action::CardPlayed(CardPlayed { seat, index: 0, card: "BASTO:1".parse().unwrap() })
    }

    #[test]
    fn setup_is_instant_and_draws_are_short() {
        let p = PacingPolicy::default();
        let ctx = PaceContext::default();
        assert_eq!(p.delay_for(&Action::GameConfig(serde_json::from_value(serde_json::json!({"maxPlayers": 2})).unwrap()), ctx), Duration::ZERO);
        assert_eq!(p.delay_for(&Action::CardDrawn(CardDrawn { seat: 0 }), ctx), p.draw_delay);
        assert_eq!(p.delay_for(&Action::TurnSwitch, ctx), p.turn_switch_delay);
        assert_eq!(p.delay_for(&Action::TurnWon(TurnWon { seat: 0 }), ctx), p.default_delay);
        assert_eq!(p.delay_for(&Action::GameWon(GameWon { seat: 0, team: String::new() }), ctx), p.default_delay);
        let unknown = Action::Undefined { kind: "X".into(), reason: String::new() };
        assert_eq!(p.delay_for(&unknown, ctx), p.default_delay);
    }

    #[test]
    fn own_moves_are_instant_until_game_over() {
        let p = PacingPolicy::default();
        let mine = PaceContext { my_seat: Some(1), my_turn: true, game_over: false };
        assert_eq!(p.delay_for(&played(1), mine), Duration::ZERO);
        assert_eq!(p.delay_for(&played(0), mine), p.default_delay);
        assert_eq!(p.delay_for(&Action::SwapBottomCard, mine), Duration::ZERO);

        let over = PaceContext { game_over: true, ..mine };
        assert_eq!(p.delay_for(&played(1), over), p.default_delay);
        assert_eq!(p.delay_for(&Action::SwapBottomCard, over), p.default_delay);

        let theirs = PaceContext { my_turn: false, ..mine };
        assert_eq!(p.delay_for(&Action::SwapBottomCard, theirs), p.default_delay);
    }

    #[test]
    fn instant_policy_zeroes_everything() {
        let p = PacingPolicy::instant();
        assert_eq!(p.delay_for(&played(0), PaceContext::default()), Duration::ZERO);
        assert_eq!(p.delay_for(&Action::TurnSwitch, PaceContext::default()), Duration::ZERO);
    }
}
