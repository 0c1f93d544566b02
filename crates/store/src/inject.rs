//! Client-side pacing markers.

use brisca_core::Action;

/// A batch after marker insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Injected {
    pub actions: Vec<Action>,
    /// The batch contained a `GameWon`.
    pub terminal: bool,
}

/// Insert a `TurnSwitch` right after every `CardPlayed` and flag terminal batches.
/// Everything else passes through in order.
pub fn inject(batch: Vec<Action>) -> Injected {
    let played = batch.iter().filter(|a| matches!(a, Action::CardPlayed(_))).count();
    let mut actions = Vec::with_capacity(batch.len() + played);
    let mut terminal = false;
    for action in batch {
        let marker = matches!(action, Action::CardPlayed(_));
        terminal |= action.is_terminal();
        actions.push(action);
        if marker {
            actions.push(Action::TurnSwitch);
        }
    }
    Injected { actions, terminal }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brisca_core::{ActionKind, CardDrawn, CardPlayed, GameWon};

    fn played(seat: i64) -> Action {
        Action::CardPlayed(CardPlayed { seat, index: 0, card: "ORO:4".parse().unwrap() })
    }

    #[test]
    fn marker_follows_each_played_card() {
        let out = inject(vec![Action::CardDrawn(CardDrawn { seat: 0 }), played(0), played(1)]);
        let kinds: Vec<_> = out.actions.iter().map(Action::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ActionKind::CardDrawn,
                ActionKind::CardPlayed,
                ActionKind::TurnSwitch,
                ActionKind::CardPlayed,
                ActionKind::TurnSwitch,
            ]
        );
        assert!(!out.terminal);
    }

    #[test]
    fn game_won_sets_terminal_without_marker() {
        let out = inject(vec![played(1), Action::GameWon(GameWon { seat: 1, team: String::new() })]);
        assert!(out.terminal);
        assert_eq!(out.actions.len(), 3);
        assert_eq!(out.actions[2].kind(), ActionKind::GameWon);
    }

    #[test]
    fn empty_batch() {
        assert_eq!(inject(Vec::new()), Injected::default());
    }
}
