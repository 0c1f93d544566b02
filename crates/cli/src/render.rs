//! Plain text views of a session.

use std::fmt::Write as _;

use brisca_core::{Card, Outcome, Team};
use brisca_session::SessionSnapshot;
use brisca_store::{BoardPosition, Projections};

pub fn card_list(cards: &[Card], emoji: bool) -> String {
    cards.iter().map(|c| c.render(emoji)).collect::<Vec<_>>().join(" ")
}

/// One line describing the table, reprinted whenever it changes.
pub fn status_line(snap: &SessionSnapshot, emoji: bool) -> String {
    let p = &snap.projections;
    if p.players.is_empty() {
        return format!("waiting for the game to start ({} actions seen)", snap.log_len);
    }
    let turn = p.player(p.status.turn).map(|pl| pl.name.as_str()).unwrap_or("?");
    let mut line = format!("turn: {turn}");
    if p.is_my_turn() {
        line.push_str(" (you)");
    }
    if !p.status.started {
        line.push_str(" | grace period");
    }
    let life = p.table.bottom_card.map(|c| c.render(emoji)).unwrap_or_else(|| "-".to_string());
    let _ = write!(line, " | deck {} | life {life} | table {}", p.table.deck, card_list(&p.table.cards_in_play, emoji));
    if let Some(left) = snap.timer_remaining() {
        let _ = write!(line, " | {}s", left.as_secs());
    }
    if !snap.hand.is_empty() {
        let hand: Vec<String> =
            snap.hand.iter().enumerate().map(|(i, c)| format!("{}:{}", i + 1, c.render(emoji))).collect();
        let _ = write!(line, " | hand {}", hand.join(" "));
    }
    if p.status.can_swap {
        line.push_str(" | swap available (s)");
    }
    line
}

/// Seats in screen order with their counters.
pub fn board(p: &Projections) -> String {
    let order = [BoardPosition::Top, BoardPosition::Left, BoardPosition::Right, BoardPosition::Bottom];
    let mut out = String::new();
    for pos in order {
        for pl in p.players.iter().filter(|pl| pl.position == pos) {
            let afk = if pl.afk { " (afk)" } else { "" };
            let _ = writeln!(out, "{:<6} {}{afk}: {} cards, {} points", format!("{pos:?}"), pl.name, pl.hand_size, pl.score);
        }
    }
    out
}

fn team_names(p: &Projections, team: Team) -> String {
    team.seats().iter().filter_map(|s| p.player(*s)).map(|pl| pl.name.as_str()).collect::<Vec<_>>().join(" and ")
}

pub fn outcome_line(p: &Projections) -> String {
    match p.outcome {
        None => "The game did not finish.".to_string(),
        Some(Outcome::Tie) => "It was a tie!".to_string(),
        Some(Outcome::Unknown) => "The game is over.".to_string(),
        Some(Outcome::Seat(seat)) => {
            let name = p.player(seat).map(|pl| pl.name.as_str()).unwrap_or("?");
            format!("{name} won!!!")
        }
        Some(Outcome::Team(team)) => format!("Team {team:?}: {} won!!!", team_names(p, team)),
    }
}

/// Final scores and the result.
pub fn summary(p: &Projections) -> String {
    let mut out = String::new();
    match p.team_scores() {
        Some(teams) => {
            for (team, score) in teams {
                let _ = writeln!(out, "Team {team:?} ({}): {score}", team_names(p, team));
            }
        }
        None => {
            for pl in &p.players {
                let _ = writeln!(out, "{}: {}", pl.name, pl.score);
            }
        }
    }
    out.push_str(&outcome_line(p));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use brisca_store::PlayerState;

    fn table(names: &[&str], scores: &[u32]) -> Projections {
        let mut p = Projections::new(Some(0));
        for (seat, (name, score)) in names.iter().zip(scores).enumerate() {
            p.players.push(PlayerState {
                seat,
                name: name.to_string(),
                hand_size: 3,
                score_pile: Vec::new(),
                score: *score,
                afk: false,
                position: BoardPosition::for_seat(seat, 0, names.len()),
            });
        }
        p
    }

    #[test]
    fn summary_names_the_winner() {
        let mut p = table(&["ana", "beto"], &[70, 50]);
        p.outcome = Some(Outcome::Seat(0));
        assert_eq!(summary(&p), "ana: 70\nbeto: 50\nana won!!!");
        p.outcome = Some(Outcome::Tie);
        assert!(summary(&p).ends_with("It was a tie!"));
    }

    #[test]
    fn four_players_are_scored_by_team() {
        let mut p = table(&["ana", "beto", "caro", "dani"], &[30, 20, 30, 40]);
        p.outcome = Some(Outcome::Team(Team::A));
        assert_eq!(
            summary(&p),
            "Team A (ana and caro): 60\nTeam B (beto and dani): 60\nTeam A: ana and caro won!!!"
        );
    }

    #[test]
    fn status_line_numbers_the_hand() {
        let mut snap = SessionSnapshot::default();
        assert!(status_line(&snap, false).starts_with("waiting"));

        snap.projections = table(&["ana", "beto"], &[0, 0]);
        snap.projections.status.started = true;
        snap.projections.table.deck = 34;
        snap.hand = vec!["ORO:1".parse().unwrap(), "COPA:12".parse().unwrap()];
        let line = status_line(&snap, false);
        assert!(line.starts_with("turn: ana (you)"), "{line}");
        assert!(line.contains("deck 34"));
        assert!(line.contains("hand 1:[O: 1] 2:[C:12]"), "{line}");
    }

    #[test]
    fn board_lists_every_seat() {
        let p = table(&["ana", "beto", "caro"], &[0, 4, 0]);
        let text = board(&p);
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().next().unwrap().contains("beto"));
        assert!(text.lines().last().unwrap().starts_with("Bottom"));
    }
}
