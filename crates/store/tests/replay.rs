#![forbid(unsafe_code)]

use brisca_core::{decode_log, Action, Card, Outcome};
use brisca_store::{inject, PacingPolicy, Projections, Reconciler, TimerConfig};
use serde_json::json;

fn card(s: &str) -> Card { s.parse().unwrap() }

fn reconciler() -> Reconciler { Reconciler::new(Some(0), PacingPolicy::instant(), TimerConfig::default()) }

fn wire_log() -> serde_json::Value {
    json!([
        {"type": "GAME_CONFIG", "payload": {"gameId": "3f1c", "gameType": "brisca", "maxPlayers": 2, "swapBottomCard": true}},
        {"type": "GAME_STARTED", "payload": {"seats": [{"seat": 0, "username": "ana"}, {"seat": 1, "username": "beto"}], "startingSeat": 0}},
        {"type": "BOTTOM_CARD_SELECTED", "payload": {"bottomCard": "ORO:7"}},
        {"type": "GRACE_PERIOD_ENDED", "payload": {}},
        {"type": "CARD_PLAYED", "payload": {"seat": 0, "index": 1, "card": "COPA:3"}},
        {"type": "CARD_PLAYED", "payload": {"seat": 1, "index": 0, "card": "COPA:1"}},
        {"type": "TURN_WON", "payload": {"seat": 1}},
        {"type": "CARD_DRAWN", "payload": {"seat": 1}},
        {"type": "CARD_DRAWN", "payload": {"seat": 0}},
        {"type": "SWAP_BOTTOM_CARD", "payload": {}},
        {"type": "SEAT_AFK", "payload": {"seat": 0}},
        {"type": "CARD_PLAYED", "payload": {"seat": 1, "index": 2, "card": "BASTO:12"}},
        {"type": "SHUFFLE", "payload": {}},
        {"type": "CARD_PLAYED", "payload": {"seat": 0, "index": 0, "card": "BASTO:10"}},
        {"type": "TURN_WON", "payload": {"seat": 1}},
        {"type": "CARD_DRAWN", "payload": {"seat": 9}},
        {"type": "GAME_WON", "payload": {"seat": 1, "team": ""}}
    ])
}

fn log() -> Vec<Action> { decode_log(wire_log().to_string().as_bytes()).unwrap() }

/// Feed `batches` in order, draining after each one like a live session would.
fn feed(batches: &[&[Action]]) -> Reconciler {
    let mut r = reconciler();
    for batch in batches {
        r.ingest(inject(batch.to_vec()));
        r.run_to_end();
        assert!(r.cache().processed() <= r.cache().processing());
    }
    r
}

#[test]
fn whole_log_replays_to_expected_state() {
    let r = feed(&[&log()]);
    let p = r.projections();
    assert!(r.is_finished());
    assert_eq!(p.players[1].score_pile, vec![card("COPA:1"), card("COPA:3"), card("BASTO:10"), card("BASTO:12")]);
    assert_eq!(p.players[1].score, 11 + 10 + 2 + 4);
    assert_eq!(p.table.bottom_card, Some(card("ORO:2")));
    assert_eq!(p.table.deck, 40 - 6 - 2);
    assert!(p.players[0].afk);
    assert_eq!(p.status.turn, 1);
    assert!(p.table.cards_in_play.is_empty());
    // 17 wire entries plus one marker per played card
    assert_eq!(r.cache().len(), 17 + 4);
}

#[test]
fn batching_does_not_change_the_result() {
    let log = log();
    let whole = feed(&[&log]).projections().clone();

    for cut in 1..log.len() {
        let (a, b) = log.split_at(cut);
        assert_eq!(feed(&[a, b]).projections(), &whole, "split at {cut}");
    }
    for first in 1..log.len() - 1 {
        for second in first + 1..log.len() {
            let parts = [&log[..first], &log[first..second], &log[second..]];
            assert_eq!(feed(&parts).projections(), &whole, "split at {first}/{second}");
        }
    }
    let singles: Vec<&[Action]> = log.chunks(1).collect();
    assert_eq!(feed(&singles).projections(), &whole);
}

#[test]
fn trick_scenario_from_two_players() {
    let log = decode_log(
        json!([
            {"type": "GAME_CONFIG", "payload": {"maxPlayers": 2}},
            {"type": "GAME_STARTED", "payload": {"seats": [{"seat": 0, "username": "A"}, {"seat": 1, "username": "B"}], "startingSeat": 0}},
            {"type": "GRACE_PERIOD_ENDED", "payload": {}},
            {"type": "CARD_PLAYED", "payload": {"seat": 0, "card": "ESPADA:5"}},
            {"type": "CARD_PLAYED", "payload": {"seat": 1, "card": "ESPADA:11"}},
            {"type": "TURN_WON", "payload": {"seat": 0}}
        ])
        .to_string()
        .as_bytes(),
    )
    .unwrap();
    let r = feed(&[&log]);
    let p = r.projections();
    assert_eq!(p.status.turn, 0);
    assert_eq!(p.players[0].score_pile, vec![card("ESPADA:11"), card("ESPADA:5")]);
    assert!(p.table.cards_in_play.is_empty());
    assert!(p.status.started);
}

#[test]
fn unknown_kind_advances_the_cursor_only() {
    let mut r = feed(&[&log()[..4]]);
    let before = r.projections().clone();
    let processed = r.cache().processed();

    let unknown = decode_log(br#"[{"type": "DEALER_CHANGED", "payload": {"seat": 0}}]"#).unwrap();
    r.ingest(inject(unknown));
    assert_eq!(r.run_to_end(), 1);
    assert_eq!(r.cache().processed(), processed + 1);
    assert_eq!(r.projections(), &before);
}

#[test]
fn empty_polls_do_nothing() {
    let mut r = feed(&[&log()[..3]]);
    let cursors = (r.cache().processing(), r.cache().processed());
    for _ in 0..2 {
        r.ingest(inject(Vec::new()));
        assert!(r.claim_next().is_none());
    }
    assert_eq!((r.cache().processing(), r.cache().processed()), cursors);
}

#[test]
fn trick_winner_takes_the_turn_immediately() {
    let mut r = reconciler();
    r.ingest(inject(log()));
    while let Some(claim) = r.claim_next() {
        r.complete();
        if let Action::TurnWon(won) = &claim.action {
            assert_eq!(r.projections().status.turn as i64, won.seat);
            assert_eq!(r.projections().status.cards_played, 0);
        }
        assert!(r.projections().status.cards_played <= 2);
    }
    assert_ne!(r.projections(), &Projections::new(Some(0)));
}

#[test]
fn unreadable_winner_still_ends_the_game() {
    let log = decode_log(
        json!([
            {"type": "GAME_CONFIG", "payload": {"maxPlayers": 2}},
            {"type": "GAME_STARTED", "payload": {"seats": [{"seat": 0, "username": "A"}, {"seat": 1, "username": "B"}], "startingSeat": 0}},
            {"type": "GAME_WON", "payload": {"seat": 5, "team": ""}},
            {"type": "CARD_DRAWN", "payload": {"seat": 0}}
        ])
        .to_string()
        .as_bytes(),
    )
    .unwrap();
    let mut r = reconciler();
    r.ingest(inject(log));
    assert!(r.terminal_seen());
    assert_eq!(r.run_to_end(), 3);
    assert!(r.is_finished());
    assert!(r.claim_next().is_none());
    assert_eq!(r.projections().outcome, Some(Outcome::Unknown));
    assert_eq!(r.projections().players[0].hand_size, 3, "nothing after the terminal action is applied");
}
