//! Session scenario tests.
//!
//! These drive whole games through the public `Session` API with stacked
//! decks, so every draw is known in advance.

use bunnyhop::cards::{Card, CardId, CardKind, Color};
use bunnyhop::core::{ErrorKind, GameConfig, GameError, PlayerId};
use bunnyhop::rules::{Effect, GameResult, PlayRequest, WinReason};
use bunnyhop::session::{GameId, Session, SessionBuilder, SessionState};

fn p(i: u8) -> PlayerId {
    PlayerId::new(i)
}

fn red(id: u32, value: u32) -> Card {
    Card::hop(CardId::new(id), Color::Red, value)
}

/// Build a started session whose deck deals `cards` in the given order.
fn stacked_session(names: &[&str], hand_size: usize, cards: Vec<Card>) -> Session {
    let config = GameConfig::default().with_hand_size(hand_size);
    let mut session = SessionBuilder::new(GameId::new("stacked"))
        .config(config)
        .seed(1)
        .deck(cards.into_iter().rev().collect())
        .build();
    for name in names {
        session.join(*name).unwrap();
    }
    session.start().unwrap();
    session
}

/// A reaches 18, then a red 3 on a red top takes A to 21 and ends the game.
#[test]
fn test_hop_past_threshold_finishes_game() {
    let mut session = stacked_session(
        &["A", "B"],
        1,
        vec![
            red(0, 9), // A
            red(1, 1), // B
            red(2, 5), // top
            red(3, 9), // A draws
            red(4, 2), // B draws
            red(5, 3), // A draws
            red(6, 4), // B draws
            red(7, 6), // A draws
            red(8, 7),
        ],
    );

    session.play(p(0), &PlayRequest::card(0)).unwrap();
    session.play(p(1), &PlayRequest::card(0)).unwrap();
    session.play(p(0), &PlayRequest::card(0)).unwrap();
    assert_eq!(session.players().get(p(0)).unwrap().position(), 18);
    session.play(p(1), &PlayRequest::card(0)).unwrap();

    let outcome = session.play(p(0), &PlayRequest::card(0)).unwrap();

    assert_eq!(session.players().get(p(0)).unwrap().position(), 21);
    assert_eq!(session.state(), SessionState::Finished);
    assert_eq!(
        outcome.result,
        Some(GameResult::Winner {
            player: p(0),
            reason: WinReason::Reached
        })
    );
    let err = session.play(p(1), &PlayRequest::card(0)).unwrap_err();
    assert_eq!(err, GameError::GameFinished);
    assert_eq!(session.snapshot().view_for(None).winner, Some(p(0)));
}

/// A blocked player is passed over once, then plays normally.
#[test]
fn test_block_auto_skips_once() {
    let block = Card::action(CardId::new(0), CardKind::Block);
    let mut session = stacked_session(
        &["A", "B", "C"],
        1,
        vec![
            block,      // A
            red(1, 1),  // B
            red(2, 2),  // C
            red(3, 5),  // top
            red(4, 3),  // A draws after block
            red(5, 4),  // C draws
            red(6, 6),  // A draws
            red(7, 7),  // B draws
            red(8, 8),
            red(9, 9),
        ],
    );

    let outcome = session.play(p(0), &PlayRequest::card(0)).unwrap();
    assert!(matches!(outcome.record.play.effect, Effect::Block { target } if target == p(1)));

    let change = outcome.record.turn_change.unwrap();
    assert_eq!(change.skipped.as_slice(), &[p(1)]);
    assert_eq!(session.current_player(), Some(p(2)));
    assert!(!session.players().get(p(1)).unwrap().is_blocked());

    session.play(p(2), &PlayRequest::card(0)).unwrap();
    session.play(p(0), &PlayRequest::card(0)).unwrap();
    assert_eq!(session.current_player(), Some(p(1)));
    session.play(p(1), &PlayRequest::card(0)).unwrap();
    assert_eq!(session.players().get(p(1)).unwrap().position(), 1);
}

/// Block with an explicit target.
#[test]
fn test_block_explicit_target() {
    let block = Card::action(CardId::new(0), CardKind::Block);
    let mut session = stacked_session(
        &["A", "B", "C"],
        1,
        vec![block, red(1, 1), red(2, 2), red(3, 5), red(4, 3), red(5, 4)],
    );
    let request = PlayRequest {
        target: Some(p(2)),
        ..PlayRequest::card(0)
    };

    session.play(p(0), &request).unwrap();

    assert_eq!(session.current_player(), Some(p(1)));
    assert!(session.players().get(p(2)).unwrap().is_blocked());
    session.play(p(1), &PlayRequest::card(0)).unwrap();
    assert_eq!(session.current_player(), Some(p(0)));
}

/// Skip passes over exactly one player.
#[test]
fn test_skip_three_players() {
    let skip = Card::action(CardId::new(0), CardKind::Skip);
    let mut session = stacked_session(
        &["A", "B", "C"],
        1,
        vec![skip, red(1, 1), red(2, 2), red(3, 5), red(4, 3)],
    );

    let outcome = session.play(p(0), &PlayRequest::card(0)).unwrap();

    assert_eq!(outcome.record.turn_change.unwrap().skipped.as_slice(), &[p(1)]);
    assert_eq!(session.current_player(), Some(p(2)));
}

/// Reverse with three players turns play around.
#[test]
fn test_reverse_three_players() {
    let reverse = Card::action(CardId::new(0), CardKind::Reverse);
    let mut session = stacked_session(
        &["A", "B", "C"],
        1,
        vec![reverse, red(1, 1), red(2, 2), red(3, 5), red(4, 3)],
    );

    session.play(p(0), &PlayRequest::card(0)).unwrap();

    assert_eq!(session.current_player(), Some(p(2)));
    assert_eq!(session.direction(), bunnyhop::Direction::Backward);
}

/// Action cards are playable on any colored top card.
#[test]
fn test_action_cards_ignore_color() {
    let double = Card::action(CardId::new(0), CardKind::Double);
    let blue = Card::hop(CardId::new(3), Color::Blue, 2);
    let mut session = stacked_session(&["A", "B"], 1, vec![double, red(1, 1), blue, red(4, 3)]);

    assert_eq!(session.playable_indices(p(0)), vec![0]);
    assert!(session.play(p(0), &PlayRequest::card(0)).is_ok());
}

/// A hop on a hop top needs the same color; an equal value is not enough.
#[test]
fn test_hop_needs_same_color_on_hop_top() {
    let blue_three = Card::hop(CardId::new(0), Color::Blue, 3);
    let mut session = stacked_session(&["A", "B"], 1, vec![blue_three, red(1, 1), red(2, 3), red(3, 4)]);

    assert!(session.playable_indices(p(0)).is_empty());
    let err = session.play(p(0), &PlayRequest::card(0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidPlay);
    assert_eq!(session.players().get(p(0)).unwrap().position(), 0);
    assert_eq!(session.top_card(), Some(&red(2, 3)));
}

/// Finish is refused below the reach and wins at it.
#[test]
fn test_finish_needs_reach() {
    let finish = Card::finish(CardId::new(0), 5);
    let mut session = stacked_session(&["A", "B"], 1, vec![finish, red(1, 1), red(2, 5), red(3, 3)]);

    let err = session.play(p(0), &PlayRequest::card(0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidPlay);
    assert!(err.to_string().contains("finish needs position 15"));
    assert_eq!(session.players().hand_of(p(0)).unwrap().get(0), Some(&finish));
}

/// Card arguments that do not apply are rejected.
#[test]
fn test_wrong_arguments_rejected() {
    let mut session = stacked_session(&["A", "B"], 1, vec![red(0, 3), red(1, 1), red(2, 5), red(3, 3)]);

    let with_color = PlayRequest {
        color: Some(Color::Blue),
        ..PlayRequest::card(0)
    };
    assert_eq!(session.play(p(0), &with_color).unwrap_err().kind(), ErrorKind::InvalidPlay);

    let with_target = PlayRequest {
        target: Some(p(1)),
        ..PlayRequest::card(0)
    };
    assert_eq!(session.play(p(0), &with_target).unwrap_err().kind(), ErrorKind::InvalidPlay);
    assert_eq!(session.turn_number(), 0);
}

/// A wild value narrows what matches.
#[test]
fn test_wild_value_bias() {
    let wild = Card::action(CardId::new(0), CardKind::Wild);
    let blue_four = Card::hop(CardId::new(1), Color::Blue, 4);
    let mut session = stacked_session(&["A", "B"], 1, vec![wild, blue_four, red(2, 5), red(3, 3)]);
    let request = PlayRequest {
        color: Some(Color::Green),
        value: Some(4),
        ..PlayRequest::card(0)
    };

    session.play(p(0), &request).unwrap();

    // Blue 4 matches on value.
    assert_eq!(session.playable_indices(p(1)), vec![0]);
    let out_of_range = PlayRequest {
        value: Some(11),
        ..PlayRequest::card(0)
    };
    assert_eq!(
        session.play(p(1), &out_of_range).unwrap_err().kind(),
        ErrorKind::InvalidPlay
    );
}

/// A tiny deck keeps reshuffling instead of running dry.
#[test]
fn test_deck_exhaustion_reshuffles() {
    let cards: Vec<Card> = (0..8).map(|i| red(i, 1 + i % 3)).collect();
    let config = GameConfig::default().with_hand_size(3).with_win_threshold(1_000);
    let mut session = SessionBuilder::new(GameId::new("tiny"))
        .config(config)
        .seed(9)
        .deck(cards)
        .build();
    session.join("A").unwrap();
    session.join("B").unwrap();
    session.start().unwrap();

    for _ in 0..60 {
        let current = session.current_player().unwrap();
        let index = session.playable_indices(current)[0];
        session.play(current, &PlayRequest::card(index)).unwrap();
        assert_eq!(session.cards_in_circulation(), 8);
        assert_eq!(session.players().hand_of(current).unwrap().len(), 3);
    }
    assert_eq!(session.turn_number(), 60);
}

/// Leaving mid-game hands the turn on; the last one standing wins.
#[test]
fn test_disconnects_until_forfeit() {
    let mut session = SessionBuilder::new(GameId::new("g")).seed(4).build();
    for name in ["A", "B", "C"] {
        session.join(name).unwrap();
    }
    session.start().unwrap();

    session.disconnect(p(1)).unwrap();
    assert_eq!(session.state(), SessionState::InProgress);
    assert_eq!(
        session.play(p(1), &PlayRequest::card(0)).unwrap_err(),
        GameError::PlayerDisconnected(p(1))
    );

    session.disconnect(p(0)).unwrap();
    assert_eq!(session.state(), SessionState::Finished);
    assert_eq!(
        session.result(),
        Some(GameResult::Winner {
            player: p(2),
            reason: WinReason::Forfeit
        })
    );
}

/// The history records every play in order.
#[test]
fn test_history_in_order() {
    let mut session = stacked_session(
        &["A", "B"],
        1,
        vec![red(0, 1), red(1, 2), red(2, 5), red(3, 3), red(4, 4)],
    );
    session.play(p(0), &PlayRequest::card(0)).unwrap();
    session.play(p(1), &PlayRequest::card(0)).unwrap();

    let turns: Vec<_> = session.history().iter().map(|r| (r.turn, r.play.player)).collect();
    assert_eq!(turns, vec![(1, p(0)), (2, p(1))]);
    assert_eq!(session.snapshot().last_play.unwrap().turn, 2);
}
