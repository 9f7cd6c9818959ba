//! Many threads driving one session through its `SessionHandle`.
//!
//! Mutations must apply one at a time and every reader must see a
//! published snapshot, never a half-applied play.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use bunnyhop::cards::{CardKind, Color};
use bunnyhop::core::{GameConfig, GameError};
use bunnyhop::rules::PlayRequest;
use bunnyhop::session::{Session, SessionRegistry, SessionState};

const WRITERS: usize = 4;
const MOVES_PER_WRITER: usize = 50;

/// Play the first legal card for whoever holds the turn, or draw.
fn take_turn(session: &mut Session) -> Result<(), GameError> {
    let current = session.current_player().ok_or(GameError::GameFinished)?;
    let Some(&index) = session.playable_indices(current).first() else {
        return session.draw(current).map(|_| ());
    };
    let kind = session.players().hand_of(current)?.get(index).map(|card| card.kind());
    let request = match kind {
        Some(CardKind::Wild) => PlayRequest {
            color: Some(Color::Red),
            ..PlayRequest::card(index)
        },
        _ => PlayRequest::card(index),
    };
    session.play(current, &request).map(|_| ())
}

/// Writers race on one session while readers poll snapshots; versions stay
/// monotonic for readers and gap-free for a subscriber.
#[test]
fn test_concurrent_mutations_are_serialized() {
    // A threshold nobody reaches, so every move is a play or a draw.
    let config = GameConfig::default().with_seed(17).with_win_threshold(100_000);
    let registry = SessionRegistry::with_capacity(config, WRITERS * MOVES_PER_WRITER + 8);
    let (handle, _) = registry.create("ALICE", 4).unwrap();
    for name in ["BOB", "CAROL", "DAVE"] {
        registry.join(handle.id().as_str(), name).unwrap();
    }
    handle.mutate(|s| s.start()).unwrap();
    let started = handle.snapshot().version;
    let mut updates = handle.subscribe();

    let barrier = Arc::new(Barrier::new(WRITERS + 2));
    let done = Arc::new(AtomicBool::new(false));

    let writers: Vec<_> = (0..WRITERS)
        .map(|_| {
            let handle = Arc::clone(&handle);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..MOVES_PER_WRITER {
                    handle.mutate(take_turn).unwrap();
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..2)
        .map(|_| {
            let handle = Arc::clone(&handle);
            let barrier = Arc::clone(&barrier);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                barrier.wait();
                let mut last = 0;
                while !done.load(Ordering::Acquire) {
                    let snapshot = handle.snapshot();
                    assert!(snapshot.version >= last, "version went back");
                    assert_eq!(snapshot.state, SessionState::InProgress);
                    let cards: usize = snapshot.players.iter().map(|p| p.card_count).sum::<usize>()
                        + snapshot.draw_pile_count
                        + snapshot.discard_pile_count;
                    assert_eq!(cards, 52);
                    last = snapshot.version;
                }
            })
        })
        .collect();

    for writer in writers {
        writer.join().unwrap();
    }
    done.store(true, Ordering::Release);
    for reader in readers {
        reader.join().unwrap();
    }

    let mut expected = started + 1;
    while let Ok(snapshot) = updates.try_recv() {
        assert_eq!(snapshot.version, expected);
        expected += 1;
    }
    let moves = (WRITERS * MOVES_PER_WRITER) as u64;
    assert_eq!(expected, started + 1 + moves);
    assert_eq!(handle.snapshot().version, started + moves);
}
