//! Thread-safe registry of live sessions.
//!
//! Each session sits in a `SessionHandle`: a mutex serializes mutations,
//! the last published snapshot is readable without taking that mutex, and
//! a broadcast channel pushes every new snapshot to subscribed connections.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::core::{GameConfig, GameError, GameRng, PlayerId};

use super::snapshot::SessionSnapshot;
use super::state::{GameId, Session, SessionBuilder, SessionState};

/// Updates buffered per subscriber before the slowest one starts lagging.
pub const DEFAULT_BROADCAST_CAPACITY: usize = 64;

/// One live session plus its published state.
pub struct SessionHandle {
    id: GameId,
    session: Mutex<Session>,
    snapshot: RwLock<Arc<SessionSnapshot>>,
    updates: broadcast::Sender<Arc<SessionSnapshot>>,
}

impl SessionHandle {
    fn new(session: Session, capacity: usize) -> Self {
        let (updates, _) = broadcast::channel(capacity.max(1));
        Self {
            id: session.id().clone(),
            snapshot: RwLock::new(Arc::new(session.snapshot())),
            session: Mutex::new(session),
            updates,
        }
    }

    #[must_use]
    pub fn id(&self) -> &GameId {
        &self.id
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        Arc::clone(&self.snapshot.read())
    }

    /// Receive every snapshot published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<SessionSnapshot>> {
        self.updates.subscribe()
    }

    /// Connections currently subscribed to updates.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.updates.receiver_count()
    }

    /// Run `f` against the session under its lock.
    ///
    /// When `f` succeeds and changed the session, the new snapshot is
    /// published before the lock is released, so subscribers see updates
    /// in mutation order.
    pub fn mutate<T>(&self, f: impl FnOnce(&mut Session) -> Result<T, GameError>) -> Result<T, GameError> {
        let mut session = self.session.lock();
        let before = session.version();
        let out = f(&mut session)?;
        if session.version() != before {
            self.publish(&session);
        }
        Ok(out)
    }

    /// Read the live session under its lock.
    pub fn inspect<T>(&self, f: impl FnOnce(&Session) -> T) -> T {
        f(&self.session.lock())
    }

    fn publish(&self, session: &Session) {
        let snapshot = Arc::new(session.snapshot());
        *self.snapshot.write() = Arc::clone(&snapshot);
        // No subscribers is fine.
        let receivers = self.updates.send(snapshot).unwrap_or(0);
        debug!(game = %self.id, version = session.version(), receivers, "snapshot published");
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("version", &self.snapshot.read().version)
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}

/// All sessions hosted by one server.
pub struct SessionRegistry {
    sessions: RwLock<FxHashMap<GameId, Arc<SessionHandle>>>,
    config: GameConfig,
    master_rng: Mutex<GameRng>,
    next_id: AtomicU64,
    broadcast_capacity: usize,
}

impl SessionRegistry {
    /// Registry whose sessions use `config`.
    ///
    /// Session seeds are forked from `config.seed`, so a seeded registry
    /// replays the same deals in the same creation order.
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        Self::with_capacity(config, DEFAULT_BROADCAST_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(config: GameConfig, broadcast_capacity: usize) -> Self {
        let master_rng = match config.seed {
            Some(seed) => GameRng::new(seed),
            None => GameRng::from_clock(),
        };
        Self {
            sessions: RwLock::new(FxHashMap::default()),
            config,
            master_rng: Mutex::new(master_rng),
            next_id: AtomicU64::new(1),
            broadcast_capacity,
        }
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Open a session with `max_players` seats and seat `creator` in it.
    ///
    /// Seat counts outside the allowed range fall back to the maximum.
    pub fn create(&self, creator: &str, max_players: usize) -> Result<(Arc<SessionHandle>, PlayerId), GameError> {
        let id = GameId::sequential(self.next_id.fetch_add(1, Ordering::Relaxed));
        let seed = self.master_rng.lock().fork().seed();
        let config = GameConfig {
            max_players: self.config.clamp_seats(max_players),
            ..self.config.clone()
        };
        let seats = config.max_players;

        let mut session = SessionBuilder::new(id.clone()).config(config).seed(seed).build();
        let player = session.join(creator)?;
        let handle = Arc::new(SessionHandle::new(session, self.broadcast_capacity));

        self.sessions.write().insert(id.clone(), Arc::clone(&handle));
        info!(game = %id, seats, seed, creator, "session created");
        Ok((handle, player))
    }

    /// Look up a session by id.
    pub fn get(&self, id: &str) -> Result<Arc<SessionHandle>, GameError> {
        self.sessions
            .read()
            .get(&GameId::new(id))
            .cloned()
            .ok_or_else(|| GameError::GameNotFound(id.to_string()))
    }

    /// Seat `name` in an existing session.
    pub fn join(&self, id: &str, name: &str) -> Result<(Arc<SessionHandle>, PlayerId), GameError> {
        let handle = self.get(id)?;
        let player = handle.mutate(|session| session.join(name))?;
        Ok((handle, player))
    }

    /// Drop a session regardless of state.
    pub fn remove(&self, id: &GameId) -> Option<Arc<SessionHandle>> {
        self.sessions.write().remove(id)
    }

    /// Remove finished sessions nobody is subscribed to any more.
    pub fn reap_finished(&self) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, handle| {
            handle.snapshot().state != SessionState::Finished || handle.subscriber_count() > 0
        });
        let reaped = before - sessions.len();
        if reaped > 0 {
            info!(reaped, live = sessions.len(), "reaped finished sessions");
        }
        reaped
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::PlayRequest;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(GameConfig::default().with_seed(99))
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let registry = registry();
        let (a, creator) = registry.create("ALICE", 2).unwrap();
        let (b, _) = registry.create("BOB", 4).unwrap();

        assert_eq!(a.id().as_str(), "game-1");
        assert_eq!(b.id().as_str(), "game-2");
        assert_eq!(creator, PlayerId::new(0));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_create_clamps_seats() {
        let registry = registry();
        let (handle, _) = registry.create("ALICE", 9).unwrap();
        assert_eq!(handle.inspect(|s| s.players().max_players()), 4);

        let (handle, _) = registry.create("ALICE", 1).unwrap();
        assert_eq!(handle.inspect(|s| s.players().max_players()), 4);

        let (handle, _) = registry.create("ALICE", 3).unwrap();
        assert_eq!(handle.inspect(|s| s.players().max_players()), 3);
    }

    #[test]
    fn test_join_unknown_game() {
        let registry = registry();
        let err = registry.join("game-77", "BOB").unwrap_err();
        assert_eq!(err, GameError::GameNotFound("game-77".into()));
    }

    #[test]
    fn test_join_full_game() {
        let registry = registry();
        let (handle, _) = registry.create("ALICE", 2).unwrap();
        registry.join(handle.id().as_str(), "BOB").unwrap();

        let err = registry.join(handle.id().as_str(), "CAROL").unwrap_err();
        assert_eq!(err, GameError::GameFull { max: 2 });
        assert_eq!(handle.snapshot().players.len(), 2);
    }

    #[test]
    fn test_handle_debug_names_session() {
        let registry = registry();
        let (handle, _) = registry.create("ALICE", 2).unwrap();
        let printed = format!("{handle:?}");
        assert!(printed.contains("game-1"), "{printed}");
    }

    #[test]
    fn test_mutation_publishes_snapshot() {
        let registry = registry();
        let (handle, _) = registry.create("ALICE", 2).unwrap();
        let mut updates = handle.subscribe();

        registry.join(handle.id().as_str(), "BOB").unwrap();

        let update = updates.try_recv().unwrap();
        assert_eq!(update.players.len(), 2);
        assert_eq!(handle.snapshot().version, update.version);
    }

    #[test]
    fn test_failed_mutation_publishes_nothing() {
        let registry = registry();
        let (handle, _) = registry.create("ALICE", 2).unwrap();
        let mut updates = handle.subscribe();
        let version = handle.snapshot().version;

        let err = handle.mutate(|s| s.start()).unwrap_err();

        assert_eq!(err.kind(), crate::core::ErrorKind::NotEnoughPlayers);
        assert!(updates.try_recv().is_err());
        assert_eq!(handle.snapshot().version, version);
    }

    #[test]
    fn test_play_through_handle() {
        let registry = registry();
        let (handle, alice) = registry.create("ALICE", 2).unwrap();
        registry.join(handle.id().as_str(), "BOB").unwrap();
        handle.mutate(|s| s.start()).unwrap();

        let snapshot = handle.snapshot();
        let err = handle.mutate(|s| s.play(PlayerId::new(1), &PlayRequest::card(0))).unwrap_err();
        assert_eq!(err, GameError::NotYourTurn { current: alice });

        // The first player always has something playable or is told why not.
        if let Some(&index) = snapshot.view_for(Some(alice)).playable.first() {
            let request = match snapshot.hand(alice).unwrap().get(index).unwrap().kind() {
                crate::cards::CardKind::Wild => PlayRequest {
                    color: Some(crate::cards::Color::Red),
                    ..PlayRequest::card(index)
                },
                _ => PlayRequest::card(index),
            };
            handle.mutate(|s| s.play(alice, &request)).unwrap();
            assert_eq!(handle.snapshot().turn, 1);
        }
    }

    #[test]
    fn test_reap_finished_keeps_subscribed() {
        let registry = registry();
        let (handle, _) = registry.create("ALICE", 2).unwrap();
        registry.join(handle.id().as_str(), "BOB").unwrap();
        handle.mutate(|s| s.start()).unwrap();
        let watcher = handle.subscribe();

        handle.mutate(|s| s.disconnect(PlayerId::new(1))).unwrap();
        assert_eq!(handle.snapshot().state, SessionState::Finished);

        assert_eq!(registry.reap_finished(), 0);
        drop(watcher);
        assert_eq!(registry.reap_finished(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_seeded_registry_replays_deals() {
        let deal = || {
            let registry = registry();
            let (handle, _) = registry.create("ALICE", 2).unwrap();
            registry.join(handle.id().as_str(), "BOB").unwrap();
            handle.mutate(|s| s.start()).unwrap();
            handle.snapshot().hand(PlayerId::new(0)).cloned()
        };
        assert_eq!(deal(), deal());
    }
}
