//! The authoritative session state machine.
//!
//! ```text
//! WAITING --START--> IN_PROGRESS --PLAY(win)--> FINISHED
//!    |                    |
//!    +----disconnect -----+-----(≤ 1 active left)----> FINISHED
//! ```
//!
//! `Session` owns the deck, the player registry and the turn engine, and
//! consults the rules engine for every play. All methods validate first
//! and mutate second: a method that returns `Err` has changed nothing.

use im::Vector;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cards::{standard_deck, Card, Deck};
use crate::core::{GameConfig, GameError, GameRng, PlayerId};
use crate::players::PlayerRegistry;
use crate::rules::{
    BunnyHopRules, Effect, GameResult, MatchTarget, PlayRequest, ResolvedPlay, RuleContext, RulesEngine, WildBias,
    WinReason,
};
use crate::turns::{Direction, ReverseOutcome, TurnChange, TurnEngine};

use super::snapshot::SessionSnapshot;

/// Lifecycle state of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// Accepting joins.
    Waiting,
    /// Accepting plays from the current player.
    InProgress,
    /// Terminal; only snapshots are served.
    Finished,
}

/// Game identifier, unique within one registry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The n-th id handed out by a registry: `game-<n>`.
    #[must_use]
    pub fn sequential(n: u64) -> Self {
        Self(format!("game-{n}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One completed play, kept in the session history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayRecord {
    /// Play counter, starting at 1.
    pub turn: u32,
    #[serde(flatten)]
    pub play: ResolvedPlay,
    /// Where the turn went afterwards. `None` when the play ended the game.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_change: Option<TurnChange>,
}

/// Result of a successful PLAY.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayOutcome {
    pub record: PlayRecord,
    /// Set when this play ended the game.
    pub result: Option<GameResult>,
}

/// Result of a successful DRAW.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawOutcome {
    pub player: PlayerId,
    /// `None` when every card was already in someone's hand.
    pub card: Option<Card>,
    pub turn_change: TurnChange,
}

/// Builder for creating a `Session`.
pub struct SessionBuilder {
    id: GameId,
    config: GameConfig,
    seed: Option<u64>,
    deck: Option<Vec<Card>>,
}

impl SessionBuilder {
    pub fn new(id: GameId) -> Self {
        Self {
            id,
            config: GameConfig::default(),
            seed: None,
            deck: None,
        }
    }

    pub fn config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    /// Seed for this session's shuffles. Overrides `config.seed`.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Use a stacked deck, dealt from the end of `cards` and never shuffled.
    pub fn deck(mut self, cards: Vec<Card>) -> Self {
        self.deck = Some(cards);
        self
    }

    pub fn build(self) -> Session {
        let rng = match self.seed.or(self.config.seed) {
            Some(seed) => GameRng::new(seed),
            None => GameRng::from_clock(),
        };
        let shuffle_on_start = self.deck.is_none();
        let cards = self
            .deck
            .unwrap_or_else(|| standard_deck(self.config.finish_reach));

        Session {
            id: self.id,
            rules: BunnyHopRules::new(self.config.clone()),
            players: PlayerRegistry::new(self.config.max_players),
            config: self.config,
            state: SessionState::Waiting,
            turns: TurnEngine::new(PlayerId::new(0)),
            deck: Deck::new(cards),
            wild_bias: None,
            rng,
            shuffle_on_start,
            result: None,
            turn: 0,
            version: 0,
            history: Vector::new(),
        }
    }
}

/// One game instance.
pub struct Session {
    id: GameId,
    config: GameConfig,
    rules: BunnyHopRules,
    state: SessionState,
    pub(crate) players: PlayerRegistry,
    turns: TurnEngine,
    deck: Deck,
    /// Declaration made by the wild currently on top, if any.
    wild_bias: Option<WildBias>,
    rng: GameRng,
    shuffle_on_start: bool,
    result: Option<GameResult>,
    turn: u32,
    /// Bumped on every successful mutation.
    version: u64,
    history: Vector<PlayRecord>,
}

impl Session {
    /// Create a waiting session with the standard deck.
    #[must_use]
    pub fn new(id: GameId, config: GameConfig) -> Self {
        SessionBuilder::new(id).config(config).build()
    }

    // === Accessors ===

    #[must_use]
    pub fn id(&self) -> &GameId {
        &self.id
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn rules(&self) -> &BunnyHopRules {
        &self.rules
    }

    #[must_use]
    pub fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    #[must_use]
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Player whose turn it is. `None` unless the game is in progress.
    #[must_use]
    pub fn current_player(&self) -> Option<PlayerId> {
        (self.state == SessionState::InProgress).then(|| self.turns.current())
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.turns.direction()
    }

    #[must_use]
    pub fn top_card(&self) -> Option<&Card> {
        self.deck.top_card()
    }

    #[must_use]
    pub fn wild_bias(&self) -> Option<WildBias> {
        self.wild_bias
    }

    #[must_use]
    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    /// Completed plays so far.
    #[must_use]
    pub fn turn_number(&self) -> u32 {
        self.turn
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn history(&self) -> &Vector<PlayRecord> {
        &self.history
    }

    /// Cards in hands, draw pile and discard pile together.
    #[must_use]
    pub fn cards_in_circulation(&self) -> usize {
        self.players.cards_in_hands() + self.deck.len()
    }

    /// What the next card has to match.
    #[must_use]
    pub fn match_target(&self) -> MatchTarget {
        MatchTarget::from_top(self.deck.top_card(), self.wild_bias)
    }

    /// Hand indices `player` may play right now.
    #[must_use]
    pub fn playable_indices(&self, player: PlayerId) -> Vec<usize> {
        if self.state != SessionState::InProgress {
            return Vec::new();
        }
        self.rules.playable_indices(&self.rule_context(), player)
    }

    /// Point-in-time copy of the whole session, hands included.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(self)
    }

    // === Commands ===

    /// Seat a new player. Only while waiting.
    pub fn join(&mut self, name: impl Into<String>) -> Result<PlayerId, GameError> {
        let name = name.into();
        let id = self.players.register(name.clone(), self.state)?;
        self.version += 1;
        info!(game = %self.id, player = %id, %name, "player joined");
        Ok(id)
    }

    /// Shuffle, deal hands, turn up the first card and begin.
    pub fn start(&mut self) -> Result<(), GameError> {
        match self.state {
            SessionState::Waiting => {}
            SessionState::InProgress => return Err(GameError::AlreadyStarted),
            SessionState::Finished => return Err(GameError::GameFinished),
        }
        let seats: Vec<PlayerId> = self.players.active_ids().collect();
        let first = match seats.first() {
            Some(&first) if seats.len() >= self.config.min_players => first,
            _ => {
                return Err(GameError::NotEnoughPlayers {
                    needed: self.config.min_players.max(1),
                    have: seats.len(),
                })
            }
        };

        if self.shuffle_on_start {
            self.deck.shuffle(&mut self.rng);
        }

        let hand_size = self.config.hand_size;
        for &seat in &seats {
            let dealt = self.deck.deal_recovering(hand_size, &mut self.rng);
            self.players.get_mut(seat)?.hand.extend(dealt);
        }
        if let Some(&first_card) = self.deck.deal_recovering(1, &mut self.rng).first() {
            self.deck.discard(first_card);
        }

        self.turns = TurnEngine::new(first);
        self.state = SessionState::InProgress;
        self.version += 1;
        info!(
            game = %self.id,
            players = seats.len(),
            top = ?self.deck.top_card().map(ToString::to_string),
            rng = ?self.rng.state(),
            "game started"
        );
        Ok(())
    }

    /// Play a card from `player`'s hand.
    pub fn play(&mut self, player: PlayerId, request: &PlayRequest) -> Result<PlayOutcome, GameError> {
        self.ensure_can_act(player)?;
        let resolved = self.rules.resolve(&self.rule_context(), player, request)?;
        Ok(self.apply(resolved))
    }

    /// Draw one card and pass the turn.
    ///
    /// Only allowed when nothing in the player's hand can be played.
    pub fn draw(&mut self, player: PlayerId) -> Result<DrawOutcome, GameError> {
        self.ensure_can_act(player)?;
        let current = self.turns.current();
        if current != player {
            return Err(GameError::NotYourTurn { current });
        }
        if !self.playable_indices(player).is_empty() {
            return Err(GameError::invalid("a card in hand can be played"));
        }

        let drawn = self.deck.deal_recovering(1, &mut self.rng).first().copied();
        if let Some(card) = drawn {
            self.players.get_mut(player)?.hand.push(card);
        }
        let turn_change = self.turns.end_turn(&mut self.players);
        self.version += 1;
        debug!(game = %self.id, %player, drew = drawn.is_some(), next = %turn_change.to, "drew instead of playing");

        Ok(DrawOutcome {
            player,
            card: drawn,
            turn_change,
        })
    }

    /// Take `player` out of the game.
    ///
    /// Leaving twice is harmless. Returns the turn change when the player
    /// held the turn. A finished game keeps its final standings.
    pub fn disconnect(&mut self, player: PlayerId) -> Result<Option<TurnChange>, GameError> {
        if self.state == SessionState::Finished {
            self.players.get(player)?;
            return Ok(None);
        }
        let seated = self.players.len();
        let leaving = self.players.get_mut(player)?;
        if !leaving.is_active {
            return Ok(None);
        }
        leaving.is_active = false;
        leaving.is_blocked = false;
        self.version += 1;
        info!(game = %self.id, %player, "player disconnected");

        let remaining = self.players.active_count();
        if remaining == 0 || (seated >= 2 && remaining <= 1) {
            let result = match self.players.active_ids().next() {
                Some(last) => GameResult::Winner {
                    player: last,
                    reason: WinReason::Forfeit,
                },
                None => GameResult::NoWinner,
            };
            self.finish(result);
            return Ok(None);
        }

        if self.state == SessionState::InProgress && self.turns.current() == player {
            let change = self.turns.end_turn(&mut self.players);
            debug!(game = %self.id, from = %change.from, to = %change.to, "turn passed after disconnect");
            return Ok(Some(change));
        }
        Ok(None)
    }

    // === Internals ===

    fn ensure_can_act(&self, player: PlayerId) -> Result<(), GameError> {
        match self.state {
            SessionState::Waiting => return Err(GameError::NotStarted),
            SessionState::Finished => return Err(GameError::GameFinished),
            SessionState::InProgress => {}
        }
        if !self.players.get(player)?.is_active() {
            return Err(GameError::PlayerDisconnected(player));
        }
        Ok(())
    }

    fn rule_context(&self) -> RuleContext<'_> {
        RuleContext {
            players: &self.players,
            turns: &self.turns,
            top: self.match_target(),
        }
    }

    /// Apply a play that already passed `resolve`.
    fn apply(&mut self, play: ResolvedPlay) -> PlayOutcome {
        let actor = play.player;

        if let Ok(p) = self.players.get_mut(actor) {
            p.hand.take(play.card_index);
        }
        self.deck.discard(play.card);
        self.wild_bias = match play.effect {
            Effect::Wild { bias } => Some(bias),
            _ => None,
        };

        match play.effect {
            Effect::Hop { spaces, doubled } => {
                if let Ok(p) = self.players.get_mut(actor) {
                    p.advance(spaces);
                    if doubled {
                        p.has_double = false;
                    }
                }
            }
            Effect::Double => {
                if let Ok(p) = self.players.get_mut(actor) {
                    p.has_double = true;
                }
            }
            Effect::Block { target } => {
                // Target was checked by the rules.
                let _ = self.turns.apply_block(&mut self.players, target);
            }
            Effect::Finish => {
                let threshold = self.config.win_threshold;
                if let Ok(p) = self.players.get_mut(actor) {
                    p.position = p.position.max(threshold);
                }
            }
            Effect::Skip | Effect::Reverse | Effect::Wild { .. } => {}
        }

        let replacement = self.deck.deal_recovering(1, &mut self.rng);
        if let Ok(p) = self.players.get_mut(actor) {
            p.hand.extend(replacement);
        }

        self.turn += 1;
        self.version += 1;

        let result = match play.effect {
            Effect::Hop { .. } | Effect::Finish => self.rules.winner(&self.players).map(|winner| {
                let reason = match play.effect {
                    Effect::Finish if winner == actor => WinReason::Finish,
                    _ => WinReason::Reached,
                };
                GameResult::Winner { player: winner, reason }
            }),
            _ => None,
        };

        let turn_change = match result {
            Some(result) => {
                self.finish(result);
                None
            }
            None => Some(match play.effect {
                Effect::Skip => self.turns.skip_next(&mut self.players),
                Effect::Reverse => match self.turns.reverse(&self.players) {
                    ReverseOutcome::ActsAsSkip => self.turns.skip_next(&mut self.players),
                    ReverseOutcome::Flipped => self.turns.end_turn(&mut self.players),
                },
                _ => self.turns.end_turn(&mut self.players),
            }),
        };

        debug!(
            game = %self.id,
            player = %actor,
            card = %play.card,
            effect = ?play.effect,
            next = ?turn_change.as_ref().map(|c| c.to),
            "card played"
        );

        let record = PlayRecord {
            turn: self.turn,
            play,
            turn_change,
        };
        self.history.push_back(record.clone());
        PlayOutcome { record, result }
    }

    fn finish(&mut self, result: GameResult) {
        self.state = SessionState::Finished;
        self.result = Some(result);
        self.version += 1;
        match result {
            GameResult::Winner { player, reason } => {
                info!(game = %self.id, winner = %player, ?reason, "game finished");
            }
            GameResult::NoWinner => info!(game = %self.id, "game finished without a winner"),
        }
    }
}
