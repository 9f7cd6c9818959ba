//! # bunnyhop
//!
//! Authoritative session engine for the BunnyHop card game, served over a
//! line-oriented text protocol.
//!
//! ## Design Principles
//!
//! 1. **Validate, then mutate**: every rejected command is a no-op. The
//!    rules engine resolves a play against a read-only view of the session
//!    and only a fully resolved play is applied.
//!
//! 2. **Per-session ownership**: each game is an independent `Session`
//!    behind its own lock. Nothing is shared between sessions.
//!
//! 3. **Reproducible deals**: shuffles use a seeded ChaCha8 `GameRng`, so a
//!    seed replays a whole game.
//!
//! ## Architecture
//!
//! - **Snapshots**: after every mutation the session publishes an immutable
//!   `SessionSnapshot`. STATE reads the latest one without waiting on the
//!   session lock; connections receive them through a broadcast channel.
//!
//! - **Persistent Data Structures**: deck piles and play history use `im`
//!   vectors, so snapshots and clones stay cheap.
//!
//! ## Modules
//!
//! - `core`: Player ids, RNG, rule configuration, errors
//! - `cards`: Cards, the standard deck, draw and discard piles
//! - `players`: Seats, hands and status flags
//! - `turns`: Turn order, direction, skips and blocks
//! - `rules`: `RulesEngine` trait and the BunnyHop rule set
//! - `session`: Session state machine, snapshots, the session registry
//! - `protocol`: Command parsing, responses, dispatch
//! - `server`: Configuration and the TCP transport

pub mod cards;
pub mod core;
pub mod players;
pub mod protocol;
pub mod rules;
pub mod server;
pub mod session;
pub mod turns;

// Re-export commonly used types
pub use crate::core::{ErrorKind, GameConfig, GameError, GameRng, GameRngState, PlayerId, WIN_THRESHOLD};

pub use crate::cards::{standard_deck, Card, CardId, CardKind, Color, Deck};

pub use crate::players::{Hand, Player, PlayerRegistry};

pub use crate::turns::{Direction, TurnChange, TurnEngine};

pub use crate::rules::{BunnyHopRules, Effect, GameResult, PlayRequest, ResolvedPlay, RulesEngine, WildBias, WinReason};

pub use crate::session::{
    ClientView, GameId, PlayOutcome, PlayRecord, Session, SessionBuilder, SessionHandle, SessionRegistry,
    SessionSnapshot, SessionState,
};

pub use crate::protocol::{ClientContext, Command, Dispatcher, Response};

pub use crate::server::{Server, ServerConfig, TransportError};
