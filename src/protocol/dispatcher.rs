//! Routes parsed commands to the session registry.
//!
//! The dispatcher is transport-agnostic: a connection hands it one line
//! plus its `ClientContext` and writes back the returned `Response`.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::core::{GameError, PlayerId};
use crate::session::{GameId, SessionHandle, SessionRegistry, SessionSnapshot, SessionState};

use super::command::Command;
use super::response::{Outcome, Response};

/// The seat a connection holds.
#[derive(Clone)]
struct Seat {
    handle: Arc<SessionHandle>,
    player: PlayerId,
}

/// Per-connection state.
#[derive(Default)]
pub struct ClientContext {
    seat: Option<Seat>,
    /// Subscription opened by the last CREATE or JOIN, not yet collected.
    pending_updates: Option<broadcast::Receiver<Arc<SessionSnapshot>>>,
}

impl ClientContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn game_id(&self) -> Option<&GameId> {
        self.seat.as_ref().map(|s| s.handle.id())
    }

    #[must_use]
    pub fn player(&self) -> Option<PlayerId> {
        self.seat.as_ref().map(|s| s.player)
    }

    #[must_use]
    pub fn is_seated(&self) -> bool {
        self.seat.is_some()
    }

    /// Update subscription for a newly taken seat.
    ///
    /// It was opened before the seat was taken, so it sees every update
    /// from that mutation on.
    pub fn take_updates(&mut self) -> Option<broadcast::Receiver<Arc<SessionSnapshot>>> {
        self.pending_updates.take()
    }

    fn seat(&self) -> Result<&Seat, GameError> {
        self.seat.as_ref().ok_or(GameError::NotInGame)
    }

    /// Fails while the connection holds a seat in a live game.
    fn ensure_free(&self) -> Result<(), GameError> {
        match &self.seat {
            Some(seat) if seat.handle.snapshot().state != SessionState::Finished => {
                Err(GameError::AlreadyInGame(seat.handle.id().to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// Executes commands against a shared registry.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<SessionRegistry>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Parse and execute one command line.
    pub fn dispatch(&self, ctx: &mut ClientContext, line: &str) -> Response {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                debug!(%line, error = %err, "rejected command line");
                return Response::error(&err);
            }
        };
        let verb = command.verb();
        match self.execute(ctx, command) {
            Ok(response) => response,
            Err(err) => {
                debug!(
                    verb,
                    game = ?ctx.game_id().map(GameId::as_str),
                    player = ?ctx.player(),
                    error = %err,
                    "command rejected"
                );
                Response::error(&err)
            }
        }
    }

    /// Execute a parsed command.
    pub fn execute(&self, ctx: &mut ClientContext, command: Command) -> Result<Response, GameError> {
        match command {
            Command::Create { name, max_players } => {
                ctx.ensure_free()?;
                let (handle, player) = self.registry.create(&name, max_players)?;
                ctx.pending_updates = Some(handle.subscribe());
                let game_id = handle.id().clone();
                ctx.seat = Some(Seat { handle, player });
                Ok(Response::Created {
                    game_id,
                    player_id: player,
                })
            }
            Command::Join { game_id, name } => {
                ctx.ensure_free()?;
                let handle = self.registry.get(&game_id)?;
                let updates = handle.subscribe();
                let player = handle.mutate(|session| session.join(name))?;
                ctx.pending_updates = Some(updates);
                let game_id = handle.id().clone();
                ctx.seat = Some(Seat { handle, player });
                Ok(Response::Joined {
                    game_id,
                    player_id: player,
                })
            }
            Command::Start => {
                let seat = ctx.seat()?;
                seat.handle.mutate(|session| {
                    if !session.players().get(seat.player)?.is_active() {
                        return Err(GameError::PlayerDisconnected(seat.player));
                    }
                    session.start()
                })?;
                Ok(Response::Started {
                    game_id: seat.handle.id().clone(),
                })
            }
            Command::Play(request) => {
                let seat = ctx.seat()?;
                let outcome = seat.handle.mutate(|session| session.play(seat.player, &request))?;
                Ok(Response::Played {
                    play: outcome.record,
                    finished: outcome.result.map(Outcome::from),
                })
            }
            Command::Draw => {
                let seat = ctx.seat()?;
                let draw = seat.handle.mutate(|session| session.draw(seat.player))?;
                Ok(Response::Drew { draw })
            }
            Command::State { game_id: None } => {
                let seat = ctx.seat()?;
                Ok(Response::State {
                    snapshot: seat.handle.snapshot().view_for(Some(seat.player)),
                })
            }
            Command::State { game_id: Some(id) } => {
                let handle = self.registry.get(&id)?;
                let viewer = ctx
                    .seat
                    .as_ref()
                    .filter(|seat| seat.handle.id() == handle.id())
                    .map(|seat| seat.player);
                Ok(Response::State {
                    snapshot: handle.snapshot().view_for(viewer),
                })
            }
            Command::Leave => {
                let seat = ctx.seat.take().ok_or(GameError::NotInGame)?;
                ctx.pending_updates = None;
                seat.handle.mutate(|session| session.disconnect(seat.player))?;
                self.registry.reap_finished();
                Ok(Response::Left {
                    game_id: seat.handle.id().clone(),
                })
            }
        }
    }

    /// The connection is gone: give up its seat.
    pub fn disconnect(&self, ctx: &mut ClientContext) {
        ctx.pending_updates = None;
        let Some(seat) = ctx.seat.take() else {
            return;
        };
        if let Err(err) = seat.handle.mutate(|session| session.disconnect(seat.player)) {
            warn!(game = %seat.handle.id(), player = %seat.player, error = %err, "disconnect failed");
        }
        drop(seat);
        self.registry.reap_finished();
    }
}
