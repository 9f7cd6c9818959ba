//! TCP line transport.
//!
//! Each connection runs in its own task: command lines go through the
//! shared `Dispatcher`, responses and session updates are written back as
//! JSON lines. Updates come from the session's broadcast channel, so a
//! slow connection only ever delays itself.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::protocol::{ClientContext, Dispatcher, Response};
use crate::session::{SessionRegistry, SessionSnapshot};

/// Transport failures. Kept apart from `GameError`: these never reach a
/// client as an `errorKind`.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connection I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

type Updates = Option<broadcast::Receiver<Arc<SessionSnapshot>>>;

/// A bound listener serving the text protocol.
pub struct Server {
    listener: TcpListener,
    dispatcher: Dispatcher,
}

impl Server {
    /// Bind `addr` (`host:port`; port 0 picks a free one).
    pub async fn bind(addr: &str, registry: Arc<SessionRegistry>) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await.map_err(|source| TransportError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        Ok(Self {
            listener,
            dispatcher: Dispatcher::new(registry),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.listener.local_addr()?)
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Accept connections forever.
    pub async fn run(self) -> Result<(), TransportError> {
        self.run_until(std::future::pending()).await
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Connections already accepted keep running in their own tasks.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<(), TransportError> {
        let addr = self.local_addr()?;
        info!(%addr, "listening");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("listener shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            warn!(error = %e, "accept failed");
                            continue;
                        }
                    };
                    let dispatcher = self.dispatcher.clone();
                    tokio::spawn(async move {
                        info!(%peer, "client connected");
                        match serve_connection(stream, dispatcher).await {
                            Ok(()) => info!(%peer, "client disconnected"),
                            Err(e) => warn!(%peer, error = %e, "connection closed with error"),
                        }
                    });
                }
            }
        }
    }
}

/// Serve one client until it hangs up.
///
/// Whatever way the connection ends, its seat is given up so the session
/// can continue (or finish) without it.
pub async fn serve_connection(stream: TcpStream, dispatcher: Dispatcher) -> Result<(), TransportError> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    let mut ctx = ClientContext::new();
    let mut updates: Updates = None;

    let result = loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break Ok(()),
                    Err(e) => break Err(e.into()),
                };
                if line.trim().is_empty() {
                    continue;
                }

                let response = dispatcher.dispatch(&mut ctx, &line);
                if let Some(fresh) = ctx.take_updates() {
                    updates = Some(fresh);
                }
                if !ctx.is_seated() && updates.take().is_some() {
                    // LEAVE: this receiver may have been the last one.
                    dispatcher.registry().reap_finished();
                }
                if let Err(e) = write_response(&mut writer, &response).await {
                    break Err(e);
                }
            }
            update = next_update(&mut updates) => {
                let Some(snapshot) = update else {
                    updates = None;
                    continue;
                };
                let response = Response::Update {
                    snapshot: snapshot.view_for(ctx.player()),
                };
                if let Err(e) = write_response(&mut writer, &response).await {
                    break Err(e);
                }
            }
        }
    };

    drop(updates);
    dispatcher.disconnect(&mut ctx);
    result
}

/// Next snapshot for this connection; pending forever when not subscribed.
async fn next_update(updates: &mut Updates) -> Option<Arc<SessionSnapshot>> {
    let Some(rx) = updates.as_mut() else {
        return std::future::pending().await;
    };
    loop {
        match rx.recv().await {
            Ok(snapshot) => return Some(snapshot),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "connection lagging, dropped stale updates");
            }
            Err(RecvError::Closed) => {
                debug!("session closed its update channel");
                return None;
            }
        }
    }
}

async fn write_response(writer: &mut OwnedWriteHalf, response: &Response) -> Result<(), TransportError> {
    let mut line = response.to_line()?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    Ok(())
}
