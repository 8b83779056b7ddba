//! TCP listener and per-connection I/O.
//!
//! Every accepted connection gets its own tokio task. Inbound bytes are
//! split on `\n` with [`AnyDelimiterCodec`], decoded leniently (invalid
//! UTF-8 becomes U+FFFD) and fed to a [`Session`]; outbound
//! lines flow through the session's unbounded channel into a dedicated
//! writer task. When either half stops, the session is closed and the
//! other half is torn down.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::{AnyDelimiterCodec, Framed};

use crate::session::Session;
use crate::state::BoardState;

/// Pause after a failed `accept` before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Listener-level failures. These are fatal: the server does not serve.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Could not bind the listening socket.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was attempted.
        addr: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Bound, but the local address could not be read back.
    #[error("failed to read listener address: {0}")]
    LocalAddr(#[source] std::io::Error),
}

/// Binds `addr` and serves connections against `state` in a spawned task.
///
/// Returns the bound address (useful with port 0) and the handle of the
/// accept loop. Aborting the handle stops accepting; connections already
/// accepted keep running until their peers leave.
///
/// # Errors
///
/// Returns [`ServerError`] if the listener cannot be set up.
pub async fn start_server(
    addr: &str,
    state: Arc<BoardState>,
) -> Result<(SocketAddr, JoinHandle<()>), ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    let bound_addr = listener.local_addr().map_err(ServerError::LocalAddr)?;

    let handle = tokio::spawn(accept_loop(listener, state));
    Ok((bound_addr, handle))
}

/// Starts a server with fresh state on `127.0.0.1:0` for testing.
#[cfg(test)]
pub async fn start_test_server() -> (SocketAddr, Arc<BoardState>, JoinHandle<()>) {
    let state = Arc::new(BoardState::new());
    let (addr, handle) = start_server("127.0.0.1:0", Arc::clone(&state))
        .await
        .expect("failed to start test server");
    (addr, state, handle)
}

async fn accept_loop(listener: TcpListener, state: Arc<BoardState>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                tokio::spawn(handle_connection(stream, peer, Arc::clone(&state)));
            }
            Err(e) => {
                // Usually fd exhaustion; existing sessions are unaffected.
                tracing::warn!(error = %e, "accept failed");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}

/// Drives one client connection from accept to close.
pub async fn handle_connection(stream: TcpStream, peer: SocketAddr, state: Arc<BoardState>) {
    let id = state.sessions.next_id();
    tracing::info!(session_id = %id, peer = %peer, "session accepted");

    let codec = AnyDelimiterCodec::new_with_max_length(
        b"\n".to_vec(),
        b"\n".to_vec(),
        state.max_line_length(),
    );
    let (mut sink, mut lines) = Framed::new(stream, codec).split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let mut session = Session::new(id, Arc::clone(&state), tx);

    let mut write_task = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if let Err(e) = sink.send(line).await {
                tracing::warn!(session_id = %id, error = %e, "write failed");
                break;
            }
        }
    });

    loop {
        tokio::select! {
            next = lines.next() => match next {
                Some(Ok(chunk)) => session.handle_line(&decode_line(&chunk)),
                Some(Err(e)) => {
                    tracing::warn!(session_id = %id, error = %e, "read failed");
                    break;
                }
                None => {
                    tracing::debug!(session_id = %id, "peer closed connection");
                    break;
                }
            },
            _ = &mut write_task => break,
        }
    }

    session.close();
    write_task.abort();
    tracing::info!(session_id = %id, peer = %peer, "session ended");
}

/// Turns one raw frame into a line, dropping a trailing `\r` and replacing
/// bytes that are not valid UTF-8.
fn decode_line(chunk: &[u8]) -> String {
    let chunk = chunk.strip_suffix(b"\r").unwrap_or(chunk);
    String::from_utf8_lossy(chunk).into_owned()
}
