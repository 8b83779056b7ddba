//! Line-protocol client for the task board server.
//!
//! [`Client::connect`] opens the TCP stream and performs the `CONNECT`
//! handshake. After that the client sends [`ClientCommand`]s and yields
//! decoded [`ServerEvent`]s. [`Client::into_split`] separates the two
//! directions so a caller can wait on events while sending.

use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use taskboard_proto::ServerEvent;
use taskboard_proto::command::{self, ClientCommand};
use taskboard_proto::event;
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};

/// Longest server line the client accepts, in bytes.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Timeout for establishing the TCP connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for the server's reply to `CONNECT`.
const LOGIN_TIMEOUT: Duration = Duration::from_secs(5);

type LineTransport = Framed<TcpStream, LinesCodec>;

/// Errors from talking to the server.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The TCP connection could not be established.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// Address that was attempted.
        addr: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Reading or writing the stream failed.
    #[error("connection error: {0}")]
    Io(#[from] LinesCodecError),

    /// The server refused the username.
    #[error("username rejected: {0}")]
    Rejected(String),

    /// The server closed the connection.
    #[error("connection closed by server")]
    Closed,

    /// The server answered `CONNECT` with something other than a verdict.
    #[error("unexpected reply from server: {0}")]
    UnexpectedReply(String),

    /// The server did not answer in time.
    #[error("timed out waiting for the server")]
    Timeout,

    /// A field contains a line break, which the protocol cannot carry.
    #[error("{0} must not contain a line break")]
    LineBreak(&'static str),
}

/// A connection to the task board server.
pub struct Client {
    writer: CommandWriter,
    events: EventReader,
}

impl Client {
    /// Opens a TCP connection without logging in.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Connect`] or [`ClientError::Timeout`].
    pub async fn open(addr: &str) -> Result<Self, ClientError> {
        let stream = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| {
                tracing::warn!(addr = %addr, "connect timed out");
                ClientError::Timeout
            })?
            .map_err(|source| ClientError::Connect {
                addr: addr.to_string(),
                source,
            })?;
        tracing::debug!(addr = %addr, "connected");

        let codec = LinesCodec::new_with_max_length(MAX_LINE_LENGTH);
        let (sink, lines) = Framed::new(stream, codec).split();
        Ok(Self {
            writer: CommandWriter { sink },
            events: EventReader { lines },
        })
    }

    /// Sends `CONNECT:<username>` and waits for the verdict.
    ///
    /// Returns the other users online at the time of joining. After a
    /// [`ClientError::Rejected`] the connection stays open and unauthenticated,
    /// so the caller may try another name.
    ///
    /// # Errors
    ///
    /// [`ClientError::Rejected`] if the name is blank or taken; transport
    /// errors otherwise.
    pub async fn login(&mut self, username: &str) -> Result<Vec<String>, ClientError> {
        self.writer
            .send(&ClientCommand::Connect {
                username: username.to_string(),
            })
            .await?;

        let reply = tokio::time::timeout(LOGIN_TIMEOUT, self.events.next_line())
            .await
            .map_err(|_| ClientError::Timeout)??
            .ok_or(ClientError::Closed)?;

        match event::decode(&reply) {
            Ok(ServerEvent::ConnectOk { users }) => {
                tracing::info!(username = %username, online = users.len(), "logged in");
                Ok(users)
            }
            Ok(ServerEvent::ConnectError { reason }) => {
                tracing::info!(username = %username, reason = %reason, "login rejected");
                Err(ClientError::Rejected(reason))
            }
            _ => Err(ClientError::UnexpectedReply(reply)),
        }
    }

    /// Opens a connection and logs in as `username`.
    ///
    /// # Errors
    ///
    /// See [`open`](Self::open) and [`login`](Self::login).
    pub async fn connect(addr: &str, username: &str) -> Result<(Self, Vec<String>), ClientError> {
        let mut client = Self::open(addr).await?;
        let users = client.login(username).await?;
        Ok((client, users))
    }

    /// Sends one command.
    ///
    /// # Errors
    ///
    /// [`ClientError::LineBreak`] for unencodable commands, transport
    /// errors otherwise.
    pub async fn send(&mut self, cmd: &ClientCommand) -> Result<(), ClientError> {
        self.writer.send(cmd).await
    }

    /// Waits for the next server event. `Ok(None)` means the server hung up.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] if the stream fails.
    pub async fn next_event(&mut self) -> Result<Option<ServerEvent>, ClientError> {
        self.events.next_event().await
    }

    /// Closes the connection.
    pub async fn close(self) {
        self.writer.close().await;
    }

    /// Splits into independently usable send and receive halves.
    #[must_use]
    pub fn into_split(self) -> (CommandWriter, EventReader) {
        (self.writer, self.events)
    }
}

/// Sending half of a [`Client`].
pub struct CommandWriter {
    sink: SplitSink<LineTransport, String>,
}

impl CommandWriter {
    /// Encodes and sends one command.
    ///
    /// # Errors
    ///
    /// [`ClientError::LineBreak`] if a text field contains `\n` or `\r`;
    /// [`ClientError::Io`] if the write fails.
    pub async fn send(&mut self, cmd: &ClientCommand) -> Result<(), ClientError> {
        check_single_line(cmd)?;
        let line = command::encode(cmd);
        tracing::debug!(line = %line, "sending");
        self.sink.send(line).await?;
        Ok(())
    }

    /// Flushes and shuts down the write side.
    pub async fn close(mut self) {
        if let Err(e) = self.sink.close().await {
            tracing::debug!(error = %e, "error while closing connection");
        }
    }
}

/// Receiving half of a [`Client`].
pub struct EventReader {
    lines: SplitStream<LineTransport>,
}

impl EventReader {
    /// Waits for the next decodable server event.
    ///
    /// Lines that do not decode are logged and skipped. Cancel safe.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] if the stream fails.
    pub async fn next_event(&mut self) -> Result<Option<ServerEvent>, ClientError> {
        while let Some(line) = self.next_line().await? {
            match event::decode(&line) {
                Ok(event) => return Ok(Some(event)),
                Err(e) => tracing::warn!(error = %e, line = %line, "skipping unreadable server line"),
            }
        }
        Ok(None)
    }

    async fn next_line(&mut self) -> Result<Option<String>, ClientError> {
        match self.lines.next().await {
            Some(Ok(line)) => {
                tracing::debug!(line = %line, "received");
                Ok(Some(line))
            }
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }
}

/// Rejects commands whose text would split into several protocol lines.
fn check_single_line(cmd: &ClientCommand) -> Result<(), ClientError> {
    let (field, text) = match cmd {
        ClientCommand::Connect { username } => ("username", username.as_str()),
        ClientCommand::Add { description } | ClientCommand::Update { description, .. } => {
            ("description", description.as_str())
        }
        ClientCommand::Delete { .. } => return Ok(()),
    };
    if text.contains(['\n', '\r']) {
        return Err(ClientError::LineBreak(field));
    }
    Ok(())
}
