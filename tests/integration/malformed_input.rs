//! Raw-socket tests: bad input never closes a connection or leaks out.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use taskboard_server::server;
use taskboard_server::state::BoardState;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::task::JoinHandle;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

async fn start() -> (String, Arc<BoardState>, JoinHandle<()>) {
    let state = Arc::new(BoardState::new());
    let (addr, handle) = server::start_server("127.0.0.1:0", Arc::clone(&state))
        .await
        .expect("failed to start server");
    (addr.to_string(), state, handle)
}

struct RawPeer {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl RawPeer {
    async fn open(addr: &str) -> Self {
        let (read, writer) = TcpStream::connect(addr).await.unwrap().into_split();
        Self {
            lines: BufReader::new(read).lines(),
            writer,
        }
    }

    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .unwrap();
    }

    async fn recv(&mut self) -> String {
        timeout(WAIT, self.lines.next_line())
            .await
            .expect("timed out waiting for a line")
            .unwrap()
            .expect("server closed the connection")
    }
}

#[tokio::test]
async fn malformed_lines_are_dropped_and_connection_survives() {
    let (addr, state, handle) = start().await;
    let mut alice = RawPeer::open(&addr).await;
    alice.send("CONNECT:alice").await;
    assert_eq!(alice.recv().await, "CONNECT_OK:");

    for line in [
        "",
        "   ",
        "HELLO",
        "FROB:1:2",
        "ADD",
        "ADD:",
        "ADD:  ",
        "UPDATE",
        "UPDATE:1",
        "UPDATE:abc:desc:true",
        "UPDATE:1:true",
        "DELETE",
        "DELETE:",
        "DELETE:one",
        "DELETE:-1",
        "CONNECT:mallory",
    ] {
        alice.send(line).await;
    }

    alice.send("ADD:after the noise").await;
    assert_eq!(alice.recv().await, "ADD:1:after the noise:false:alice");
    assert_eq!(state.tasks.len(), 1);
    assert_eq!(state.users.list_active(), vec!["alice"]);
    handle.abort();
}

#[tokio::test]
async fn invalid_utf8_is_replaced_not_fatal() {
    let (addr, state, handle) = start().await;
    let mut alice = RawPeer::open(&addr).await;
    alice.send("CONNECT:alice").await;
    alice.recv().await;

    alice.writer.write_all(b"\xff\xfe\n").await.unwrap();
    alice.writer.write_all(b"ADD:na\xefve\r\n").await.unwrap();
    assert_eq!(alice.recv().await, "ADD:1:na\u{FFFD}ve:false:alice");

    alice.send("ADD:plain").await;
    assert_eq!(alice.recv().await, "ADD:2:plain:false:alice");
    assert_eq!(state.users.list_active(), vec!["alice"]);
    handle.abort();
}

#[tokio::test]
async fn commands_before_connect_are_ignored() {
    let (addr, state, handle) = start().await;
    let mut peer = RawPeer::open(&addr).await;
    peer.send("ADD:sneaky").await;
    peer.send("UPDATE:1:sneaky:true").await;
    peer.send("DELETE:1").await;
    peer.send("CONNECT:carol").await;
    assert_eq!(peer.recv().await, "CONNECT_OK:");

    peer.send("ADD:legit").await;
    assert_eq!(peer.recv().await, "ADD:1:legit:false:carol");
    assert_eq!(state.tasks.len(), 1);
    handle.abort();
}

#[tokio::test]
async fn lenient_flags_and_padded_ids() {
    let (addr, _state, handle) = start().await;
    let mut peer = RawPeer::open(&addr).await;
    peer.send("CONNECT:dan").await;
    peer.recv().await;
    peer.send("ADD:water plants").await;
    peer.recv().await;

    peer.send("UPDATE: 1 :water plants:TRUE").await;
    assert_eq!(peer.recv().await, "UPDATE:1:water plants:true:dan");
    peer.send("UPDATE:1:water plants:yes").await;
    assert_eq!(peer.recv().await, "UPDATE:1:water plants:false:dan");
    peer.send("DELETE: 1").await;
    assert_eq!(peer.recv().await, "DELETE:1");
    handle.abort();
}

#[tokio::test]
async fn unterminated_last_line_counts_and_peers_carry_on() {
    let (addr, _state, handle) = start().await;
    let mut bob = RawPeer::open(&addr).await;
    bob.send("CONNECT:bob").await;
    bob.recv().await;

    let mut eve = RawPeer::open(&addr).await;
    eve.send("CONNECT:eve").await;
    eve.recv().await;
    assert_eq!(bob.recv().await, "USER_JOINED:eve");

    // No trailing newline: the line still ends at end of stream.
    eve.writer.write_all(b"ADD:last words").await.unwrap();
    drop(eve);
    assert_eq!(bob.recv().await, "ADD:1:last words:false:eve");
    assert_eq!(bob.recv().await, "USER_LEFT:eve");

    bob.send("ADD:still fine").await;
    assert_eq!(bob.recv().await, "ADD:2:still fine:false:bob");
    handle.abort();
}
