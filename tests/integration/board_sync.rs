//! End-to-end task synchronisation over real TCP.
//!
//! Starts an in-process server on an OS-assigned port and drives it with
//! the `taskboard` client library.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use taskboard::Client;
use taskboard_proto::board::Board;
use taskboard_proto::{ClientCommand, ServerEvent, TaskId, TaskRecord};
use taskboard_server::server;
use taskboard_server::state::BoardState;
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

async fn join(addr: &str, name: &str) -> Client {
    let (client, _) = Client::connect(addr, name).await.expect("login failed");
    client
}

async fn recv(client: &mut Client) -> ServerEvent {
    timeout(WAIT, client.next_event())
        .await
        .expect("timed out waiting for an event")
        .expect("connection error")
        .expect("server closed the connection")
}

fn task(id: u64, description: &str, completed: bool, by: &str) -> TaskRecord {
    TaskRecord::new(TaskId::new(id), description, completed, by)
}

fn add(description: &str) -> ClientCommand {
    ClientCommand::Add {
        description: description.to_string(),
    }
}

#[tokio::test]
async fn add_then_update_reaches_every_client() {
    let (addr, state, handle) = start().await;
    let mut alice = join(&addr, "alice").await;
    let mut bob = join(&addr, "bob").await;
    assert_eq!(
        recv(&mut alice).await,
        ServerEvent::UserJoined {
            username: "bob".into()
        }
    );

    alice.send(&add("Buy milk")).await.unwrap();
    let added = ServerEvent::TaskAdded(task(1, "Buy milk", false, "alice"));
    assert_eq!(recv(&mut alice).await, added);
    assert_eq!(recv(&mut bob).await, added);

    bob.send(&ClientCommand::Update {
        id: TaskId::new(1),
        description: "Buy milk and eggs".into(),
        completed: true,
    })
    .await
    .unwrap();
    let updated = ServerEvent::TaskUpdated(task(1, "Buy milk and eggs", true, "bob"));
    assert_eq!(recv(&mut alice).await, updated);
    assert_eq!(recv(&mut bob).await, updated);

    let stored = state.tasks.get_task(TaskId::new(1)).unwrap();
    assert_eq!(stored.description, "Buy milk and eggs");
    assert!(stored.completed);
    assert_eq!(stored.last_modified_by, "bob");
    handle.abort();
}

#[tokio::test]
async fn late_joiner_receives_existing_tasks_in_id_order() {
    let (addr, _state, handle) = start().await;
    let mut alice = join(&addr, "alice").await;
    for description in ["one", "two", "three"] {
        alice.send(&add(description)).await.unwrap();
        recv(&mut alice).await;
    }
    alice
        .send(&ClientCommand::Delete { id: TaskId::new(2) })
        .await
        .unwrap();
    recv(&mut alice).await;

    let (mut bob, online) = Client::connect(&addr, "bob").await.unwrap();
    assert_eq!(online, vec!["alice"]);
    assert_eq!(
        recv(&mut bob).await,
        ServerEvent::TaskAdded(task(1, "one", false, "alice"))
    );
    assert_eq!(
        recv(&mut bob).await,
        ServerEvent::TaskAdded(task(3, "three", false, "alice"))
    );
    handle.abort();
}

#[tokio::test]
async fn delete_is_broadcast_and_unknown_ids_are_silent() {
    let (addr, _state, handle) = start().await;
    let mut alice = join(&addr, "alice").await;
    let mut bob = join(&addr, "bob").await;
    recv(&mut alice).await; // USER_JOINED:bob

    alice.send(&add("temp")).await.unwrap();
    recv(&mut alice).await;
    recv(&mut bob).await;

    bob.send(&ClientCommand::Delete { id: TaskId::new(1) })
        .await
        .unwrap();
    let deleted = ServerEvent::TaskDeleted { id: TaskId::new(1) };
    assert_eq!(recv(&mut alice).await, deleted);
    assert_eq!(recv(&mut bob).await, deleted);

    // Neither of these may produce an event; the marker proves it.
    bob.send(&ClientCommand::Delete { id: TaskId::new(1) })
        .await
        .unwrap();
    bob.send(&ClientCommand::Update {
        id: TaskId::new(99),
        description: "ghost".into(),
        completed: true,
    })
    .await
    .unwrap();
    bob.send(&add("marker")).await.unwrap();
    assert_eq!(
        recv(&mut alice).await,
        ServerEvent::TaskAdded(task(2, "marker", false, "bob"))
    );
    handle.abort();
}

#[tokio::test]
async fn descriptions_with_colons_round_trip() {
    let (addr, state, handle) = start().await;
    let mut alice = join(&addr, "alice").await;

    alice.send(&add("Meet at 10:30: room B")).await.unwrap();
    assert_eq!(
        recv(&mut alice).await,
        ServerEvent::TaskAdded(task(1, "Meet at 10:30: room B", false, "alice"))
    );

    alice
        .send(&ClientCommand::Update {
            id: TaskId::new(1),
            description: "Moved: 11:00".into(),
            completed: false,
        })
        .await
        .unwrap();
    assert_eq!(
        recv(&mut alice).await,
        ServerEvent::TaskUpdated(task(1, "Moved: 11:00", false, "alice"))
    );
    assert_eq!(
        state.tasks.get_task(TaskId::new(1)).unwrap().description,
        "Moved: 11:00"
    );
    handle.abort();
}

#[tokio::test]
async fn boards_converge_from_the_event_stream() {
    let (addr, _state, handle) = start().await;
    let mut alice = join(&addr, "alice").await;
    let mut bob = join(&addr, "bob").await;
    let mut alice_board = Board::new("alice");
    let mut bob_board = Board::new("bob");
    alice_board.apply(&recv(&mut alice).await);

    alice.send(&add("a")).await.unwrap();
    bob.send(&add("b")).await.unwrap();
    alice.send(&add("c")).await.unwrap();
    for _ in 0..3 {
        alice_board.apply(&recv(&mut alice).await);
        bob_board.apply(&recv(&mut bob).await);
    }
    bob.send(&ClientCommand::Update {
        id: TaskId::new(1),
        description: "a".into(),
        completed: true,
    })
    .await
    .unwrap();
    alice
        .send(&ClientCommand::Delete { id: TaskId::new(3) })
        .await
        .unwrap();
    for _ in 0..2 {
        alice_board.apply(&recv(&mut alice).await);
        bob_board.apply(&recv(&mut bob).await);
    }

    let alice_tasks: Vec<_> = alice_board.tasks().cloned().collect();
    let bob_tasks: Vec<_> = bob_board.tasks().cloned().collect();
    assert_eq!(alice_tasks, bob_tasks);
    assert_eq!(alice_tasks.len(), 2);
    assert!(alice_board.get(TaskId::new(1)).unwrap().completed);
    handle.abort();
}
