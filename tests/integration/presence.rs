//! Username claiming, join and leave announcements over real TCP.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use taskboard::{Client, ClientError};
use taskboard_proto::ServerEvent;
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

async fn recv(client: &mut Client) -> ServerEvent {
    timeout(WAIT, client.next_event())
        .await
        .expect("timed out waiting for an event")
        .expect("connection error")
        .expect("server closed the connection")
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition never became true");
}

#[tokio::test]
async fn taken_name_is_rejected_and_retry_succeeds() {
    let (addr, _state, handle) = start().await;

    let (mut alice, online) = Client::connect(&addr, "alice").await.unwrap();
    assert!(online.is_empty());

    let mut second = Client::open(&addr).await.unwrap();
    let err = second.login("alice").await.unwrap_err();
    assert!(matches!(err, ClientError::Rejected(reason) if reason.contains("alice")));

    let online = second.login("bob").await.unwrap();
    assert_eq!(online, vec!["alice"]);
    assert_eq!(
        recv(&mut alice).await,
        ServerEvent::UserJoined {
            username: "bob".into()
        }
    );
    handle.abort();
}

#[tokio::test]
async fn blank_name_is_rejected() {
    let (addr, state, handle) = start().await;
    let mut client = Client::open(&addr).await.unwrap();
    let err = client.login("   ").await.unwrap_err();
    assert!(matches!(err, ClientError::Rejected(_)));
    assert!(state.users.list_active().is_empty());
    handle.abort();
}

#[tokio::test]
async fn disconnect_announces_departure_and_frees_name() {
    let (addr, state, handle) = start().await;
    let (alice, _) = Client::connect(&addr, "alice").await.unwrap();
    let (mut bob, _) = Client::connect(&addr, "bob").await.unwrap();

    alice.close().await;
    assert_eq!(
        recv(&mut bob).await,
        ServerEvent::UserLeft {
            username: "alice".into()
        }
    );
    wait_until(|| state.users.owner("alice").is_none()).await;

    let (_alice_again, online) = Client::connect(&addr, "alice").await.unwrap();
    assert_eq!(online, vec!["bob"]);
    assert_eq!(
        recv(&mut bob).await,
        ServerEvent::UserJoined {
            username: "alice".into()
        }
    );
    handle.abort();
}

#[tokio::test]
async fn online_list_is_sorted_and_excludes_joiner() {
    let (addr, _state, handle) = start().await;
    let mut keep = Vec::new();
    for name in ["carol", "alice", "bob"] {
        let (client, _) = Client::connect(&addr, name).await.unwrap();
        keep.push(client);
    }
    let (_dave, online) = Client::connect(&addr, "dave").await.unwrap();
    assert_eq!(online, vec!["alice", "bob", "carol"]);
    handle.abort();
}

#[tokio::test]
async fn username_is_trimmed() {
    let (addr, state, handle) = start().await;
    let (_bob, _) = Client::connect(&addr, "  bob ").await.unwrap();
    assert_eq!(state.users.list_active(), vec!["bob"]);

    let mut other = Client::open(&addr).await.unwrap();
    assert!(matches!(
        other.login("bob").await,
        Err(ClientError::Rejected(_))
    ));
    handle.abort();
}
