//! Integration tests for the `/ws/feed` stream.
//!
//! The server runs on an ephemeral port and the client speaks just enough
//! of RFC 6455 to complete the upgrade and read unmasked server text
//! frames.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use commitboard_observer::server::serve;
use commitboard_observer::state::{AppState, FeedBroadcast};
use commitboard_types::LedgerView;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

fn view_at(secs: i64, latest_block: u64) -> LedgerView {
    LedgerView {
        computed_at: DateTime::<Utc>::from_timestamp(secs, 0),
        latest_block,
        ..LedgerView::default()
    }
}

async fn start(state: Arc<AppState>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(serve(listener, state));
    addr
}

/// Open `/ws/feed` and return the stream positioned after the 101 response.
async fn upgrade(addr: &str) -> TcpStream {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET /ws/feed HTTP/1.1\r\n\
         Host: {addr}\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
         Sec-WebSocket-Version: 13\r\n\r\n"
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut head = Vec::new();
    let mut byte = [0_u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        stream.read_exact(&mut byte).await.unwrap();
        head.extend_from_slice(&byte);
    }
    let head = String::from_utf8(head).unwrap();
    assert!(head.starts_with("HTTP/1.1 101"), "unexpected response: {head}");
    stream
}

/// Read one server text frame and decode it.
async fn next_frame(stream: &mut TcpStream) -> FeedBroadcast {
    let mut header = [0_u8; 2];
    stream.read_exact(&mut header).await.unwrap();
    let [first, second] = header;
    assert_eq!(first & 0x0f, 0x1, "expected a text frame");
    assert_eq!(second & 0x80, 0, "server frames are unmasked");

    let len = match second & 0x7f {
        126 => u64::from(stream.read_u16().await.unwrap()),
        127 => stream.read_u64().await.unwrap(),
        n => u64::from(n),
    };
    let mut payload = vec![0_u8; usize::try_from(len).unwrap()];
    stream.read_exact(&mut payload).await.unwrap();
    serde_json::from_slice(&payload).unwrap()
}

async fn within<T>(fut: impl Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(5), fut).await.unwrap()
}

#[tokio::test]
async fn test_current_view_is_sent_on_connect() {
    let state = Arc::new(AppState::default());
    state.publish_view(view_at(1_773_500_000, 42)).await;
    let addr = start(Arc::clone(&state)).await;

    let mut stream = upgrade(&addr).await;
    let first = within(next_frame(&mut stream)).await;
    assert_eq!(first.latest_block, 42);
    assert_eq!(first.computed_at, DateTime::<Utc>::from_timestamp(1_773_500_000, 0));
}

#[tokio::test]
async fn test_refreshes_follow_the_snapshot() {
    let state = Arc::new(AppState::default());
    state.publish_view(view_at(1_773_500_000, 42)).await;
    let addr = start(Arc::clone(&state)).await;

    let mut stream = upgrade(&addr).await;
    assert_eq!(within(next_frame(&mut stream)).await.latest_block, 42);

    state.publish_view(view_at(1_773_500_015, 43)).await;
    assert_eq!(within(next_frame(&mut stream)).await.latest_block, 43);
}

#[tokio::test]
async fn test_nothing_is_sent_before_the_first_refresh() {
    let state = Arc::new(AppState::default());
    let addr = start(Arc::clone(&state)).await;

    let mut stream = upgrade(&addr).await;
    let early = tokio::time::timeout(Duration::from_millis(200), next_frame(&mut stream)).await;
    assert!(early.is_err(), "no frame expected before a view exists");
}
