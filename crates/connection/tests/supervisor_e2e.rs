//! Supervisor behavior against a real local WebSocket server: connect,
//! send, loss detection, automatic reconnect, teardown.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use dispatchai_connection::{BackoffConfig, ConnectionSupervisor, SupervisorState};

fn fast_backoff() -> BackoffConfig {
    BackoffConfig {
        base: Duration::from_millis(20),
        cap: Duration::from_millis(100),
    }
}

async fn wait_for(mut cond: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

struct TestServer {
    endpoint: String,
    accepts: Arc<AtomicU32>,
    frames_rx: mpsc::UnboundedReceiver<String>,
}

/// Accept loop: forwards every text frame to `frames_rx` and drops each
/// connection after `drop_after_frames` frames (`None` keeps it open).
async fn spawn_server(drop_after_frames: Option<u32>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepts = Arc::new(AtomicU32::new(0));
    let (frames_tx, frames_rx) = mpsc::unbounded_channel::<String>();

    let accepts_task = accepts.clone();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                continue;
            };
            accepts_task.fetch_add(1, Ordering::SeqCst);

            let mut seen = 0u32;
            while let Some(Ok(frame)) = ws.next().await {
                if let Message::Text(text) = frame {
                    seen += 1;
                    let _ = frames_tx.send(text.to_string());
                    if drop_after_frames.is_some_and(|n| seen >= n) {
                        break; // drop the connection abruptly
                    }
                }
            }
        }
    });

    TestServer {
        endpoint: format!("ws://{addr}"),
        accepts,
        frames_rx,
    }
}

#[tokio::test]
async fn connects_and_delivers_outbound_frames() {
    let mut server = spawn_server(None).await;
    let sup = ConnectionSupervisor::new(&server.endpoint, fast_backoff()).unwrap();

    sup.open().await;
    assert!(wait_for(|| sup.is_connected(), Duration::from_secs(5)).await);
    assert_eq!(sup.attempt(), 0);

    assert!(sup.send_text(r#"{"type":"force_process"}"#));
    let frame = tokio::time::timeout(Duration::from_secs(5), server.frames_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(frame, r#"{"type":"force_process"}"#);

    sup.close().await;
    assert_eq!(sup.state(), SupervisorState::Closed);
}

#[tokio::test]
async fn open_while_open_is_a_noop() {
    let server = spawn_server(None).await;
    let sup = ConnectionSupervisor::new(&server.endpoint, fast_backoff()).unwrap();

    sup.open().await;
    assert!(wait_for(|| sup.is_connected(), Duration::from_secs(5)).await);
    sup.open().await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(server.accepts.load(Ordering::SeqCst), 1);
    sup.close().await;
}

#[tokio::test]
async fn reconnects_after_connection_drop() {
    let mut server = spawn_server(Some(1)).await;
    let sup = ConnectionSupervisor::new(&server.endpoint, fast_backoff()).unwrap();

    sup.open().await;
    assert!(wait_for(|| sup.is_connected(), Duration::from_secs(5)).await);

    // The server drops the connection after this frame.
    assert!(sup.send_text(r#"{"type":"force_process"}"#));
    let _ = server.frames_rx.recv().await;

    assert!(wait_for(|| !sup.is_connected(), Duration::from_secs(5)).await);
    // Without any caller action, the supervisor dials again.
    assert!(wait_for(|| sup.is_connected(), Duration::from_secs(5)).await);
    assert_eq!(sup.attempt(), 0, "attempt resets on successful open");
    assert!(server.accepts.load(Ordering::SeqCst) >= 2);

    sup.close().await;
}

#[tokio::test]
async fn reconnect_keeps_retrying_while_endpoint_is_down() {
    // Point at a bound-then-dropped port so the first dial fails.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("ws://{}", listener.local_addr().unwrap());
    drop(listener);

    let sup = ConnectionSupervisor::new(&endpoint, fast_backoff()).unwrap();
    sup.open().await;

    // The failed dial schedules reconnects and the counter climbs.
    assert!(wait_for(|| sup.attempt() >= 2, Duration::from_secs(5)).await);
    assert!(matches!(
        sup.state(),
        SupervisorState::Reconnecting { .. } | SupervisorState::Connecting
    ));

    sup.close().await;
    assert_eq!(sup.state(), SupervisorState::Closed);
}

#[tokio::test]
async fn close_cancels_pending_reconnect() {
    let mut server = spawn_server(Some(1)).await;
    let sup = ConnectionSupervisor::new(&server.endpoint, fast_backoff()).unwrap();

    sup.open().await;
    assert!(wait_for(|| sup.is_connected(), Duration::from_secs(5)).await);

    assert!(sup.send_text(r#"{"type":"force_process"}"#));
    let _ = server.frames_rx.recv().await;
    assert!(wait_for(|| !sup.is_connected(), Duration::from_secs(5)).await);

    sup.close().await;
    let accepts_at_close = server.accepts.load(Ordering::SeqCst);

    // Well past several backoff periods: no further dial may happen.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(server.accepts.load(Ordering::SeqCst), accepts_at_close);
    assert_eq!(sup.state(), SupervisorState::Closed);
}

#[tokio::test]
async fn close_during_dial_leaves_no_live_socket() {
    // Accepts TCP immediately but stalls the WebSocket handshake until
    // released, keeping the dial in flight.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("ws://{}", listener.local_addr().unwrap());
    let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let _ = release_rx.await;
        let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
            return;
        };
        // A client socket surviving teardown would keep this loop alive.
        while let Some(Ok(_)) = ws.next().await {}
    });

    let sup = Arc::new(ConnectionSupervisor::new(&endpoint, fast_backoff()).unwrap());
    let opener = {
        let sup = sup.clone();
        tokio::spawn(async move { sup.open().await })
    };
    assert!(
        wait_for(
            || sup.state() == SupervisorState::Connecting,
            Duration::from_secs(5)
        )
        .await
    );

    sup.close().await;
    assert_eq!(sup.state(), SupervisorState::Closed);

    // Let the handshake complete; the finished dial must not resurrect
    // the connection.
    release_tx.send(()).unwrap();
    opener.await.unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(sup.state(), SupervisorState::Closed);
    assert!(!sup.is_connected());
    assert!(!sup.send_text(r#"{"type":"force_process"}"#));

    // The server side of the discarded link goes away promptly.
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server connection should end")
        .unwrap();
}

#[tokio::test]
async fn inbound_frames_reach_latest_handler() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("ws://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(Message::Text(r#"{"type":"camera_list","cameras":[]}"#.into()))
            .await
            .unwrap();
        // Keep the connection alive until the client closes it.
        while ws.next().await.is_some() {}
    });

    let sup = ConnectionSupervisor::new(&endpoint, fast_backoff()).unwrap();

    let stale = Arc::new(AtomicU32::new(0));
    let s = stale.clone();
    sup.set_message_handler(Box::new(move |_| {
        s.fetch_add(1, Ordering::SeqCst);
    }))
    .await;

    let fresh = Arc::new(std::sync::Mutex::new(Vec::new()));
    let f = fresh.clone();
    sup.set_message_handler(Box::new(move |text| {
        f.lock().unwrap().push(text);
    }))
    .await;

    sup.open().await;
    assert!(
        wait_for(
            || !fresh.lock().unwrap().is_empty(),
            Duration::from_secs(5)
        )
        .await
    );
    assert_eq!(
        fresh.lock().unwrap()[0],
        r#"{"type":"camera_list","cameras":[]}"#
    );
    assert_eq!(stale.load(Ordering::SeqCst), 0);

    sup.close().await;
}
