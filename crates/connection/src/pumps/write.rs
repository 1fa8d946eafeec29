//! WebSocket write pump — outbound frames plus keepalive.
//!
//! The pump owns the sink half, so keepalive pings ride the same task as
//! session frames: the peer sees traffic at least every [`WS_PING_PERIOD`]
//! even while no alerts or descriptions flow, and the read pump's pong
//! deadline stays armed on a healthy connection.

use futures_util::SinkExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::error;

use dispatchai_protocol::constants::WS_PING_PERIOD;

/// Writes queued frames to the WebSocket until cancelled or the queue
/// closes, pinging whenever the link has been idle for a full period.
/// Every exit path ends with a close frame so the peer gets a handshake
/// rather than a dead TCP stream.
pub(crate) async fn write_pump<S>(
    mut write: S,
    mut outbound_rx: mpsc::Receiver<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: SinkExt<tungstenite::Message, Error = tungstenite::Error> + Unpin,
{
    let mut keepalive = tokio::time::interval(WS_PING_PERIOD);
    keepalive.tick().await; // Skip immediate first tick.

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            _ = keepalive.tick() => {
                let ping = tungstenite::Message::Ping(Vec::new().into());
                if write.send(ping).await.is_err() {
                    break;
                }
            }

            frame = outbound_rx.recv() => {
                match frame {
                    Some(frame) => {
                        if let Err(e) = write.send(frame).await {
                            error!("WebSocket write error: {e}");
                            break;
                        }
                        // Session traffic counts as liveness.
                        keepalive.reset();
                    }
                    None => break,
                }
            }
        }
    }

    let _ = write.send(tungstenite::Message::Close(None)).await;
}
