//! WebSocket read pump — dispatches inbound frames.

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use dispatchai_protocol::constants::{WS_MAX_FRAME_SIZE, WS_PONG_WAIT};

use crate::link::{DisconnectHandler, MessageHandler};

/// Reads frames from the WebSocket and hands text payloads to the current
/// message handler.
///
/// Keeps a pong deadline to detect dead connections: if nothing arrives
/// within [`WS_PONG_WAIT`] the connection is considered lost and the loop
/// exits, firing the disconnect callback (which drives reconnection).
pub(crate) async fn read_pump<S>(
    mut read: S,
    on_message: MessageHandler,
    on_disconnect: DisconnectHandler,
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: StreamExt<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    // Any inbound frame resets the deadline, not just pongs.
    let pong_deadline = tokio::time::sleep(WS_PONG_WAIT);
    tokio::pin!(pong_deadline);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            () = &mut pong_deadline => {
                warn!("pong timeout — connection dead, closing");
                break;
            }

            frame = read.next() => {
                match frame {
                    Some(Ok(frame)) => {
                        pong_deadline.as_mut().reset(tokio::time::Instant::now() + WS_PONG_WAIT);

                        match frame {
                            tungstenite::Message::Text(text) => {
                                dispatch_text(&text, &on_message).await;
                            }
                            tungstenite::Message::Ping(data) => {
                                trace!("received ping, sending pong");
                                let _ = write_tx.send(tungstenite::Message::Pong(data)).await;
                            }
                            tungstenite::Message::Pong(_) => {
                                trace!("received pong");
                            }
                            tungstenite::Message::Close(_) => {
                                debug!("received close frame");
                                break;
                            }
                            _ => {} // Binary — not part of this protocol
                        }
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket read error: {e}");
                        break;
                    }
                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    if let Some(cb) = on_disconnect.lock().await.as_ref() {
        cb();
    }
}

/// Hands one text frame to the currently registered handler.
async fn dispatch_text(text: &str, on_message: &MessageHandler) {
    if text.len() > WS_MAX_FRAME_SIZE {
        warn!("frame too large ({} bytes), dropping", text.len());
        return;
    }

    let guard = on_message.lock().await;
    match guard.as_ref() {
        Some(cb) => cb(text.to_string()),
        None => warn!("no message handler registered — dropping frame"),
    }
}
