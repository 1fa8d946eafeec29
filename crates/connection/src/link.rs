//! A single live WebSocket link: connect, pump tasks, teardown.
//!
//! The link is transport only — it hands inbound text frames to a shared
//! handler slot and accepts outbound text frames through the write pump's
//! channel. Handler slots are shared with the supervisor so they survive
//! the link being replaced on reconnect.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite;

use dispatchai_protocol::constants::WS_MAX_FRAME_SIZE;

/// Slot holding the current inbound-message handler. Read at dispatch time
/// so the latest registered handler always receives frames.
pub(crate) type MessageHandler = Arc<Mutex<Option<Box<dyn Fn(String) + Send + Sync>>>>;

/// Slot holding the callback fired when the link dies for any reason.
pub(crate) type DisconnectHandler = Arc<Mutex<Option<Box<dyn Fn() + Send + Sync>>>>;

#[derive(Debug, thiserror::Error)]
pub(crate) enum LinkError {
    #[error("WebSocket error: {0}")]
    Ws(#[from] tungstenite::Error),
}

pub(crate) struct WsLink {
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: tokio_util::sync::CancellationToken,
    _read_handle: tokio::task::JoinHandle<()>,
    _write_handle: tokio::task::JoinHandle<()>,
}

impl WsLink {
    /// Dials the endpoint and spawns the read and write pumps. The write
    /// pump doubles as the keepalive sender.
    pub(crate) async fn connect(
        url: &str,
        on_message: MessageHandler,
        on_disconnect: DisconnectHandler,
    ) -> Result<Self, LinkError> {
        let mut ws_config = tungstenite::protocol::WebSocketConfig::default();
        ws_config.max_message_size = Some(WS_MAX_FRAME_SIZE);
        ws_config.max_frame_size = Some(WS_MAX_FRAME_SIZE);
        let (ws_stream, _) =
            tokio_tungstenite::connect_async_with_config(url, Some(ws_config), false).await?;
        let (write, read) = futures_util::StreamExt::split(ws_stream);

        let (write_tx, write_rx) = mpsc::channel::<tungstenite::Message>(256);
        let cancel = tokio_util::sync::CancellationToken::new();

        let write_handle = {
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::write::write_pump(write, write_rx, cancel))
        };

        let read_handle = {
            let cancel = cancel.clone();
            let write_tx = write_tx.clone();
            tokio::spawn(crate::pumps::read::read_pump(
                read,
                on_message,
                on_disconnect,
                write_tx,
                cancel,
            ))
        };

        Ok(Self {
            write_tx,
            cancel,
            _read_handle: read_handle,
            _write_handle: write_handle,
        })
    }

    /// Hands a text frame to the write pump. `false` when the pump is gone
    /// or its queue is full; frames are never buffered beyond the channel.
    pub(crate) fn send_text(&self, text: String) -> bool {
        self.write_tx
            .try_send(tungstenite::Message::Text(text.into()))
            .is_ok()
    }

    /// Gracefully closes the link. The write pump sends the close frame on
    /// its way out.
    pub(crate) async fn close(&self) {
        self.cancel.cancel();
        let _ = self.write_tx.send(tungstenite::Message::Close(None)).await;
    }
}

impl Drop for WsLink {
    fn drop(&mut self) {
        self.cancel.cancel();
        self._read_handle.abort();
        self._write_handle.abort();
    }
}
