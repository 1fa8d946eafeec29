//! Per-connection lifecycle supervisor.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use tracing::{debug, info, warn};

use crate::link::{MessageHandler, WsLink};
use crate::reconnect::{cancel_pending_reconnect, disconnect_handler};
use crate::types::{BackoffConfig, ConfigError, ConnectionEvent, SupervisorState};

/// Slot holding the current connection-event handler.
pub(crate) type EventHandler =
    std::sync::Mutex<Option<Box<dyn Fn(ConnectionEvent) + Send + Sync>>>;

/// Owns one socket's lifecycle: connect, classify state, schedule
/// reconnection with exponential backoff, idempotent teardown.
///
/// At most one live socket and at most one pending reconnect exist per
/// supervisor. Transport errors never propagate out of it; they resolve
/// into the `Closed` state and the backoff path.
pub struct ConnectionSupervisor {
    shared: Arc<Shared>,
}

pub(crate) struct Shared {
    pub(crate) endpoint: String,
    pub(crate) backoff: BackoffConfig,
    pub(crate) link: std::sync::Mutex<Option<WsLink>>,
    pub(crate) state: std::sync::Mutex<SupervisorState>,
    /// Reconnect counter. Increases only while a reconnect is pending,
    /// resets to 0 the instant a connection opens.
    pub(crate) attempt: AtomicU32,
    pub(crate) on_message: MessageHandler,
    pub(crate) on_event: EventHandler,
    pub(crate) reconnect_cancel: std::sync::Mutex<Option<tokio_util::sync::CancellationToken>>,
    /// Teardown flag: once set, a late-firing reconnect or disconnect
    /// callback is a no-op.
    pub(crate) closed: AtomicBool,
}

impl ConnectionSupervisor {
    /// Creates a supervisor for one endpoint.
    ///
    /// The endpoint must be a `ws://` or `wss://` URL with a host; anything
    /// else is a configuration error, the only error class surfaced to the
    /// caller.
    pub fn new(endpoint: impl Into<String>, backoff: BackoffConfig) -> Result<Self, ConfigError> {
        let endpoint = endpoint.into();
        let host = endpoint
            .strip_prefix("ws://")
            .or_else(|| endpoint.strip_prefix("wss://"))
            .unwrap_or("");
        if host.is_empty() || host.starts_with('/') {
            return Err(ConfigError::InvalidEndpoint(endpoint));
        }

        Ok(Self {
            shared: Arc::new(Shared {
                endpoint,
                backoff,
                link: std::sync::Mutex::new(None),
                state: std::sync::Mutex::new(SupervisorState::Idle),
                attempt: AtomicU32::new(0),
                on_message: Arc::new(tokio::sync::Mutex::new(None)),
                on_event: std::sync::Mutex::new(None),
                reconnect_cancel: std::sync::Mutex::new(None),
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Registers the inbound-frame handler. Single slot, latest wins: frames
    /// are always delivered to the most recently registered handler, so a
    /// re-registered consumer never leaves a stale closure receiving them.
    pub async fn set_message_handler(&self, cb: Box<dyn Fn(String) + Send + Sync>) {
        *self.shared.on_message.lock().await = Some(cb);
    }

    /// Registers the connection-event handler. Single slot, latest wins.
    pub fn set_event_handler(&self, cb: Box<dyn Fn(ConnectionEvent) + Send + Sync>) {
        if let Ok(mut guard) = self.shared.on_event.lock() {
            *guard = Some(cb);
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SupervisorState {
        self.shared
            .state
            .lock()
            .map(|s| s.clone())
            .unwrap_or(SupervisorState::Closed)
    }

    /// Whether frames can currently be sent.
    pub fn is_connected(&self) -> bool {
        self.state().is_open()
    }

    /// Current reconnect attempt counter.
    pub fn attempt(&self) -> u32 {
        self.shared.attempt.load(Ordering::Relaxed)
    }

    /// Opens the connection. A no-op while already open or connecting, so a
    /// duplicate call cannot create a second socket.
    ///
    /// A failed connect is not an error: the supervisor transitions to
    /// `Closed` and enters the standard backoff path.
    pub async fn open(&self) {
        {
            let state = self.state();
            if matches!(state, SupervisorState::Open | SupervisorState::Connecting) {
                debug!(endpoint = %self.shared.endpoint, ?state, "open ignored — already active");
                return;
            }
        }
        self.shared.closed.store(false, Ordering::Relaxed);
        cancel_pending_reconnect(&self.shared.reconnect_cancel);

        if let Err(e) = self.shared.dial().await {
            warn!(endpoint = %self.shared.endpoint, error = %e, "connection failed");
            self.shared.set_state(SupervisorState::Closed);
            crate::reconnect::schedule_reconnect(self.shared.clone());
        }
    }

    /// Tears the connection down: cancels any pending reconnect and closes
    /// the live socket. Idempotent; safe before any open ever succeeded.
    pub async fn close(&self) {
        self.shared.closed.store(true, Ordering::Relaxed);
        cancel_pending_reconnect(&self.shared.reconnect_cancel);

        let link = self
            .shared
            .link
            .lock()
            .ok()
            .and_then(|mut guard| guard.take());
        if let Some(link) = link {
            link.close().await;
            debug!(endpoint = %self.shared.endpoint, "connection closed");
        }
        self.shared.set_state(SupervisorState::Closed);
    }

    /// Sends a text frame on the open socket. `false` when disconnected —
    /// an at-most-once, no-queue delivery policy, never an error.
    pub fn send_text(&self, text: &str) -> bool {
        if !self.is_connected() {
            return false;
        }
        let guard = match self.shared.link.lock() {
            Ok(g) => g,
            Err(_) => return false,
        };
        match guard.as_ref() {
            Some(link) => link.send_text(text.to_string()),
            None => false,
        }
    }
}

impl Shared {
    /// Dials the endpoint and installs the new link on success.
    pub(crate) async fn dial(self: &Arc<Self>) -> Result<(), crate::link::LinkError> {
        self.set_state(SupervisorState::Connecting);

        let on_disconnect = disconnect_handler(self.clone());
        let link = WsLink::connect(&self.endpoint, self.on_message.clone(), on_disconnect).await?;

        // close() may have landed while the handshake was in flight; the
        // new link must not survive teardown.
        if self.closed.load(Ordering::Relaxed) {
            debug!(endpoint = %self.endpoint, "dial completed after teardown — discarding link");
            link.close().await;
            self.set_state(SupervisorState::Closed);
            return Ok(());
        }

        if let Ok(mut guard) = self.link.lock() {
            *guard = Some(link);
        }
        self.attempt.store(0, Ordering::Relaxed);
        self.set_state(SupervisorState::Open);

        // A close() racing the install above may have run between the flag
        // check and the Open transition; converge back to Closed.
        if self.closed.load(Ordering::Relaxed) {
            let link = self.link.lock().ok().and_then(|mut guard| guard.take());
            if let Some(link) = link {
                link.close().await;
            }
            self.set_state(SupervisorState::Closed);
            return Ok(());
        }

        info!(endpoint = %self.endpoint, "connected");
        Ok(())
    }

    /// Updates the state and emits a change event. Deduplicates repeats.
    pub(crate) fn set_state(&self, new_state: SupervisorState) {
        {
            let mut guard = match self.state.lock() {
                Ok(g) => g,
                Err(_) => return,
            };
            if *guard == new_state {
                return;
            }
            *guard = new_state.clone();
        }
        self.emit(ConnectionEvent::StateChanged(new_state));
    }

    pub(crate) fn emit(&self, event: ConnectionEvent) {
        if let Ok(guard) = self.on_event.lock()
            && let Some(cb) = guard.as_ref()
        {
            cb(event);
        }
    }
}
