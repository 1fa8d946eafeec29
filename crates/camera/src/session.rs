//! Camera-role protocol over one supervised connection.

use std::sync::Arc;

use tracing::{debug, warn};

use dispatchai_connection::{BackoffConfig, ConfigError, ConnectionEvent, ConnectionSupervisor, SupervisorState};
use dispatchai_protocol::constants::camera_path;
use dispatchai_protocol::{CameraInbound, CameraOutbound, codec};

/// Slot for the clip-request handler. Latest registration wins.
type ClipRequestSlot = Arc<std::sync::Mutex<Option<Box<dyn Fn(String) + Send + Sync>>>>;

/// One camera's channel to the backend.
///
/// Every send is best-effort: a closed socket makes it a safe no-op that
/// returns `false` rather than an error, and nothing is queued for later.
pub struct CameraSession {
    camera_id: String,
    supervisor: ConnectionSupervisor,
    on_clip_request: ClipRequestSlot,
}

impl CameraSession {
    /// Creates a session for `camera_id` against `base_url`
    /// (e.g. `ws://host:8000`). Fails only on an invalid base URL.
    pub fn new(
        base_url: &str,
        camera_id: impl Into<String>,
        backoff: BackoffConfig,
    ) -> Result<Self, ConfigError> {
        let camera_id = camera_id.into();
        let endpoint = format!(
            "{}{}",
            base_url.trim_end_matches('/'),
            camera_path(&camera_id)
        );
        let supervisor = ConnectionSupervisor::new(endpoint, backoff)?;
        Ok(Self {
            camera_id,
            supervisor,
            on_clip_request: Arc::new(std::sync::Mutex::new(None)),
        })
    }

    /// Connects the channel and wires inbound dispatch. No-op while already
    /// open; reconnection after loss is automatic.
    pub async fn start(&self) {
        let slot = self.on_clip_request.clone();
        let camera_id = self.camera_id.clone();
        self.supervisor
            .set_message_handler(Box::new(move |text| {
                handle_frame(&camera_id, &text, &slot);
            }))
            .await;
        self.supervisor.open().await;
    }

    /// Tears the channel down. Idempotent.
    pub async fn stop(&self) {
        self.supervisor.close().await;
    }

    pub fn camera_id(&self) -> &str {
        &self.camera_id
    }

    pub fn connection_state(&self) -> SupervisorState {
        self.supervisor.state()
    }

    pub fn is_connected(&self) -> bool {
        self.supervisor.is_connected()
    }

    /// Registers a connection-event handler for a live status indicator.
    pub fn set_event_handler(&self, cb: Box<dyn Fn(ConnectionEvent) + Send + Sync>) {
        self.supervisor.set_event_handler(cb);
    }

    /// Registers the handler invoked with the incident id of each inbound
    /// `request_clip`. Single slot, latest wins.
    pub fn set_clip_request_handler(&self, cb: Box<dyn Fn(String) + Send + Sync>) {
        if let Ok(mut guard) = self.on_clip_request.lock() {
            *guard = Some(cb);
        }
    }

    /// Sends one scene description. The timestamp defaults to now (RFC 3339).
    pub fn send_description(&self, description: &str, timestamp: Option<String>) -> bool {
        self.send(&CameraOutbound::OvershootResult {
            description: description.to_string(),
            timestamp: timestamp.unwrap_or_else(now_rfc3339),
            snapshot: None,
        })
    }

    /// Sends a scene description with a base64 still attached.
    pub fn send_snapshot_description(
        &self,
        description: &str,
        snapshot: String,
        timestamp: Option<String>,
    ) -> bool {
        self.send(&CameraOutbound::OvershootResult {
            description: description.to_string(),
            timestamp: timestamp.unwrap_or_else(now_rfc3339),
            snapshot: Some(snapshot),
        })
    }

    /// Asks the backend to evaluate its buffered descriptions immediately.
    pub fn force_process(&self) -> bool {
        self.send(&CameraOutbound::ForceProcess)
    }

    /// Reports the URL of a clip produced for an earlier `request_clip`.
    pub fn send_clip_ready(&self, incident_id: &str, url: &str) -> bool {
        self.send(&CameraOutbound::ClipReady {
            incident_id: incident_id.to_string(),
            url: url.to_string(),
        })
    }

    /// Relays one raw frame (frame-forwarding operating mode).
    pub fn send_frame(&self, frame: &str) -> bool {
        self.send(&CameraOutbound::VideoFrame {
            frame: frame.to_string(),
        })
    }

    fn send(&self, msg: &CameraOutbound) -> bool {
        match codec::encode(msg) {
            Ok(json) => self.supervisor.send_text(&json),
            Err(e) => {
                warn!(camera = %self.camera_id, error = %e, "failed to encode outbound message");
                false
            }
        }
    }
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Decodes one inbound frame for the camera role and routes it. Malformed
/// or unknown frames are logged and discarded, never fatal.
pub(crate) fn handle_frame(camera_id: &str, text: &str, on_clip_request: &ClipRequestSlot) {
    let msg: CameraInbound = match codec::decode(text) {
        Ok(m) => m,
        Err(e) => {
            warn!(camera = %camera_id, error = %e, "discarding inbound frame");
            return;
        }
    };

    match msg {
        CameraInbound::RequestClip { incident_id } => {
            debug!(camera = %camera_id, incident = %incident_id, "clip requested");
            let guard = match on_clip_request.lock() {
                Ok(g) => g,
                Err(_) => return,
            };
            match guard.as_ref() {
                Some(cb) => cb(incident_id),
                None => {
                    warn!(camera = %camera_id, "no clip-request handler registered — dropping request")
                }
            }
        }
    }
}
