//! Dispatcher-role protocol over the shared supervised connection.

use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use dispatchai_connection::{BackoffConfig, ConfigError, ConnectionEvent, ConnectionSupervisor, SupervisorState};
use dispatchai_protocol::constants::dispatcher_path;
use dispatchai_protocol::{
    Alert, AlertStatus, Decision, DecisionMessage, DispatcherInbound, codec,
};

type AlertHandler = std::sync::Mutex<Option<Box<dyn Fn(Alert) + Send + Sync>>>;
type FrameHandler = std::sync::Mutex<Option<Box<dyn Fn(String, String) + Send + Sync>>>;

/// The dispatcher dashboard's channel to the backend.
///
/// Maintains the camera roster and the pending-alert registry from the
/// inbound event stream, and emits operator decisions. Handler slots are
/// single-slot latest-wins, so a re-rendered consumer never leaves alerts
/// flowing to a decommissioned callback.
pub struct DispatcherSession {
    inner: Arc<Inner>,
    supervisor: ConnectionSupervisor,
}

pub(crate) struct Inner {
    dispatcher_id: String,
    roster: std::sync::Mutex<crate::CameraRoster>,
    alerts: std::sync::Mutex<crate::AlertStore>,
    on_alert: AlertHandler,
    on_frame: FrameHandler,
}

impl DispatcherSession {
    /// Creates a session against `base_url` (e.g. `ws://host:8000`).
    ///
    /// When `dispatcher_id` is `None` a unique identity is generated; it is
    /// attached to every decision message.
    pub fn new(
        base_url: &str,
        dispatcher_id: Option<String>,
        backoff: BackoffConfig,
    ) -> Result<Self, ConfigError> {
        let endpoint = format!("{}{}", base_url.trim_end_matches('/'), dispatcher_path());
        let supervisor = ConnectionSupervisor::new(endpoint, backoff)?;
        let dispatcher_id =
            dispatcher_id.unwrap_or_else(|| format!("dispatcher-{}", uuid::Uuid::new_v4()));

        Ok(Self {
            inner: Arc::new(Inner {
                dispatcher_id,
                roster: std::sync::Mutex::new(crate::CameraRoster::new()),
                alerts: std::sync::Mutex::new(crate::AlertStore::new()),
                on_alert: std::sync::Mutex::new(None),
                on_frame: std::sync::Mutex::new(None),
            }),
            supervisor,
        })
    }

    /// Connects the channel and wires inbound dispatch. No-op while already
    /// open; reconnection after loss is automatic.
    pub async fn start(&self) {
        let inner = self.inner.clone();
        self.supervisor
            .set_message_handler(Box::new(move |text| inner.handle_frame(&text)))
            .await;
        self.supervisor.open().await;
    }

    /// Tears the channel down. Idempotent. Alerts and roster stay readable;
    /// they are in-memory state for the lifetime of the session object.
    pub async fn stop(&self) {
        self.supervisor.close().await;
    }

    pub fn dispatcher_id(&self) -> &str {
        &self.inner.dispatcher_id
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

    /// Registers the handler invoked with each newly inserted alert.
    /// Single slot, latest wins; duplicates never reach it.
    pub fn set_alert_handler(&self, cb: Box<dyn Fn(Alert) + Send + Sync>) {
        if let Ok(mut guard) = self.inner.on_alert.lock() {
            *guard = Some(cb);
        }
    }

    /// Registers the handler for relayed video frames
    /// (`(camera_id, frame)`). Frames are dropped when none is registered.
    pub fn set_frame_handler(&self, cb: Box<dyn Fn(String, String) + Send + Sync>) {
        if let Ok(mut guard) = self.inner.on_frame.lock() {
            *guard = Some(cb);
        }
    }

    /// Sorted roster of connected cameras.
    pub fn cameras(&self) -> Vec<String> {
        self.inner
            .roster
            .lock()
            .map(|r| r.snapshot())
            .unwrap_or_default()
    }

    /// Pending alerts, most recently received first.
    pub fn pending_alerts(&self) -> Vec<Alert> {
        self.inner
            .alerts
            .lock()
            .map(|a| a.pending())
            .unwrap_or_default()
    }

    /// Records an operator decision: removes the alert locally and sends
    /// the decision upstream.
    ///
    /// The removal is unconditional (optimistic: the backend owns the final
    /// disposition); the return value reports only whether the decision
    /// reached an open socket.
    pub fn decide(&self, incident_id: &str, decision: Decision, reason: Option<String>) -> bool {
        let status = match decision {
            Decision::Confirm => AlertStatus::Confirmed,
            Decision::Reject => AlertStatus::Rejected,
        };
        let removed = self
            .inner
            .alerts
            .lock()
            .ok()
            .and_then(|mut store| store.take(incident_id, status));
        match removed {
            Some(alert) => info!(
                incident = %alert.id,
                ?decision,
                "operator decision recorded"
            ),
            None => debug!(incident = %incident_id, "decision for unknown alert"),
        }

        let msg = DecisionMessage {
            decision,
            incident_id: incident_id.to_string(),
            reason,
            dispatcher_id: self.inner.dispatcher_id.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        match codec::encode(&msg) {
            Ok(json) => {
                let sent = self.supervisor.send_text(&json);
                if !sent {
                    warn!(incident = %incident_id, "decision not sent — channel closed");
                }
                sent
            }
            Err(e) => {
                warn!(incident = %incident_id, error = %e, "failed to encode decision");
                false
            }
        }
    }
}

impl Inner {
    /// Decodes one inbound frame for the dispatcher role and applies it.
    /// Malformed or unknown frames are logged and discarded, never fatal.
    pub(crate) fn handle_frame(&self, text: &str) {
        let event: DispatcherInbound = match codec::decode(text) {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "discarding inbound frame");
                return;
            }
        };
        self.apply(event);
    }

    /// Applies one dispatcher event to the roster/alert state.
    pub(crate) fn apply(&self, event: DispatcherInbound) {
        match event {
            DispatcherInbound::Alert { mut data } => {
                data.status = AlertStatus::PendingReview;
                let added = self
                    .alerts
                    .lock()
                    .map(|mut store| store.insert(data.clone()))
                    .unwrap_or(false);
                if !added {
                    debug!(incident = %data.id, "duplicate alert ignored");
                    return;
                }
                info!(
                    incident = %data.id,
                    camera = %data.camera_id,
                    incident_type = %data.classification.incident_type,
                    "alert received"
                );
                if let Ok(guard) = self.on_alert.lock()
                    && let Some(cb) = guard.as_ref()
                {
                    cb(data);
                }
            }
            DispatcherInbound::CameraConnected { camera_id } => {
                let added = self
                    .roster
                    .lock()
                    .map(|mut r| r.mark_connected(&camera_id))
                    .unwrap_or(false);
                if added {
                    info!(camera = %camera_id, "camera connected");
                }
            }
            DispatcherInbound::CameraDisconnected { camera_id } => {
                let removed = self
                    .roster
                    .lock()
                    .map(|mut r| r.mark_disconnected(&camera_id))
                    .unwrap_or(false);
                if removed {
                    info!(camera = %camera_id, "camera disconnected");
                }
            }
            DispatcherInbound::CameraList { cameras } => {
                debug!(count = cameras.len(), "camera roster snapshot");
                if let Ok(mut roster) = self.roster.lock() {
                    roster.replace(cameras);
                }
            }
            DispatcherInbound::VideoFrame { camera_id, frame } => {
                if let Ok(guard) = self.on_frame.lock()
                    && let Some(cb) = guard.as_ref()
                {
                    cb(camera_id, frame);
                } else {
                    trace!(camera = %camera_id, "video frame dropped — no handler");
                }
            }
        }
    }
}
