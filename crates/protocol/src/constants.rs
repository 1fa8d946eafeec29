use std::time::Duration;

/// How often to send keepalive pings.
pub const WS_PING_PERIOD: Duration = Duration::from_secs(5);

/// Time to wait for a pong response (or any incoming message).
///
/// Acts as a read deadline: if *nothing* arrives within this window the
/// connection is considered dead and the session enters the reconnect path.
pub const WS_PONG_WAIT: Duration = Duration::from_secs(60);

/// Maximum inbound frame size in bytes (4 MB).
///
/// Sized for alert payloads carrying a base64 snapshot still; anything
/// larger is dropped with a log entry.
pub const WS_MAX_FRAME_SIZE: usize = 4 * 1024 * 1024;

/// WebSocket path for a camera channel.
pub fn camera_path(camera_id: &str) -> String {
    format!("/ws/camera/{camera_id}")
}

/// WebSocket path for the shared dispatcher channel.
pub fn dispatcher_path() -> &'static str {
    "/ws/dispatcher"
}
