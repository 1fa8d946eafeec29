//! Public types for the connection supervisor.

use std::time::Duration;

/// Lifecycle phase of a supervised connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorState {
    /// Created, no connection attempted yet.
    Idle,
    /// WebSocket connect in progress.
    Connecting,
    /// Connection open and usable.
    Open,
    /// Connection lost, a reconnect attempt is pending.
    Reconnecting { attempt: u32 },
    /// Closed with no reconnect pending (explicit teardown or lost before
    /// any reconnect was scheduled).
    Closed,
}

impl SupervisorState {
    /// Whether frames can currently be sent.
    pub fn is_open(&self) -> bool {
        matches!(self, SupervisorState::Open)
    }
}

/// Events emitted by a supervisor as the connection changes state.
///
/// Enough for a UI to render a live indicator: connected, or
/// reconnect-in-progress with the attempt count and next delay.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    StateChanged(SupervisorState),
    ReconnectScheduled { attempt: u32, delay: Duration },
}

/// Exponential backoff schedule for reconnect attempts.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Delay before the first reconnect attempt.
    pub base: Duration,
    /// Cap on the delay between attempts.
    pub cap: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(1000),
            cap: Duration::from_secs(30),
        }
    }
}

impl BackoffConfig {
    /// Delay before reconnect attempt `attempt` (0-based):
    /// `min(base * 2^attempt, cap)`, saturating.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.min(63);
        let scaled = self.base.as_millis().saturating_mul(1u128 << exp);
        let capped = scaled.min(self.cap.as_millis());
        Duration::from_millis(capped as u64)
    }
}

/// Errors surfaced to the caller at session setup.
///
/// This is the only error class that propagates; transport failures drive
/// the reconnect path instead.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid endpoint {0:?}: expected a ws:// or wss:// URL with a host")]
    InvalidEndpoint(String),
}
