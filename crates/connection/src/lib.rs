//! Connection supervision for DispatchAI client channels.
//!
//! A [`ConnectionSupervisor`] owns one WebSocket's full lifecycle: connect,
//! pump tasks, loss detection via a pong deadline, and automatic
//! reconnection with exponential backoff. Transport failures never surface
//! to the caller; they resolve into state transitions and the backoff path.

pub(crate) mod link;
pub(crate) mod pumps;
pub(crate) mod reconnect;
pub mod supervisor;
pub mod types;

pub use supervisor::ConnectionSupervisor;
pub use types::{BackoffConfig, ConfigError, ConnectionEvent, SupervisorState};
