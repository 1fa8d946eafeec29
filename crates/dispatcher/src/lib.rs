//! Dispatcher-role session for DispatchAI.
//!
//! A [`DispatcherSession`] receives alert and camera-roster events on the
//! shared dispatcher channel and emits operator decisions. It owns the
//! [`CameraRoster`] and the [`AlertStore`]; both are mutated only by
//! inbound events and explicit operator decisions.

pub mod alerts;
pub mod roster;
pub mod session;

pub use alerts::AlertStore;
pub use roster::CameraRoster;
pub use session::DispatcherSession;
