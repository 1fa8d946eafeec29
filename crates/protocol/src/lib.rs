//! Wire protocol for DispatchAI camera and dispatcher channels.
//!
//! All payloads are UTF-8 JSON objects discriminated by a `type` field.
//! Each channel direction gets its own message union so a session only
//! accepts the types defined for its role; everything else fails decode
//! and is discarded by the caller.

pub mod alert;
pub mod codec;
pub mod constants;
pub mod messages;

pub use alert::{AgentKind, AgentReport, Alert, AlertStatus, Classification, ClipInfo};
pub use codec::{DecodeError, decode, encode};
pub use messages::{CameraInbound, CameraOutbound, Decision, DecisionMessage, DispatcherInbound};
