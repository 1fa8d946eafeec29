//! Camera-role session for DispatchAI.
//!
//! A [`CameraSession`] pushes scene descriptions upstream over one
//! supervised WebSocket and answers clip requests; [`DescriptionFeed`]
//! adapts an external scene-description generator to that session.

pub mod feed;
pub mod session;

pub use feed::{DescribeFuture, DescriptionFeed, DescriptionSource};
pub use session::CameraSession;
