//! Fixed-cadence adapter between an external scene-description generator
//! and a camera session.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::session::CameraSession;

/// Boxed future returned by [`DescriptionSource::describe`].
pub type DescribeFuture<'a> = Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>>;

/// External scene-description generator.
///
/// Implementations wrap whatever produces natural-language narration from
/// frames; `None` means the scene has nothing new to report this tick.
pub trait DescriptionSource: Send + Sync + 'static {
    fn describe(&self) -> DescribeFuture<'_>;
}

/// Polls a [`DescriptionSource`] on a fixed cadence and pushes each
/// produced description through the session.
///
/// `start` while running is a no-op; `stop` is idempotent and takes effect
/// synchronously via the cancellation token, so a tick that fires after
/// `stop` does nothing.
pub struct DescriptionFeed {
    session: Arc<CameraSession>,
    running: std::sync::Mutex<Option<CancellationToken>>,
}

impl DescriptionFeed {
    pub fn new(session: Arc<CameraSession>) -> Self {
        Self {
            session,
            running: std::sync::Mutex::new(None),
        }
    }

    /// Starts polling `source` every `interval`.
    pub fn start(&self, interval: Duration, source: Arc<dyn DescriptionSource>) {
        let mut guard = match self.running.lock() {
            Ok(g) => g,
            Err(_) => return,
        };
        if guard.as_ref().is_some_and(|t| !t.is_cancelled()) {
            debug!(camera = %self.session.camera_id(), "description feed already running");
            return;
        }

        let cancel = CancellationToken::new();
        *guard = Some(cancel.clone());
        tokio::spawn(feed_loop(self.session.clone(), source, interval, cancel));
    }

    /// Stops the feed.
    pub fn stop(&self) {
        if let Ok(mut guard) = self.running.lock()
            && let Some(token) = guard.take()
        {
            token.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .map(|g| g.as_ref().is_some_and(|t| !t.is_cancelled()))
            .unwrap_or(false)
    }
}

async fn feed_loop(
    session: Arc<CameraSession>,
    source: Arc<dyn DescriptionSource>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await; // Skip immediate first tick.

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if let Some(description) = source.describe().await
                    && !session.send_description(&description, None)
                {
                    debug!(camera = %session.camera_id(), "channel closed — description dropped");
                }
            }
        }
    }
}
