//! Loss handling and the reconnect loop.
//!
//! A lost connection schedules exactly one reconnect task, guarded by a
//! cancellation token stored in a single slot on the supervisor. Explicit
//! teardown cancels the token, so a timer that fires after teardown is a
//! no-op.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::link::DisconnectHandler;
use crate::supervisor::Shared;
use crate::types::{ConnectionEvent, SupervisorState};

/// Cancels any pending reconnect and clears the slot.
pub(crate) fn cancel_pending_reconnect(slot: &std::sync::Mutex<Option<CancellationToken>>) {
    if let Ok(mut guard) = slot.lock()
        && let Some(token) = guard.take()
    {
        token.cancel();
    }
}

/// Builds the disconnect callback installed on each new link.
pub(crate) fn disconnect_handler(shared: Arc<Shared>) -> DisconnectHandler {
    Arc::new(tokio::sync::Mutex::new(Some(Box::new(move || {
        on_connection_lost(&shared);
    }))))
}

/// Handles loss of the live link: transitions to `Closed` and schedules a
/// reconnect, unless the supervisor was explicitly torn down.
pub(crate) fn on_connection_lost(shared: &Arc<Shared>) {
    if shared.closed.load(Ordering::Relaxed) {
        debug!(endpoint = %shared.endpoint, "link ended after teardown — not reconnecting");
        return;
    }

    warn!(endpoint = %shared.endpoint, "connection lost");
    shared.set_state(SupervisorState::Closed);
    schedule_reconnect(shared.clone());
}

/// Schedules exactly one reconnect loop, replacing any pending one.
pub(crate) fn schedule_reconnect(shared: Arc<Shared>) {
    let cancel = CancellationToken::new();
    cancel_pending_reconnect(&shared.reconnect_cancel);
    if let Ok(mut guard) = shared.reconnect_cancel.lock() {
        *guard = Some(cancel.clone());
    }
    tokio::spawn(reconnect_loop(shared, cancel));
}

/// Reconnect loop with exponential backoff.
///
/// The attempt counter lives on the supervisor so the Nth scheduled
/// reconnect waits `min(base * 2^N, cap)`; a successful dial resets it.
pub(crate) async fn reconnect_loop(shared: Arc<Shared>, cancel: CancellationToken) {
    loop {
        let attempt = shared.attempt.load(Ordering::Relaxed);
        let delay = shared.backoff.delay_for(attempt);

        shared.set_state(SupervisorState::Reconnecting { attempt });
        shared.emit(ConnectionEvent::ReconnectScheduled { attempt, delay });
        info!(
            endpoint = %shared.endpoint,
            attempt,
            delay_ms = delay.as_millis() as u64,
            "reconnecting"
        );

        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(endpoint = %shared.endpoint, "reconnect cancelled");
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }

        if cancel.is_cancelled() || shared.closed.load(Ordering::Relaxed) {
            return;
        }

        shared.attempt.store(attempt.saturating_add(1), Ordering::Relaxed);

        match shared.dial().await {
            Ok(()) => {
                // A teardown during the dial leaves the state Closed with
                // the fresh link already discarded.
                if shared.closed.load(Ordering::Relaxed) {
                    return;
                }
                info!(endpoint = %shared.endpoint, "reconnected");
                break;
            }
            Err(e) => {
                warn!(
                    endpoint = %shared.endpoint,
                    attempt,
                    error = %e,
                    "reconnect attempt failed"
                );
                // Next iteration waits with increased backoff.
            }
        }

        if cancel.is_cancelled() {
            return;
        }
    }

    // Successful exit — clear the slot if the token is still ours.
    if let Ok(mut guard) = shared.reconnect_cancel.lock()
        && guard.as_ref().is_some_and(|t| !t.is_cancelled())
    {
        *guard = None;
    }
}
