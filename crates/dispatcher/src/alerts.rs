//! Ordered registry of alerts awaiting operator review.

use dispatchai_protocol::{Alert, AlertStatus};

/// Client-side registry of pending alerts, most recently inserted first.
///
/// An alert enters at `PENDING_REVIEW` and leaves through exactly one
/// terminal decision; once removed it never re-enters.
#[derive(Debug, Default)]
pub struct AlertStore {
    active: Vec<Alert>,
}

impl AlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepends the alert unless one with the same id is already present
    /// (duplicate delivery happens after a dispatcher reconnect). Returns
    /// whether the alert was added.
    pub fn insert(&mut self, mut alert: Alert) -> bool {
        if self.active.iter().any(|a| a.id == alert.id) {
            return false;
        }
        alert.status = AlertStatus::PendingReview;
        self.active.insert(0, alert);
        true
    }

    /// Removes and returns the alert with `id`, stamped with its terminal
    /// status. `None` when no such alert is active.
    pub fn take(&mut self, id: &str, status: AlertStatus) -> Option<Alert> {
        let pos = self.active.iter().position(|a| a.id == id)?;
        let mut alert = self.active.remove(pos);
        alert.status = status;
        Some(alert)
    }

    /// All pending alerts, most recently inserted first.
    pub fn pending(&self) -> Vec<Alert> {
        self.active.clone()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.active.iter().any(|a| a.id == id)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
