//! Dispatcher-side view of which cameras hold an open connection.

use std::collections::BTreeSet;

/// Set of connected camera ids, as observed on the dispatcher channel.
///
/// Deltas are idempotent; a `camera_list` snapshot is authoritative and
/// fully replaces the set.
#[derive(Debug, Default)]
pub struct CameraRoster {
    cameras: BTreeSet<String>,
}

impl CameraRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a connect delta. Returns whether the id was newly added.
    pub fn mark_connected(&mut self, camera_id: &str) -> bool {
        self.cameras.insert(camera_id.to_string())
    }

    /// Applies a disconnect delta. Returns whether the id was present.
    pub fn mark_disconnected(&mut self, camera_id: &str) -> bool {
        self.cameras.remove(camera_id)
    }

    /// Replaces the whole roster with an authoritative snapshot.
    pub fn replace(&mut self, cameras: Vec<String>) {
        self.cameras = cameras.into_iter().collect();
    }

    pub fn contains(&self, camera_id: &str) -> bool {
        self.cameras.contains(camera_id)
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    /// Sorted snapshot of the roster.
    pub fn snapshot(&self) -> Vec<String> {
        self.cameras.iter().cloned().collect()
    }
}
