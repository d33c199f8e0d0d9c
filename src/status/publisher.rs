//! Shared latest-snapshot record: one writer (the control loop), many readers.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::control::types::ControlSnapshot;

/// Cloneable handle to the latest snapshot. Writes replace the whole value.
#[derive(Debug, Clone, Default)]
pub struct SnapshotPublisher {
    latest: Arc<RwLock<ControlSnapshot>>,
}

impl SnapshotPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, snapshot: ControlSnapshot) {
        *self.latest.write() = snapshot;
    }

    pub fn latest(&self) -> ControlSnapshot {
        self.latest.read().clone()
    }
}
