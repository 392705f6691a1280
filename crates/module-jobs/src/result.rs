//! Sync outcome reported to the caller.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// A Job was created during this sync
    Created,
    /// A Job is running, or was just deleted to be replaced
    InProgress,
    /// The Job finished successfully
    Completed,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncStatus::Created => "created",
            SyncStatus::InProgress => "in progress",
            SyncStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Result of one sync: what state the unit is in, and whether to sync it again.
///
/// `Completed` with `requeue == false` is the only terminal success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncResult {
    pub status: SyncStatus,
    pub requeue: bool,
}

impl SyncResult {
    pub fn created() -> Self {
        Self { status: SyncStatus::Created, requeue: true }
    }

    pub fn in_progress() -> Self {
        Self { status: SyncStatus::InProgress, requeue: true }
    }

    pub fn completed() -> Self {
        Self { status: SyncStatus::Completed, requeue: false }
    }
}
