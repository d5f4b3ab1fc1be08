//! Shared sync state reported to front ends.

use std::fmt;

/// Where the local queue stands relative to the remote store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncState {
    /// No authenticated user, nothing can be flushed.
    #[default]
    Offline,
    Syncing,
    Synced,
    /// The last flush left at least one entry queued.
    Error,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Offline => "offline",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}
