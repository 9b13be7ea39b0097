use thiserror::Error;

/// Failures raised by the poll store, the local mirror and the reconciler.
///
/// None of these are fatal to a consuming view: each one degrades to a
/// visible state (error banner, stale-data banner or "no data").
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Network or service failure on list/get/results.
    #[error("poll store unavailable: {0}")]
    RemoteUnavailable(String),

    /// The requested poll id does not exist.
    #[error("poll not found: {0}")]
    NotFound(String),

    /// The persisted snapshot does not parse as a sequence of polls.
    #[error("cached snapshot is malformed: {0}")]
    MalformedCache(String),

    /// The store refused or failed to delete a poll.
    #[error("failed to delete poll {id}: {reason}")]
    DeleteFailed { id: String, reason: String },

    /// The persistent slot could not be read or written.
    #[error("local cache unavailable: {0}")]
    CacheUnavailable(String),
}

impl SyncError {
    pub fn remote(err: impl std::fmt::Display) -> Self {
        SyncError::RemoteUnavailable(err.to_string())
    }

    pub fn cache(err: impl std::fmt::Display) -> Self {
        SyncError::CacheUnavailable(err.to_string())
    }
}
