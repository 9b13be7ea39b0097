pub mod http;
pub mod memory;

use async_trait::async_trait;

use crate::error::SyncError;
use crate::poll::{Poll, PollFilters, Stats};

/// Read/delete access to the authoritative remote collection of polls.
///
/// Implementations never retry: a failed call is reported once and the
/// reconciler decides how to degrade.
#[async_trait]
pub trait PollStore: Send + Sync {
    /// Human-readable backend name (e.g., "http", "memory").
    fn backend_name(&self) -> &str;

    /// List polls matching `filters`. Ordering is whatever the store returns.
    async fn list(&self, filters: &PollFilters) -> Result<Vec<Poll>, SyncError>;

    /// Fetch a single poll, failing with `NotFound` when absent.
    async fn get(&self, id: &str) -> Result<Poll, SyncError>;

    /// Fetch the dedicated results for one poll.
    async fn results(&self, id: &str) -> Result<Stats, SyncError>;

    /// Delete a poll. Any failure is reported as `DeleteFailed`.
    async fn remove(&self, id: &str) -> Result<(), SyncError>;
}

pub use http::HttpPollStore;
pub use memory::MemoryPollStore;
