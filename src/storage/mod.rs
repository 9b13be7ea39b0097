//! Local persistent snapshot of the poll collection.
//!
//! - [`FileMirror`]: one JSON file, watched for writes by other processes
//! - [`SharedSlot`]: one in-memory slot shared by several in-process contexts
//!
//! Both hold a single key whose value is the JSON-serialized poll sequence.
//! Every write replaces the whole value. A change made by one context is
//! announced to the others through a [`SlotSubscription`].

pub mod local;
pub mod shared;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::SyncError;
use crate::poll::Poll;

pub use local::FileMirror;
pub use shared::{SharedSlot, SlotContext};

/// Identifies the execution context that wrote the slot.
pub type ContextId = u64;

/// Origin used for writes made outside this process.
pub const EXTERNAL_CONTEXT: ContextId = 0;

/// Cross-context signal: the slot's stored value changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotChange {
    pub origin: ContextId,
    pub old: Option<String>,
    pub new: Option<String>,
}

impl SlotChange {
    /// Decode the new value. A cleared slot decodes as an empty snapshot.
    pub fn snapshot(&self) -> Result<Vec<Poll>, SyncError> {
        match self.new {
            Some(ref raw) => parse_snapshot(raw),
            None => Ok(Vec::new()),
        }
    }
}

/// Receives slot changes made by every context except the subscriber's own.
pub struct SlotSubscription {
    rx: broadcast::Receiver<SlotChange>,
    own: Option<ContextId>,
}

impl SlotSubscription {
    pub fn new(rx: broadcast::Receiver<SlotChange>, own: Option<ContextId>) -> Self {
        Self { rx, own }
    }

    fn is_foreign(&self, change: &SlotChange) -> bool {
        self.own != Some(change.origin)
    }

    /// Wait for the next foreign change. `None` once the slot is gone.
    pub async fn recv(&mut self) -> Option<SlotChange> {
        loop {
            match self.rx.recv().await {
                Ok(change) if self.is_foreign(&change) => return Some(change),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Slot subscription lagged, {} changes skipped", n);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next foreign change if one is already queued.
    pub fn try_recv(&mut self) -> Option<SlotChange> {
        loop {
            match self.rx.try_recv() {
                Ok(change) if self.is_foreign(&change) => return Some(change),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    tracing::warn!("Slot subscription lagged, {} changes skipped", n);
                }
                Err(_) => return None,
            }
        }
    }
}

/// Parse a persisted value as a poll sequence.
pub fn parse_snapshot(raw: &str) -> Result<Vec<Poll>, SyncError> {
    serde_json::from_str(raw).map_err(|e| SyncError::MalformedCache(e.to_string()))
}

/// Access to the persistent slot holding the last full snapshot.
#[async_trait]
pub trait LocalMirror: Send + Sync {
    /// Human-readable backend name (e.g., "file", "shared").
    fn backend_name(&self) -> &str;

    /// Raw stored value, `None` if the slot was never written.
    async fn read_raw(&self) -> Result<Option<String>, SyncError>;

    /// Replace the stored value wholesale.
    async fn write_raw(&self, value: String) -> Result<(), SyncError>;

    /// Subscribe to changes made by other contexts.
    fn subscribe(&self) -> SlotSubscription;

    /// Last snapshot, or empty. Unreadable or malformed slots are logged
    /// and read as empty.
    async fn read(&self) -> Vec<Poll> {
        match self.read_raw().await {
            Ok(Some(raw)) => match parse_snapshot(&raw) {
                Ok(polls) => polls,
                Err(e) => {
                    tracing::warn!("Ignoring {} cache: {}", self.backend_name(), e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Could not read {} cache: {}", self.backend_name(), e);
                Vec::new()
            }
        }
    }

    /// Persist the entire collection, replacing the previous snapshot.
    async fn write(&self, snapshot: &[Poll]) -> Result<(), SyncError> {
        let value = serde_json::to_string(snapshot).map_err(SyncError::cache)?;
        self.write_raw(value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::sample_poll;

    #[test]
    fn test_parse_snapshot_rejects_non_sequence() {
        assert!(matches!(
            parse_snapshot("{\"id\":\"1\"}"),
            Err(SyncError::MalformedCache(_))
        ));
        assert!(matches!(parse_snapshot("not json"), Err(SyncError::MalformedCache(_))));
        assert_eq!(parse_snapshot("[]").unwrap(), Vec::<Poll>::new());
    }

    #[test]
    fn test_slot_change_snapshot() {
        let polls = vec![sample_poll("1", &[1, 2])];
        let change = SlotChange {
            origin: EXTERNAL_CONTEXT,
            old: None,
            new: Some(serde_json::to_string(&polls).unwrap()),
        };
        assert_eq!(change.snapshot().unwrap(), polls);

        let cleared = SlotChange {
            origin: EXTERNAL_CONTEXT,
            old: change.new.clone(),
            new: None,
        };
        assert!(cleared.snapshot().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_subscription_skips_own_origin() {
        let (tx, rx) = broadcast::channel(8);
        let mut sub = SlotSubscription::new(rx, Some(3));
        let own = SlotChange { origin: 3, old: None, new: Some("[]".to_string()) };
        let other = SlotChange { origin: 4, old: None, new: Some("[]".to_string()) };
        tx.send(own).unwrap();
        tx.send(other.clone()).unwrap();

        assert_eq!(sub.try_recv(), Some(other));
        assert_eq!(sub.try_recv(), None);
    }
}
