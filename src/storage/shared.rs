//! One persistent key shared by several execution contexts in a process.
//!
//! Each context (an open view) gets its own [`SlotContext`] handle. A write
//! through one handle is announced to every other handle's subscription,
//! never to the writer's own.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{ContextId, LocalMirror, SlotChange, SlotSubscription, EXTERNAL_CONTEXT};
use crate::error::SyncError;

const SIGNAL_CAPACITY: usize = 16;

struct SlotInner {
    value: Mutex<Option<String>>,
    tx: broadcast::Sender<SlotChange>,
    next_context: AtomicU64,
    suppressed: AtomicBool,
}

#[derive(Clone)]
pub struct SharedSlot {
    inner: Arc<SlotInner>,
}

impl Default for SharedSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedSlot {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self {
            inner: Arc::new(SlotInner {
                value: Mutex::new(None),
                tx,
                next_context: AtomicU64::new(EXTERNAL_CONTEXT + 1),
                suppressed: AtomicBool::new(false),
            }),
        }
    }

    /// Open a handle for a new execution context.
    pub fn context(&self) -> SlotContext {
        let id = self.inner.next_context.fetch_add(1, Ordering::SeqCst);
        SlotContext {
            slot: self.clone(),
            id,
        }
    }

    /// Stop (or resume) delivering change signals. Writes still land.
    pub fn suppress_signals(&self, suppressed: bool) {
        self.inner.suppressed.store(suppressed, Ordering::SeqCst);
    }

    /// Current raw value.
    pub fn raw(&self) -> Result<Option<String>, SyncError> {
        let value = self.inner.value.lock().map_err(SyncError::cache)?;
        Ok(value.clone())
    }

    /// Store `value` on behalf of `origin`, signalling if it changed.
    pub fn store(&self, origin: ContextId, value: Option<String>) -> Result<(), SyncError> {
        let old = {
            let mut slot = self.inner.value.lock().map_err(SyncError::cache)?;
            if *slot == value {
                return Ok(());
            }
            std::mem::replace(&mut *slot, value.clone())
        };
        if !self.inner.suppressed.load(Ordering::SeqCst) {
            let _ = self.inner.tx.send(SlotChange {
                origin,
                old,
                new: value,
            });
        }
        Ok(())
    }
}

/// A context's view of a [`SharedSlot`].
pub struct SlotContext {
    slot: SharedSlot,
    id: ContextId,
}

impl SlotContext {
    pub fn id(&self) -> ContextId {
        self.id
    }
}

#[async_trait]
impl LocalMirror for SlotContext {
    fn backend_name(&self) -> &str {
        "shared"
    }

    async fn read_raw(&self) -> Result<Option<String>, SyncError> {
        self.slot.raw()
    }

    async fn write_raw(&self, value: String) -> Result<(), SyncError> {
        self.slot.store(self.id, Some(value))
    }

    fn subscribe(&self) -> SlotSubscription {
        SlotSubscription::new(self.slot.inner.tx.subscribe(), Some(self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::sample_poll;

    #[tokio::test]
    async fn test_write_signals_other_contexts_only() {
        let slot = SharedSlot::new();
        let a = slot.context();
        let b = slot.context();
        assert_ne!(a.id(), b.id());

        let mut a_sub = a.subscribe();
        let mut b_sub = b.subscribe();

        let polls = vec![sample_poll("1", &[5])];
        a.write(&polls).await.unwrap();

        let change = b_sub.try_recv().expect("b should be signalled");
        assert_eq!(change.origin, a.id());
        assert!(change.old.is_none());
        assert_eq!(change.snapshot().unwrap(), polls);
        assert!(a_sub.try_recv().is_none());

        assert_eq!(b.read().await, polls);
    }

    #[tokio::test]
    async fn test_unchanged_value_does_not_signal() {
        let slot = SharedSlot::new();
        let a = slot.context();
        let b = slot.context();
        let mut b_sub = b.subscribe();

        let polls = vec![sample_poll("1", &[5])];
        a.write(&polls).await.unwrap();
        a.write(&polls).await.unwrap();

        assert!(b_sub.try_recv().is_some());
        assert!(b_sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_suppressed_signals_still_store() {
        let slot = SharedSlot::new();
        let a = slot.context();
        let b = slot.context();
        let mut b_sub = b.subscribe();

        slot.suppress_signals(true);
        a.write(&[sample_poll("1", &[1])]).await.unwrap();

        assert!(b_sub.try_recv().is_none());
        assert_eq!(b.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_value_reads_empty() {
        let slot = SharedSlot::new();
        slot.store(EXTERNAL_CONTEXT, Some("[{\"broken\":true}]".to_string())).unwrap();
        assert!(slot.context().read().await.is_empty());
    }
}
