//! Change notifications for the poll collection.
//!
//! Two delivery paths converge on a single [`ChangeListener`]:
//!
//! - the in-process `polls-updated` signal, where any collaborator publishes
//!   a full replacement collection (never a diff);
//! - the cross-context slot signal, raised when another context overwrites
//!   the persistent slot behind the local mirror.

use tokio::sync::broadcast;

use crate::poll::Poll;
use crate::storage::{LocalMirror, SlotChange, SlotSubscription};

/// Name of the in-process event.
pub const POLLS_UPDATED: &str = "polls-updated";

const DEFAULT_CAPACITY: usize = 16;

/// In-process publish/subscribe signal carrying full replacement collections.
#[derive(Clone)]
pub struct ChangeChannel {
    tx: broadcast::Sender<Vec<Poll>>,
}

impl Default for ChangeChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ChangeChannel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish a replacement collection. Returns how many listeners got it.
    pub fn publish(&self, polls: Vec<Poll>) -> usize {
        let count = polls.len();
        match self.tx.send(polls) {
            Ok(listeners) => {
                tracing::debug!("{}: {} polls to {} listeners", POLLS_UPDATED, count, listeners);
                listeners
            }
            Err(_) => 0,
        }
    }

    /// Listen on both the in-process signal and `mirror`'s slot signal.
    pub fn listen(&self, mirror: &dyn LocalMirror) -> ChangeListener {
        ChangeListener {
            published: self.tx.subscribe(),
            slot: mirror.subscribe(),
        }
    }
}

/// A notification delivered to a listener.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    Published(Vec<Poll>),
    SlotChanged(SlotChange),
}

pub struct ChangeListener {
    published: broadcast::Receiver<Vec<Poll>>,
    slot: SlotSubscription,
}

impl ChangeListener {
    /// Wait for the next notification from either path. `None` once both
    /// sources are closed.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        let mut published_open = true;
        let mut slot_open = true;
        loop {
            if !published_open && !slot_open {
                return None;
            }
            tokio::select! {
                result = self.published.recv(), if published_open => match result {
                    Ok(polls) => return Some(ChangeEvent::Published(polls)),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("{} listener lagged, {} updates skipped", POLLS_UPDATED, n);
                    }
                    Err(broadcast::error::RecvError::Closed) => published_open = false,
                },
                change = self.slot.recv(), if slot_open => match change {
                    Some(change) => return Some(ChangeEvent::SlotChanged(change)),
                    None => slot_open = false,
                },
            }
        }
    }

    /// Next notification if one is already queued.
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.published.try_recv() {
                Ok(polls) => return Some(ChangeEvent::Published(polls)),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    tracing::warn!("{} listener lagged, {} updates skipped", POLLS_UPDATED, n);
                }
                Err(_) => break,
            }
        }
        self.slot.try_recv().map(ChangeEvent::SlotChanged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::sample_poll;
    use crate::storage::SharedSlot;

    #[tokio::test]
    async fn test_published_collection_reaches_listener() {
        let channel = ChangeChannel::default();
        let slot = SharedSlot::new();
        let mirror = slot.context();
        let mut listener = channel.listen(&mirror);

        let polls = vec![sample_poll("1", &[1])];
        assert_eq!(channel.publish(polls.clone()), 1);

        assert_eq!(listener.recv().await, Some(ChangeEvent::Published(polls)));
    }

    #[tokio::test]
    async fn test_slot_change_reaches_listener() {
        let channel = ChangeChannel::default();
        let slot = SharedSlot::new();
        let mine = slot.context();
        let theirs = slot.context();
        let mut listener = channel.listen(&mine);

        theirs.write(&[sample_poll("2", &[2])]).await.unwrap();

        match listener.try_recv() {
            Some(ChangeEvent::SlotChanged(change)) => assert_eq!(change.origin, theirs.id()),
            other => panic!("expected slot change, got {:?}", other),
        }
        assert!(listener.try_recv().is_none());
    }

    #[test]
    fn test_publish_without_listeners() {
        let channel = ChangeChannel::new(0);
        assert_eq!(channel.publish(Vec::new()), 0);
    }
}
