//! Owns the authoritative in-memory view of the poll collection.
//!
//! Four sources feed it, all funnelled through [`Reconciler::apply`]:
//!
//! - list fetches started by [`Reconciler::set_filters`] / [`Reconciler::refresh`]
//! - the in-process `polls-updated` signal
//! - the cross-context slot signal
//! - the reconciliation tick, which re-reads the local mirror and catches
//!   any change the two signals failed to deliver
//!
//! There is no version counter: whichever replacement is applied last wins.

pub mod tick;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::channel::{ChangeChannel, ChangeEvent, ChangeListener};
use crate::error::SyncError;
use crate::poll::{Poll, PollFilters};
use crate::service::PollStore;
use crate::storage::LocalMirror;

pub use tick::ReconcileTick;

/// What the consuming view should render.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncState {
    Loading,
    /// Fresh (or freshly replaced) data. `error` is set when the store failed
    /// and there was no cache to fall back on.
    Ready {
        polls: Vec<Poll>,
        error: Option<SyncError>,
    },
    /// Cached data shown because the store failed.
    Degraded { polls: Vec<Poll>, error: SyncError },
}

impl SyncState {
    pub fn polls(&self) -> &[Poll] {
        match self {
            SyncState::Loading => &[],
            SyncState::Ready { polls, .. } | SyncState::Degraded { polls, .. } => polls,
        }
    }

    pub fn error(&self) -> Option<&SyncError> {
        match self {
            SyncState::Loading => None,
            SyncState::Ready { error, .. } => error.as_ref(),
            SyncState::Degraded { error, .. } => Some(error),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SyncState::Loading)
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, SyncState::Degraded { .. })
    }

    /// Swap the data, keeping the state kind. Loading becomes Ready.
    fn replace_data(&mut self, replacement: Vec<Poll>) {
        match self {
            SyncState::Loading => {
                *self = SyncState::Ready {
                    polls: replacement,
                    error: None,
                }
            }
            SyncState::Ready { polls, .. } | SyncState::Degraded { polls, .. } => *polls = replacement,
        }
    }

    fn retain(&mut self, keep: impl Fn(&Poll) -> bool) {
        if let SyncState::Ready { polls, .. } | SyncState::Degraded { polls, .. } = self {
            polls.retain(|p| keep(p));
        }
    }
}

/// Result of a list fetch, tagged with the filter generation that started it.
#[derive(Debug)]
pub struct FetchOutcome {
    pub generation: u64,
    pub filters: PollFilters,
    pub result: Result<Vec<Poll>, SyncError>,
}

#[derive(Debug)]
pub enum SyncEvent {
    Fetched(FetchOutcome),
    Changed(ChangeEvent),
    Tick,
}

pub struct Reconciler {
    store: Arc<dyn PollStore>,
    mirror: Arc<dyn LocalMirror>,
    channel: ChangeChannel,
    listener: ChangeListener,
    state: SyncState,
    filters: PollFilters,
    /// Bumped on every fetch start; older outcomes are discarded.
    generation: u64,
    fetching: bool,
    /// Mirror content this reconciler last wrote or observed. The tick only
    /// acts when the mirror has moved on from it.
    mirror_seen: Option<Vec<Poll>>,
    /// Deleted ids the mirror still holds because the write after the
    /// delete failed. Retried on every tick.
    pending_removals: HashSet<String>,
    fetch_tx: mpsc::UnboundedSender<FetchOutcome>,
    fetch_rx: mpsc::UnboundedReceiver<FetchOutcome>,
    tick: ReconcileTick,
    tick_rx: mpsc::Receiver<Instant>,
}

impl Reconciler {
    /// Create a reconciler and start its tick. Nothing is fetched until
    /// [`set_filters`](Self::set_filters) or [`refresh`](Self::refresh).
    pub fn new(
        store: Arc<dyn PollStore>,
        mirror: Arc<dyn LocalMirror>,
        channel: ChangeChannel,
        tick_period: Duration,
    ) -> Self {
        let listener = channel.listen(mirror.as_ref());
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        let (tick, tick_rx) = ReconcileTick::spawn(tick_period);
        tracing::debug!(
            "Reconciler using {} store, {} mirror, tick every {:?}",
            store.backend_name(),
            mirror.backend_name(),
            tick_period
        );
        Self {
            store,
            mirror,
            channel,
            listener,
            state: SyncState::Loading,
            filters: PollFilters::default(),
            generation: 0,
            fetching: false,
            mirror_seen: None,
            pending_removals: HashSet::new(),
            fetch_tx,
            fetch_rx,
            tick,
            tick_rx,
        }
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn polls(&self) -> &[Poll] {
        self.state.polls()
    }

    pub fn filters(&self) -> &PollFilters {
        &self.filters
    }

    pub fn store(&self) -> &Arc<dyn PollStore> {
        &self.store
    }

    /// Handle for publishing replacement collections in-process.
    pub fn channel(&self) -> &ChangeChannel {
        &self.channel
    }

    /// Whether the fetch for the current filters has not resolved yet.
    pub fn is_fetching(&self) -> bool {
        self.fetching
    }

    pub fn is_ticking(&self) -> bool {
        !self.tick.is_finished()
    }

    /// Apply new filters and start over with a fresh fetch.
    pub fn set_filters(&mut self, filters: PollFilters) {
        self.filters = filters;
        self.refresh();
    }

    /// Start a list fetch for the current filters. Any fetch still in
    /// flight becomes stale.
    pub fn refresh(&mut self) {
        self.generation += 1;
        self.fetching = true;
        self.state = SyncState::Loading;

        let store = Arc::clone(&self.store);
        let tx = self.fetch_tx.clone();
        let filters = self.filters.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let result = store.list(&filters).await;
            let _ = tx.send(FetchOutcome {
                generation,
                filters,
                result,
            });
        });
    }

    /// Wait for the next event from any source.
    pub async fn next_event(&mut self) -> Option<SyncEvent> {
        tokio::select! {
            Some(outcome) = self.fetch_rx.recv() => Some(SyncEvent::Fetched(outcome)),
            Some(change) = self.listener.recv() => Some(SyncEvent::Changed(change)),
            Some(_) = self.tick_rx.recv() => Some(SyncEvent::Tick),
            else => None,
        }
    }

    /// Next event if one is already queued.
    pub fn try_next_event(&mut self) -> Option<SyncEvent> {
        if let Ok(outcome) = self.fetch_rx.try_recv() {
            return Some(SyncEvent::Fetched(outcome));
        }
        if let Some(change) = self.listener.try_recv() {
            return Some(SyncEvent::Changed(change));
        }
        if self.tick_rx.try_recv().is_ok() {
            return Some(SyncEvent::Tick);
        }
        None
    }

    /// Wait for one event and apply it. Returns whether the state changed,
    /// or `None` when every source has closed.
    pub async fn process_next(&mut self) -> Option<bool> {
        let event = self.next_event().await?;
        Some(self.apply(event).await)
    }

    /// Apply every event that is already queued. Returns how many changed
    /// the state.
    pub async fn drain_ready(&mut self) -> usize {
        let mut changed = 0;
        while let Some(event) = self.try_next_event() {
            if self.apply(event).await {
                changed += 1;
            }
        }
        changed
    }

    /// Apply one event. Returns whether the state changed.
    pub async fn apply(&mut self, event: SyncEvent) -> bool {
        match event {
            SyncEvent::Fetched(outcome) => self.apply_fetch(outcome).await,
            SyncEvent::Changed(ChangeEvent::Published(polls)) => self.replace(polls, "in-process signal"),
            SyncEvent::Changed(ChangeEvent::SlotChanged(change)) => match change.snapshot() {
                Ok(polls) => {
                    self.mirror_seen = Some(polls.clone());
                    self.replace(polls, "slot signal")
                }
                Err(e) => {
                    tracing::warn!("Ignoring slot change from context {}: {}", change.origin, e);
                    false
                }
            },
            SyncEvent::Tick => {
                self.retry_pending_removals().await;
                let cached = self.mirror.read().await;
                if self.mirror_seen.as_ref() == Some(&cached) {
                    return false;
                }
                self.mirror_seen = Some(cached.clone());
                if cached.as_slice() != self.state.polls() {
                    self.replace(cached, "reconciliation tick")
                } else {
                    false
                }
            }
        }
    }

    async fn apply_fetch(&mut self, outcome: FetchOutcome) -> bool {
        if outcome.generation != self.generation {
            tracing::debug!(
                "Discarding stale fetch for filters '{}' (generation {} < {})",
                outcome.filters.describe(),
                outcome.generation,
                self.generation
            );
            return false;
        }

        self.fetching = false;
        self.state = match outcome.result {
            Ok(polls) => {
                if polls.is_empty() {
                    // An empty response may be transient; keep the last good snapshot.
                    tracing::debug!("Empty poll list, leaving cache untouched");
                    self.mirror_seen = Some(self.mirror.read().await);
                } else if self.write_mirror(&polls).await.is_ok() {
                    self.pending_removals.clear();
                }
                SyncState::Ready { polls, error: None }
            }
            Err(error) => {
                let cached = self.mirror.read().await;
                self.mirror_seen = Some(cached.clone());
                let cached = self.visible(cached);
                if cached.is_empty() {
                    tracing::warn!("Poll list failed with no cache to fall back on: {}", error);
                    SyncState::Ready {
                        polls: Vec::new(),
                        error: Some(error),
                    }
                } else {
                    tracing::warn!("Poll list failed, showing {} cached polls: {}", cached.len(), error);
                    SyncState::Degraded {
                        polls: cached,
                        error,
                    }
                }
            }
        };
        true
    }

    /// Replace the in-memory collection with a full replacement payload.
    fn replace(&mut self, polls: Vec<Poll>, source: &str) -> bool {
        let polls = self.visible(polls);
        if polls.is_empty() {
            tracing::debug!("Ignoring empty replacement from {}", source);
            return false;
        }
        if !self.state.is_loading() && self.state.polls() == polls.as_slice() {
            return false;
        }
        tracing::info!("Applying {} polls from {}", polls.len(), source);
        self.state.replace_data(polls);
        true
    }

    /// Delete a poll remotely, then drop it from memory and the mirror.
    /// On failure neither is touched.
    pub async fn remove(&mut self, id: &str) -> Result<(), SyncError> {
        if let Err(e) = self.store.remove(id).await {
            tracing::warn!("Delete of poll {} failed: {}", id, e);
            return Err(match e {
                SyncError::DeleteFailed { .. } => e,
                other => SyncError::DeleteFailed {
                    id: id.to_string(),
                    reason: other.to_string(),
                },
            });
        }

        self.state.retain(|p| p.id != id);
        self.pending_removals.insert(id.to_string());
        self.retry_pending_removals().await;
        tracing::info!("Deleted poll {}", id);
        Ok(())
    }

    /// Drop deleted polls from the mirror. Ids stay pending, and hidden from
    /// every replacement, until a write succeeds.
    async fn retry_pending_removals(&mut self) {
        if self.pending_removals.is_empty() {
            return;
        }
        let mut cached = self.mirror.read().await;
        let before = cached.len();
        cached.retain(|p| !self.pending_removals.contains(&p.id));
        if cached.len() == before {
            self.pending_removals.clear();
            return;
        }
        if self.write_mirror(&cached).await.is_ok() {
            self.pending_removals.clear();
        }
    }

    /// Write a full snapshot and remember what the mirror now holds.
    async fn write_mirror(&mut self, polls: &[Poll]) -> Result<(), SyncError> {
        match self.mirror.write(polls).await {
            Ok(()) => {
                self.mirror_seen = Some(polls.to_vec());
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Could not update poll cache: {}", e);
                self.mirror_seen = Some(self.mirror.read().await);
                Err(e)
            }
        }
    }

    /// Keep the polls the current filters select, minus pending deletions.
    fn visible(&self, mut polls: Vec<Poll>) -> Vec<Poll> {
        polls.retain(|p| self.filters.matches(p) && !self.pending_removals.contains(&p.id));
        polls
    }

    /// Stop the reconciliation tick. Call when the consuming view goes away.
    pub fn shutdown(&mut self) {
        self.tick.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::{sample_poll, PollStatus};
    use crate::service::MemoryPollStore;
    use crate::storage::{SharedSlot, SlotContext, SlotSubscription};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    const LONG_TICK: Duration = Duration::from_secs(3600);

    fn reconciler(store: &Arc<MemoryPollStore>, mirror: SlotContext, tick: Duration) -> Reconciler {
        Reconciler::new(
            Arc::clone(store) as Arc<dyn PollStore>,
            Arc::new(mirror),
            ChangeChannel::default(),
            tick,
        )
    }

    async fn settle(r: &mut Reconciler) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while r.is_fetching() {
                r.process_next().await;
            }
        })
        .await
        .expect("fetch should resolve");
    }

    /// Apply events as they arrive for `period`.
    async fn run_for(r: &mut Reconciler, period: Duration) {
        let _ = tokio::time::timeout(period, async {
            loop {
                r.process_next().await;
            }
        })
        .await;
    }

    /// Slot whose writes can be made to fail.
    struct FlakyMirror {
        inner: SlotContext,
        fail_writes: AtomicBool,
    }

    #[async_trait]
    impl LocalMirror for FlakyMirror {
        fn backend_name(&self) -> &str {
            "flaky"
        }

        async fn read_raw(&self) -> Result<Option<String>, SyncError> {
            self.inner.read_raw().await
        }

        async fn write_raw(&self, value: String) -> Result<(), SyncError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(SyncError::CacheUnavailable("disk full".to_string()));
            }
            self.inner.write_raw(value).await
        }

        fn subscribe(&self) -> SlotSubscription {
            self.inner.subscribe()
        }
    }

    fn ids(polls: &[Poll]) -> Vec<&str> {
        polls.iter().map(|p| p.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_successful_list_is_cached() {
        let polls = vec![sample_poll("1", &[1, 2]), sample_poll("2", &[3])];
        let store = Arc::new(MemoryPollStore::new(polls.clone()));
        let slot = SharedSlot::new();
        let mut r = reconciler(&store, slot.context(), LONG_TICK);

        r.set_filters(PollFilters::default());
        assert!(r.state().is_loading());
        settle(&mut r).await;

        assert_eq!(r.state(), &SyncState::Ready { polls: polls.clone(), error: None });
        assert_eq!(slot.context().read().await, polls);
    }

    #[tokio::test]
    async fn test_empty_list_keeps_existing_cache() {
        let cached = vec![sample_poll("old", &[9])];
        let store = Arc::new(MemoryPollStore::new(Vec::new()));
        let slot = SharedSlot::new();
        slot.context().write(&cached).await.unwrap();
        let mut r = reconciler(&store, slot.context(), LONG_TICK);

        r.refresh();
        settle(&mut r).await;

        assert_eq!(r.state(), &SyncState::Ready { polls: Vec::new(), error: None });
        assert_eq!(slot.context().read().await, cached);
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_cache() {
        let cached = vec![sample_poll("1", &[1]), sample_poll("2", &[2]), sample_poll("3", &[3])];
        let store = Arc::new(MemoryPollStore::demo());
        store.set_offline(true);
        let slot = SharedSlot::new();
        slot.context().write(&cached).await.unwrap();
        let mut r = reconciler(&store, slot.context(), LONG_TICK);

        r.refresh();
        settle(&mut r).await;

        assert!(r.state().is_degraded());
        assert_eq!(r.polls(), cached.as_slice());
        assert!(matches!(r.state().error(), Some(SyncError::RemoteUnavailable(_))));
    }

    #[tokio::test]
    async fn test_failure_without_cache_is_ready_with_error() {
        let store = Arc::new(MemoryPollStore::demo());
        store.set_offline(true);
        let slot = SharedSlot::new();
        let mut r = reconciler(&store, slot.context(), LONG_TICK);

        r.refresh();
        settle(&mut r).await;

        match r.state() {
            SyncState::Ready { polls, error } => {
                assert!(polls.is_empty());
                assert!(error.is_some());
            }
            other => panic!("expected Ready with error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_cache_treated_as_empty_on_failure() {
        let store = Arc::new(MemoryPollStore::demo());
        store.set_offline(true);
        let slot = SharedSlot::new();
        slot.store(crate::storage::EXTERNAL_CONTEXT, Some("[1, 2, 3]".to_string())).unwrap();
        let mut r = reconciler(&store, slot.context(), LONG_TICK);

        r.refresh();
        settle(&mut r).await;

        assert!(!r.state().is_degraded());
        assert!(r.polls().is_empty());
        assert!(r.state().error().is_some());
    }

    #[tokio::test]
    async fn test_stale_fetch_is_discarded() {
        let store = Arc::new(MemoryPollStore::demo());
        let active = PollFilters::with_status(PollStatus::Active);
        let upcoming = PollFilters::with_status(PollStatus::Upcoming);
        store.respond_with(active.clone(), vec![sample_poll("a", &[1])]).unwrap();
        store.respond_with(upcoming.clone(), vec![sample_poll("u", &[2])]).unwrap();
        let slot = SharedSlot::new();
        let mut r = reconciler(&store, slot.context(), LONG_TICK);

        r.set_filters(active);
        r.set_filters(upcoming.clone());

        // Both fetches resolve, in whichever order; only the second may land.
        let mut applied = 0;
        tokio::time::timeout(Duration::from_secs(2), async {
            let mut seen = 0;
            while seen < 2 {
                if let Some(SyncEvent::Fetched(outcome)) = r.next_event().await {
                    seen += 1;
                    if r.apply(SyncEvent::Fetched(outcome)).await {
                        applied += 1;
                    }
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(applied, 1);
        assert_eq!(r.filters(), &upcoming);
        assert_eq!(ids(r.polls()), vec!["u"]);
        assert_eq!(ids(&slot.context().read().await), vec!["u"]);
    }

    #[tokio::test]
    async fn test_remove_updates_memory_and_cache() {
        let store = Arc::new(MemoryPollStore::demo());
        let slot = SharedSlot::new();
        let mut r = reconciler(&store, slot.context(), LONG_TICK);
        r.refresh();
        settle(&mut r).await;
        assert!(r.polls().iter().any(|p| p.id == "2"));

        r.remove("2").await.unwrap();

        assert!(r.polls().iter().all(|p| p.id != "2"));
        assert!(slot.context().read().await.iter().all(|p| p.id != "2"));
        assert_eq!(r.polls().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_remove_touches_nothing() {
        let store = Arc::new(MemoryPollStore::demo());
        let slot = SharedSlot::new();
        let mut r = reconciler(&store, slot.context(), LONG_TICK);
        r.refresh();
        settle(&mut r).await;

        store.set_offline(true);
        let err = r.remove("2").await.unwrap_err();

        assert!(matches!(err, SyncError::DeleteFailed { ref id, .. } if id == "2"));
        assert!(r.polls().iter().any(|p| p.id == "2"));
        assert!(slot.context().read().await.iter().any(|p| p.id == "2"));
    }

    #[tokio::test]
    async fn test_published_replacement_keeps_state_kind() {
        let cached = vec![sample_poll("1", &[1])];
        let store = Arc::new(MemoryPollStore::demo());
        store.set_offline(true);
        let slot = SharedSlot::new();
        slot.context().write(&cached).await.unwrap();
        let mut r = reconciler(&store, slot.context(), LONG_TICK);
        r.refresh();
        settle(&mut r).await;
        assert!(r.state().is_degraded());

        let replacement = vec![sample_poll("5", &[5]), sample_poll("6", &[6])];
        r.channel().publish(replacement.clone());
        assert_eq!(r.drain_ready().await, 1);

        assert!(r.state().is_degraded());
        assert_eq!(r.polls(), replacement.as_slice());

        // Empty payloads are rejected
        r.channel().publish(Vec::new());
        assert_eq!(r.drain_ready().await, 0);
        assert_eq!(r.polls(), replacement.as_slice());
    }

    #[tokio::test]
    async fn test_slot_signal_from_other_context() {
        let store = Arc::new(MemoryPollStore::demo());
        let slot = SharedSlot::new();
        let other = slot.context();
        let mut r = reconciler(&store, slot.context(), LONG_TICK);
        r.refresh();
        settle(&mut r).await;

        let replacement = vec![sample_poll("x", &[1, 1])];
        other.write(&replacement).await.unwrap();
        assert!(r.process_next().await.unwrap());
        assert_eq!(r.polls(), replacement.as_slice());

        // Malformed values are ignored
        slot.store(other.id(), Some("not json".to_string())).unwrap();
        assert_eq!(r.drain_ready().await, 0);
        assert_eq!(r.polls(), replacement.as_slice());
    }

    #[tokio::test]
    async fn test_tick_converges_without_signals() {
        let store = Arc::new(MemoryPollStore::demo());
        let slot = SharedSlot::new();
        let tick = Duration::from_millis(20);
        let mut a = reconciler(&store, slot.context(), tick);
        a.refresh();
        settle(&mut a).await;
        let mut b = reconciler(&store, slot.context(), tick);
        b.refresh();
        settle(&mut b).await;
        assert_eq!(a.polls(), b.polls());

        slot.suppress_signals(true);
        a.remove("1").await.unwrap();
        assert_ne!(a.polls(), b.polls());

        tokio::time::timeout(tick * 10, async {
            while b.polls() != a.polls() {
                b.process_next().await;
            }
        })
        .await
        .expect("b should converge within a few ticks");
    }

    #[tokio::test]
    async fn test_tick_keeps_empty_filtered_result() {
        let store = Arc::new(MemoryPollStore::demo());
        let upcoming = PollFilters::with_status(PollStatus::Upcoming);
        store.respond_with(upcoming.clone(), Vec::new()).unwrap();
        let slot = SharedSlot::new();
        let mut r = reconciler(&store, slot.context(), Duration::from_millis(20));
        r.refresh();
        settle(&mut r).await;
        assert_eq!(r.polls().len(), 4);

        r.set_filters(upcoming.clone());
        settle(&mut r).await;
        assert!(r.polls().is_empty());

        run_for(&mut r, Duration::from_millis(150)).await;

        assert_eq!(r.filters(), &upcoming);
        assert_eq!(r.state(), &SyncState::Ready { polls: Vec::new(), error: None });
        // The earlier snapshot is still cached, just not shown.
        assert_eq!(slot.context().read().await.len(), 4);
    }

    #[tokio::test]
    async fn test_replacements_respect_filters() {
        let store = Arc::new(MemoryPollStore::demo());
        let slot = SharedSlot::new();
        let mut r = reconciler(&store, slot.context(), LONG_TICK);
        r.set_filters(PollFilters::with_status(PollStatus::Active));
        settle(&mut r).await;

        let mut closed = sample_poll("c", &[2]);
        closed.status = PollStatus::Inactive;
        r.channel().publish(vec![sample_poll("a", &[1]), closed.clone()]);
        assert_eq!(r.drain_ready().await, 1);
        assert_eq!(ids(r.polls()), vec!["a"]);

        // Nothing left after filtering: ignored like an empty payload
        r.channel().publish(vec![closed]);
        assert_eq!(r.drain_ready().await, 0);
        assert_eq!(ids(r.polls()), vec!["a"]);
    }

    #[tokio::test]
    async fn test_tick_cannot_undo_remove_when_cache_write_fails() {
        let store = Arc::new(MemoryPollStore::demo());
        let slot = SharedSlot::new();
        let mirror = Arc::new(FlakyMirror {
            inner: slot.context(),
            fail_writes: AtomicBool::new(false),
        });
        let mut r = Reconciler::new(
            Arc::clone(&store) as Arc<dyn PollStore>,
            mirror.clone(),
            ChangeChannel::default(),
            Duration::from_millis(20),
        );
        r.refresh();
        settle(&mut r).await;

        mirror.fail_writes.store(true, Ordering::SeqCst);
        r.remove("1").await.unwrap();
        assert!(r.polls().iter().all(|p| p.id != "1"));
        assert!(slot.context().read().await.iter().any(|p| p.id == "1"));

        run_for(&mut r, Duration::from_millis(150)).await;
        assert!(r.polls().iter().all(|p| p.id != "1"));

        // Once writes work again the tick finishes the removal.
        mirror.fail_writes.store(false, Ordering::SeqCst);
        run_for(&mut r, Duration::from_millis(150)).await;
        assert!(r.polls().iter().all(|p| p.id != "1"));
        assert!(slot.context().read().await.iter().all(|p| p.id != "1"));
        assert_eq!(r.polls().len(), 3);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_tick() {
        let store = Arc::new(MemoryPollStore::demo());
        let slot = SharedSlot::new();
        let mut r = reconciler(&store, slot.context(), Duration::from_millis(10));
        assert!(r.is_ticking());

        r.shutdown();
        tokio::time::timeout(Duration::from_secs(2), async {
            while r.is_ticking() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }
}
