use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Recurring reconciliation tick owned by a reconciler.
///
/// Ticks are coalesced: if the owner has not consumed the previous tick,
/// the next one is dropped. The task is aborted on `cancel` and on drop.
pub struct ReconcileTick {
    handle: JoinHandle<()>,
}

impl ReconcileTick {
    /// Spawn the tick task. Must be called from within a tokio runtime.
    pub fn spawn(period: Duration) -> (Self, mpsc::Receiver<Instant>) {
        let (tx, rx) = mpsc::channel(1);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                let at = interval.tick().await;
                match tx.try_send(at) {
                    Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => {}
                    Err(mpsc::error::TrySendError::Closed(_)) => break,
                }
            }
        });
        (Self { handle }, rx)
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ReconcileTick {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
